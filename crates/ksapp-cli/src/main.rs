// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! ksapp - Layered Application Configuration CLI

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};

mod cmd_env;
mod cmd_init;
mod cmd_pkg;
mod cmd_prototype;
mod cmd_registry;
mod cmd_show;
mod cmd_upgrade;

use cmd_env::CmdEnv;
use cmd_init::CmdInit;
use cmd_pkg::CmdPkg;
use cmd_prototype::CmdPrototype;
use cmd_registry::CmdRegistry;
use cmd_show::CmdShow;
use cmd_upgrade::CmdUpgrade;


#[derive(Parser)]
#[clap(
    name = "ksapp",
    about = "Layered application configuration manager",
    version,
    long_about = "Manage an application's registries, environments and vendored packages"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

#[derive(Parser, Clone, Debug, Default)]
pub struct AppFlags {
    /// Application directory (default: nearest parent holding app.yaml)
    #[clap(long, short = 'a', env = "KSAPP_ROOT")]
    pub app: Option<PathBuf>,
}

impl AppFlags {
    /// Resolve the application root and load its configuration.
    pub fn open(&self) -> Result<ksapp::ConfigStore> {
        let fs = Arc::new(ksapp::OsFilesystem);
        let root = match &self.app {
            Some(path) => dunce::canonicalize(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Invalid application directory {path:?}"))?,
            None => ksapp::find_app_root(fs.as_ref(), Path::new("."))?,
        };
        tracing::debug!(?root, "using application");
        Ok(ksapp::ConfigStore::open(fs, root)?)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Create a new application
    Init(CmdInit),

    /// Display the application configuration
    Show(CmdShow),

    /// Manage environments
    Env(CmdEnv),

    /// Manage package registries
    Registry(CmdRegistry),

    /// Inspect packages
    Pkg(CmdPkg),

    /// Inspect prototypes of installed packages
    Prototype(CmdPrototype),

    /// Migrate the application to the current schema
    Upgrade(CmdUpgrade),
}

impl Opt {
    async fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        match self.cmd {
            Command::Init(mut cmd) => cmd.run().await,
            Command::Show(mut cmd) => cmd.run().await,
            Command::Env(mut cmd) => cmd.run().await,
            Command::Registry(mut cmd) => cmd.run().await,
            Command::Pkg(mut cmd) => cmd.run().await,
            Command::Prototype(mut cmd) => cmd.run().await,
            Command::Upgrade(mut cmd) => cmd.run().await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run().await?;
    std::process::exit(code);
}
