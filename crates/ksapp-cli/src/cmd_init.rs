// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `ksapp init` command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use miette::{IntoDiagnostic, Result, WrapErr};

use ksapp::{AppSpec, ConfigStore, EnvironmentConfig, Filesystem, OsFilesystem, RegistryConfig};

/// Default registry added to new applications.
const INCUBATOR_URI: &str = "github.com/ksonnet/parts/tree/master/incubator";

/// Create a new application
#[derive(Debug, Args)]
pub struct CmdInit {
    /// Directory to create the application in
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Application name (default: directory name)
    #[clap(long)]
    name: Option<String>,

    /// Server of the initial `default` environment
    #[clap(long)]
    server: Option<String>,

    /// Namespace of the initial `default` environment
    #[clap(long, default_value = "default")]
    namespace: String,

    /// Do not add the incubator registry
    #[clap(long)]
    skip_default_registries: bool,
}

impl CmdInit {
    pub async fn run(&mut self) -> Result<i32> {
        let fs = OsFilesystem;
        fs.create_dir_all(&self.path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to create {:?}", self.path))?;
        let root = dunce::canonicalize(&self.path).into_diagnostic()?;

        let name = self.name.clone().or_else(|| {
            root.file_name()
                .map(|n| n.to_string_lossy().into_owned())
        });
        let mut spec = AppSpec {
            name,
            ..AppSpec::default()
        };
        if !self.skip_default_registries {
            spec.registries.insert(
                "incubator".to_string(),
                RegistryConfig::new("incubator", "github", INCUBATOR_URI),
            );
        }
        if let Some(server) = &self.server {
            spec.environments.insert(
                "default".to_string(),
                EnvironmentConfig::new("default", server, &self.namespace),
            );
        }

        let store = ConfigStore::create(Arc::new(fs), &root, spec)?;
        for dir in ["components", "environments", "lib", ksapp::VENDOR_DIR] {
            let path = root.join(dir);
            fs.create_dir_all(&path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to create {path:?}"))?;
        }
        if self.server.is_some() {
            store.set_current_environment("default")?;
        }

        println!("Created application at {:?}", store.root());
        println!();
        println!("Next steps:");
        println!("  1. Add an environment with 'ksapp env add <name> <server>'");
        println!("  2. Run 'ksapp show' to review the configuration");

        Ok(0)
    }
}
