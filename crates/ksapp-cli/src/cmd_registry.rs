// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `ksapp registry` commands.

use clap::{Args, Subcommand};
use colored::Colorize;
use miette::Result;

use ksapp::{EntryKind, RegistryConfig};

use crate::cmd_show::layer_marker;

/// Manage package registries
#[derive(Debug, Args)]
pub struct CmdRegistry {
    #[clap(flatten)]
    app: crate::AppFlags,

    #[clap(subcommand)]
    cmd: RegistryCommand,
}

#[derive(Debug, Subcommand)]
enum RegistryCommand {
    /// List registries
    List,

    /// Add a registry
    Add {
        /// Registry name
        name: String,

        /// Registry location
        uri: String,

        /// Registry protocol
        #[clap(long, default_value = "github")]
        protocol: String,

        /// Store the registry in app.override.yaml
        #[clap(long = "override", short = 'o')]
        is_override: bool,
    },

    /// Change an existing registry
    Set {
        /// Registry name
        name: String,

        /// New registry location
        #[clap(long)]
        uri: Option<String>,

        /// New registry protocol
        #[clap(long)]
        protocol: Option<String>,
    },
}

impl CmdRegistry {
    pub async fn run(&mut self) -> Result<i32> {
        let store = self.app.open()?;

        match &self.cmd {
            RegistryCommand::List => {
                let registries = store.registries();
                if registries.is_empty() {
                    println!("{}", "(no registries)".dimmed());
                }
                for (reg, layer) in registries {
                    println!(
                        "{} {} {}{}",
                        reg.name.cyan(),
                        reg.protocol,
                        reg.uri,
                        layer_marker(layer).yellow()
                    );
                }
            }
            RegistryCommand::Add {
                name,
                uri,
                protocol,
                is_override,
            } => {
                let reg = RegistryConfig::new(name.as_str(), protocol.as_str(), uri.as_str());
                store.add_registry(reg, *is_override)?;
                println!("Added registry {}", name.green());
            }
            RegistryCommand::Set {
                name,
                uri,
                protocol,
            } => {
                let (mut reg, _) = store.registry(name)?.ok_or_else(|| ksapp::Error::NotFound {
                    kind: EntryKind::Registry,
                    name: name.clone(),
                })?;
                if let Some(uri) = uri {
                    reg.uri.clone_from(uri);
                }
                if let Some(protocol) = protocol {
                    reg.protocol.clone_from(protocol);
                }
                store.update_registry(reg)?;
                println!("Updated registry {}", name.green());
            }
        }

        Ok(0)
    }
}
