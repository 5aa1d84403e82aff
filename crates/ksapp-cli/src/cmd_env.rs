// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `ksapp env` commands.

use clap::{Args, Subcommand};
use colored::Colorize;
use miette::Result;

use ksapp::EnvironmentConfig;

use crate::cmd_show::layer_marker;

/// Manage environments
#[derive(Debug, Args)]
pub struct CmdEnv {
    #[clap(flatten)]
    app: crate::AppFlags,

    #[clap(subcommand)]
    cmd: EnvCommand,
}

#[derive(Debug, Subcommand)]
enum EnvCommand {
    /// List environments
    List,

    /// Print the current environment
    Current,

    /// Make an environment current
    Set {
        /// Environment name
        name: String,
    },

    /// Add an environment
    Add {
        /// Environment name
        name: String,

        /// Cluster server URL
        server: String,

        /// Namespace to deploy into
        #[clap(long, default_value = "default")]
        namespace: String,

        /// Kubernetes version of the cluster
        #[clap(long)]
        k8s_version: Option<String>,

        /// Store the environment in app.override.yaml
        #[clap(long = "override", short = 'o')]
        is_override: bool,
    },

    /// Remove an environment
    Rm {
        /// Environment name
        name: String,
    },
}

impl CmdEnv {
    pub async fn run(&mut self) -> Result<i32> {
        let store = self.app.open()?;

        match &self.cmd {
            EnvCommand::List => {
                let current = store.current_environment();
                let environments = store.environments();
                if environments.is_empty() {
                    println!("{}", "(no environments)".dimmed());
                }
                for (env, layer) in environments {
                    let marker = if env.name == current { "*" } else { " " };
                    let destination = env
                        .destination
                        .map(|d| format!("{} {}", d.server, d.namespace))
                        .unwrap_or_default();
                    println!(
                        "{} {} {}{}",
                        marker.green(),
                        env.name.cyan(),
                        destination,
                        layer_marker(layer).yellow()
                    );
                }
            }
            EnvCommand::Current => {
                let current = store.current_environment();
                if current.is_empty() {
                    tracing::warn!("no current environment set");
                    return Ok(1);
                }
                println!("{current}");
            }
            EnvCommand::Set { name } => {
                if store.environment(name)?.is_none() {
                    return Err(ksapp::Error::NotFound {
                        kind: ksapp::EntryKind::Environment,
                        name: name.clone(),
                    }
                    .into());
                }
                store.set_current_environment(name)?;
                println!("Current environment is now {}", name.green());
            }
            EnvCommand::Add {
                name,
                server,
                namespace,
                k8s_version,
                is_override,
            } => {
                let mut env = EnvironmentConfig::new(name.as_str(), server, namespace);
                if let Some(version) = k8s_version {
                    env.kube_version.clone_from(version);
                }
                store.add_environment(env, *is_override)?;
                println!("Added environment {}", name.green());
            }
            EnvCommand::Rm { name } => {
                store.remove_environment(name)?;
                if store.current_environment() == *name {
                    tracing::warn!(%name, "removed the current environment");
                }
                println!("Removed environment {}", name.green());
            }
        }

        Ok(0)
    }
}
