// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `ksapp prototype` commands.

use clap::{Args, Subcommand};
use colored::Colorize;
use miette::{Result, miette};

use ksapp::{ConfigStore, Package, Prototype};

use crate::cmd_pkg::known_packages;

/// Inspect prototypes of installed packages
#[derive(Debug, Args)]
pub struct CmdPrototype {
    #[clap(flatten)]
    app: crate::AppFlags,

    #[clap(subcommand)]
    cmd: PrototypeCommand,
}

#[derive(Debug, Subcommand)]
enum PrototypeCommand {
    /// List all prototypes
    List,

    /// Show a prototype's parameters
    Describe {
        /// Full prototype name, or a unique suffix of it
        name: String,
    },
}

fn all_prototypes(store: &ConfigStore) -> Result<Vec<(Package, Prototype)>> {
    let mut all = Vec::new();
    for pkg in known_packages(store)? {
        for proto in pkg.prototypes()? {
            all.push((pkg.clone(), proto));
        }
    }
    Ok(all)
}

impl CmdPrototype {
    pub async fn run(&mut self) -> Result<i32> {
        let store = self.app.open()?;
        let prototypes = all_prototypes(&store)?;

        match &self.cmd {
            PrototypeCommand::List => {
                if prototypes.is_empty() {
                    println!("{}", "(no prototypes)".dimmed());
                }
                for (pkg, proto) in &prototypes {
                    println!(
                        "{} {} {}",
                        proto.name.cyan(),
                        proto.short_description,
                        format!("({pkg})").dimmed()
                    );
                }
            }
            PrototypeCommand::Describe { name } => {
                let suffix = format!(".{name}");
                let found: Vec<_> = prototypes
                    .iter()
                    .filter(|(_, p)| p.name == *name || p.name.ends_with(&suffix))
                    .collect();
                let (pkg, proto) = match found.as_slice() {
                    [one] => *one,
                    [] => return Err(miette!("No prototype named {name:?}")),
                    _ => return Err(miette!("{name:?} matches several prototypes")),
                };
                describe(pkg, proto);
            }
        }

        Ok(0)
    }
}

fn describe(pkg: &Package, proto: &Prototype) {
    println!("{}", proto.name.bold());
    println!("  package:     {pkg}");
    println!("  apiVersion:  {}", proto.api_version);
    println!();
    println!("  {}", proto.description);

    let required: Vec<_> = proto.required_params().collect();
    if !required.is_empty() {
        println!();
        println!("{}", "Required parameters:".bold());
        for param in required {
            println!(
                "  --{} ({}) {}",
                param.name.cyan(),
                param.param_type,
                param.description
            );
        }
    }

    let optional: Vec<_> = proto.optional_params().collect();
    if !optional.is_empty() {
        println!();
        println!("{}", "Optional parameters:".bold());
        for param in optional {
            println!(
                "  --{} ({}) {} [default: {}]",
                param.name.cyan(),
                param.param_type,
                param.description,
                param.default.as_deref().unwrap_or_default().green()
            );
        }
    }
}
