// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `ksapp pkg` commands.

use std::collections::BTreeMap;

use clap::{Args, Subcommand};
use colored::Colorize;
use miette::{Result, miette};

use ksapp::{
    ConfigStore, Descriptor, LibraryInstallChecker, LibraryPackageManager, Package,
    PackageManager,
};

/// Inspect packages
#[derive(Debug, Args)]
pub struct CmdPkg {
    #[clap(flatten)]
    app: crate::AppFlags,

    #[clap(subcommand)]
    cmd: PkgCommand,
}

#[derive(Debug, Subcommand)]
enum PkgCommand {
    /// List referenced and vendored packages
    List {
        /// Only list packages referenced by the application
        #[clap(long)]
        installed: bool,

        /// Only list packages available to this environment
        #[clap(long)]
        env: Option<String>,
    },

    /// Show details of a package
    Describe {
        /// Package as `[registry/]name[@version]`
        package: String,
    },
}

/// Packages referenced by the application together with any others found
/// under `vendor/`.
pub fn known_packages(store: &ConfigStore) -> Result<Vec<Package>> {
    let manager = LibraryPackageManager::new(store);
    let mut packages: BTreeMap<Descriptor, Package> = BTreeMap::new();
    for pkg in manager
        .packages()?
        .into_iter()
        .chain(ksapp::vendored_packages(store.fs().clone(), store.root())?)
    {
        packages.entry(pkg.descriptor()).or_insert(pkg);
    }
    Ok(packages.into_values().collect())
}

/// Find the single known package matching a descriptor. Registry and
/// version only narrow the search when given.
pub fn find_package(store: &ConfigStore, id: &str) -> Result<Package> {
    let wanted = ksapp::descriptor::parse(id)?;
    let mut matches: Vec<Package> = known_packages(store)?
        .into_iter()
        .filter(|pkg| {
            pkg.name() == wanted.name
                && (!wanted.has_registry() || pkg.registry() == wanted.registry)
                && (!wanted.has_version() || pkg.version() == wanted.version)
        })
        .collect();
    match matches.len() {
        0 => Err(miette!("No package matches {id:?}")),
        1 => Ok(matches.remove(0)),
        _ => Err(miette!(
            help = "Add a registry or version to the package name",
            "{id:?} matches several packages: {}",
            matches
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }
}

impl CmdPkg {
    pub async fn run(&mut self) -> Result<i32> {
        let store = self.app.open()?;

        match &self.cmd {
            PkgCommand::List { installed, env } => self.list(&store, *installed, env.as_deref()),
            PkgCommand::Describe { package } => self.describe(&store, package),
        }
    }

    fn list(&self, store: &ConfigStore, installed_only: bool, env: Option<&str>) -> Result<i32> {
        let packages = match env {
            Some(env) => LibraryPackageManager::new(store).packages_for_environment(env)?,
            None => known_packages(store)?,
        };
        let checker = LibraryInstallChecker::new(store);

        let mut shown = 0;
        for pkg in &packages {
            let installed = pkg.is_installed(&checker)?;
            if installed_only && !installed {
                continue;
            }
            let marker = if installed { "*" } else { " " };
            println!("{} {}", marker.green(), pkg.to_string().cyan());
            shown += 1;
        }
        if shown == 0 {
            println!("{}", "(no packages)".dimmed());
        }
        Ok(0)
    }

    fn describe(&self, store: &ConfigStore, id: &str) -> Result<i32> {
        let pkg = find_package(store, id)?;
        let checker = LibraryInstallChecker::new(store);

        println!("{}", pkg.to_string().bold());
        println!();
        println!("  registry:  {}", pkg.registry());
        println!("  version:   {}", pkg.version());
        println!("  path:      {}", pkg.path().display());
        println!("  installed: {}", pkg.is_installed(&checker)?);

        match pkg.parts() {
            Ok(parts) => {
                if let Some(description) = parts.description {
                    println!();
                    println!("  {description}");
                }
            }
            Err(err) => tracing::debug!(%err, "package metadata unavailable"),
        }

        let prototypes = pkg.prototypes()?;
        if !prototypes.is_empty() {
            println!();
            println!("{}", "Prototypes:".bold());
            for proto in prototypes {
                println!("  {} {}", proto.name.cyan(), proto.short_description.dimmed());
            }
        }
        Ok(0)
    }
}
