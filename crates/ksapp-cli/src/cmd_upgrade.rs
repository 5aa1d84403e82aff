// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `ksapp upgrade` command.

use clap::Args;
use colored::Colorize;
use miette::Result;

use ksapp::LibraryPackageManager;

/// Migrate the application to the current schema
#[derive(Debug, Args)]
pub struct CmdUpgrade {
    #[clap(flatten)]
    app: crate::AppFlags,

    /// Show what would change without modifying anything
    #[clap(long)]
    dry_run: bool,
}

impl CmdUpgrade {
    pub async fn run(&mut self) -> Result<i32> {
        let store = self.app.open()?;
        let manager = LibraryPackageManager::new(&store);
        let report = ksapp::upgrade(&store, &manager, self.dry_run)?;

        if report.is_noop() {
            println!(
                "Application is up to date (apiVersion {})",
                report.to.green()
            );
            return Ok(0);
        }

        if report.dry_run {
            println!("{}", "Would apply:".bold());
        } else {
            println!("{}", "Applied:".bold());
        }
        for name in &report.migrations {
            println!("  {}", name.cyan());
        }
        if !report.dry_run {
            println!();
            println!("apiVersion {} -> {}", report.from, report.to.green());
        }
        Ok(0)
    }
}
