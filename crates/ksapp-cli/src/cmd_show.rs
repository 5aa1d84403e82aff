// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `ksapp show` command.

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use ksapp::{ConfigStore, Layer};

/// Display the application configuration
#[derive(Debug, Args)]
pub struct CmdShow {
    #[clap(flatten)]
    app: crate::AppFlags,

    /// Output format: table, yaml
    #[clap(long, default_value = "table")]
    format: String,
}

/// Marker printed next to entries that come from the override file.
pub fn layer_marker(layer: Layer) -> &'static str {
    match layer {
        Layer::Spec => "",
        Layer::Override => " [override]",
    }
}

impl CmdShow {
    pub async fn run(&mut self) -> Result<i32> {
        let store = self.app.open()?;

        if self.format == "yaml" {
            self.show_yaml(&store)?;
        } else {
            self.show_table(&store);
        }

        Ok(0)
    }

    fn show_table(&self, store: &ConfigStore) {
        let spec = store.spec();
        println!("{}", "Application:".bold());
        println!();
        println!("  root:        {}", store.root().display().to_string().cyan());
        if let Some(name) = &spec.name {
            println!("  name:        {}", name.green());
        }
        println!("  apiVersion:  {}", spec.api_version);
        let current = store.current_environment();
        if !current.is_empty() {
            println!("  environment: {}", current.green());
        }

        println!();
        println!("{}", "Registries:".bold());
        println!();
        let registries = store.registries();
        if registries.is_empty() {
            println!("  {}", "(no registries)".dimmed());
        }
        for (reg, layer) in &registries {
            println!(
                "  {} {} {}{}",
                reg.name.cyan(),
                reg.protocol,
                reg.uri.dimmed(),
                layer_marker(*layer).yellow()
            );
        }

        println!();
        println!("{}", "Libraries:".bold());
        println!();
        let libraries = store.libraries();
        if libraries.is_empty() {
            println!("  {}", "(no libraries)".dimmed());
        }
        for (name, lib) in &libraries {
            let version = if lib.version.is_empty() {
                String::new()
            } else {
                format!("@{}", lib.version)
            };
            println!("  {}/{}{}", lib.registry, name.green(), version);
        }

        println!();
        println!("{}", "Environments:".bold());
        println!();
        let environments = store.environments();
        if environments.is_empty() {
            println!("  {}", "(no environments)".dimmed());
        }
        for (env, layer) in &environments {
            let destination = env
                .destination
                .as_ref()
                .map(|d| format!("{} ({})", d.server, d.namespace))
                .unwrap_or_default();
            println!(
                "  {} {}{}",
                env.name.cyan(),
                destination.dimmed(),
                layer_marker(*layer).yellow()
            );
        }
    }

    fn show_yaml(&self, store: &ConfigStore) -> Result<()> {
        println!("# {}", store.config_path().display());
        print!("{}", serde_yaml::to_string(&store.spec()).into_diagnostic()?);

        let overrides: Vec<_> = store
            .environments()
            .into_iter()
            .filter(|(_, layer)| layer.is_override())
            .map(|(env, _)| env.name)
            .chain(
                store
                    .registries()
                    .into_iter()
                    .filter(|(_, layer)| layer.is_override())
                    .map(|(reg, _)| reg.name),
            )
            .collect();
        if !overrides.is_empty() {
            println!("# overridden in {}: {}", Layer::Override, overrides.join(", "));
        }
        Ok(())
    }
}
