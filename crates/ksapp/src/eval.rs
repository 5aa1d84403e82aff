// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Inputs handed to the template engine when evaluating an environment.
//!
//! An [`EvalContext`] is built by whoever requests an evaluation and passed
//! along explicitly; nothing here is process-wide.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fs::Filesystem;
use crate::package::PackageManager;
use crate::spec::EnvironmentConfig;
use crate::{Error, Result, VENDOR_DIR};

#[cfg(test)]
#[path = "./eval_test.rs"]
mod eval_test;

/// Library search path and external variables for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalContext {
    jpaths: Vec<PathBuf>,
    ext_vars: BTreeMap<String, String>,
    ext_codes: BTreeMap<String, String>,
    tla_vars: BTreeMap<String, String>,
    tla_codes: BTreeMap<String, String>,
}

fn check_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(Error::ValidationFailed(
            "variable names must not be blank".to_string(),
        ));
    }
    Ok(())
}

fn read_var_file(fs: &dyn Filesystem, path: &Path) -> Result<String> {
    fs.read_to_string(path).map_err(|e| Error::read(path, e))
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search path for an environment: the application's `lib` and
    /// `vendor` directories, then the environment's own directory.
    pub fn for_environment(app_root: &Path, env: &EnvironmentConfig) -> Self {
        let env_dir = if env.path.is_empty() { &env.name } else { &env.path };
        let mut ctx = Self::new();
        ctx.add_jpaths([
            app_root.join("lib"),
            app_root.join(VENDOR_DIR),
            app_root.join("environments").join(env_dir),
        ]);
        ctx
    }

    /// Append directories to the library search path. Later paths are
    /// searched last.
    pub fn add_jpaths<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.jpaths.extend(paths.into_iter().map(Into::into));
    }

    pub fn add_ext_var(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        check_key(key)?;
        self.ext_vars.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Set an external variable to the contents of a file.
    pub fn add_ext_var_file(&mut self, fs: &dyn Filesystem, key: &str, path: &Path) -> Result<()> {
        check_key(key)?;
        let value = read_var_file(fs, path)?;
        self.ext_vars.insert(key.to_string(), value);
        Ok(())
    }

    /// Set an external variable to a jsonnet expression.
    pub fn add_ext_code(&mut self, key: &str, code: impl Into<String>) -> Result<()> {
        check_key(key)?;
        self.ext_codes.insert(key.to_string(), code.into());
        Ok(())
    }

    pub fn add_tla_var(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        check_key(key)?;
        self.tla_vars.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Set a top-level argument to the contents of a file.
    pub fn add_tla_var_file(&mut self, fs: &dyn Filesystem, key: &str, path: &Path) -> Result<()> {
        check_key(key)?;
        let value = read_var_file(fs, path)?;
        self.tla_vars.insert(key.to_string(), value);
        Ok(())
    }

    pub fn add_tla_code(&mut self, key: &str, code: impl Into<String>) -> Result<()> {
        check_key(key)?;
        self.tla_codes.insert(key.to_string(), code.into());
        Ok(())
    }

    pub fn jpaths(&self) -> &[PathBuf] {
        &self.jpaths
    }

    pub fn ext_vars(&self) -> &BTreeMap<String, String> {
        &self.ext_vars
    }

    pub fn ext_codes(&self) -> &BTreeMap<String, String> {
        &self.ext_codes
    }

    pub fn tla_vars(&self) -> &BTreeMap<String, String> {
        &self.tla_vars
    }

    pub fn tla_codes(&self) -> &BTreeMap<String, String> {
        &self.tla_codes
    }
}

/// Vendor directory of every package available to `env`, keyed by package
/// name.
pub fn package_paths(manager: &dyn PackageManager, env: &str) -> Result<BTreeMap<String, PathBuf>> {
    let paths: BTreeMap<String, PathBuf> = manager
        .packages_for_environment(env)?
        .into_iter()
        .map(|pkg| (pkg.name().to_string(), pkg.path()))
        .collect();
    debug!(%env, count = paths.len(), "resolved package paths");
    Ok(paths)
}
