// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Locating the application directory for a working directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fs::Filesystem;
use crate::{APP_FILENAME, Error, Result};

#[cfg(test)]
#[path = "./discovery_test.rs"]
mod discovery_test;

/// Resolve a starting path, preferring $PWD to preserve symlinks.
pub fn resolve_start_path(start_path: &Path) -> PathBuf {
    if start_path.is_absolute() {
        start_path.to_owned()
    } else {
        match std::env::var("PWD").ok() {
            Some(pwd) => PathBuf::from(pwd).join(start_path),
            None => std::env::current_dir()
                .unwrap_or_default()
                .join(start_path),
        }
    }
}

/// Walk up from `start_path` to the nearest directory holding `app.yaml`.
pub fn find_app_root(fs: &dyn Filesystem, start_path: &Path) -> Result<PathBuf> {
    let start = resolve_start_path(start_path);
    let mut current = start.as_path();
    loop {
        let candidate = current.join(APP_FILENAME);
        if fs.exists(&candidate).map_err(|e| Error::read(&candidate, e))? {
            debug!(root = ?current, "found application root");
            return Ok(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return Err(Error::NoAppRoot(start)),
        }
    }
}
