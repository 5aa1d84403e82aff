// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Deterministic vendor locations for packages.
//!
//! Packages live at `<app root>/vendor/<registry>/<name>@<version>`. The
//! vendor cache migration in [`crate::upgrade`] depends on this layout, so a
//! change here needs a new migration step.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::VENDOR_DIR;
use crate::descriptor::Descriptor;

#[cfg(test)]
#[path = "./vendor_test.rs"]
mod vendor_test;

static REMOVE_VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*)@.*$").expect("version suffix pattern is valid"));

/// The vendor directory of an application.
pub fn vendor_dir(app_root: &Path) -> PathBuf {
    app_root.join(VENDOR_DIR)
}

/// Resolve the versioned vendor path of a package.
///
/// Returns `None` when any of the inputs is empty.
pub fn vendor_path(app_root: &Path, registry: &str, name: &str, version: &str) -> Option<PathBuf> {
    if app_root.as_os_str().is_empty() || registry.is_empty() || name.is_empty() || version.is_empty()
    {
        return None;
    }
    Some(
        vendor_dir(app_root)
            .join(registry)
            .join(format!("{name}@{version}")),
    )
}

/// [`vendor_path`] for a parsed descriptor.
pub fn descriptor_path(app_root: &Path, descriptor: &Descriptor) -> Option<PathBuf> {
    vendor_path(
        app_root,
        &descriptor.registry,
        &descriptor.name,
        &descriptor.version,
    )
}

/// The pre-0.2.0 layout without a version suffix, `<root>/vendor/<registry>/<name>`.
pub fn unversioned_path(app_root: &Path, registry: &str, name: &str) -> Option<PathBuf> {
    if app_root.as_os_str().is_empty() || registry.is_empty() || name.is_empty() {
        return None;
    }
    Some(vendor_dir(app_root).join(registry).join(name))
}

/// Strip a trailing `@<version>` from a versioned vendor path.
///
/// Paths without an `@` are returned unchanged.
pub fn strip_version(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    PathBuf::from(REMOVE_VERSION_RE.replace(&text, "$1").into_owned())
}
