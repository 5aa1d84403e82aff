// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Schema migrations for application directories.
//!
//! Migrations form an ordered list. Each one is tried once against the
//! running version; when it matches, its transform runs and the version it
//! returns is what later migrations are matched against.

use std::fmt;
use std::path::Path;

use semver::{Version, VersionReq};
use tracing::{debug, info, trace};

use crate::fs::Filesystem;
use crate::package::PackageManager;
use crate::store::ConfigStore;
use crate::{Error, Result, vendor};

#[cfg(test)]
#[path = "./upgrade_test.rs"]
mod upgrade_test;

type Matcher<'a> = Box<dyn Fn(&str) -> bool + 'a>;
type Transform<'a> = Box<dyn Fn() -> Result<String> + 'a>;

/// A single version-gated transformation of persisted application state.
pub struct Migration<'a> {
    name: String,
    matcher: Matcher<'a>,
    migrate: Transform<'a>,
}

impl fmt::Debug for Migration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<'a> Migration<'a> {
    /// `migrate` returns the version the application is at afterwards.
    pub fn new(
        name: impl Into<String>,
        matcher: impl Fn(&str) -> bool + 'a,
        migrate: impl Fn() -> Result<String> + 'a,
    ) -> Self {
        Self {
            name: name.into(),
            matcher: Box::new(matcher),
            migrate: Box::new(migrate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, version: &str) -> bool {
        (self.matcher)(version)
    }

    pub fn migrate(&self) -> Result<String> {
        (self.migrate)()
    }
}

/// Build a matcher accepting versions inside a semver range such as
/// `=0.1.0` or `>=0.1.0, <0.2.0`. Unparseable versions never match.
pub fn semver_matcher(range: &str) -> Result<impl Fn(&str) -> bool + use<>> {
    let req = VersionReq::parse(range).map_err(|err| {
        Error::ValidationFailed(format!("invalid version range {range:?}: {err}"))
    })?;
    Ok(move |version: &str| {
        Version::parse(version)
            .map(|v| req.matches(&v))
            .unwrap_or(false)
    })
}

/// Apply `migrations` in order starting from `version` and return the
/// final version.
///
/// The first failure aborts the run. Steps that already ran are not rolled
/// back.
pub fn run_migrations(migrations: &[Migration<'_>], version: &str) -> Result<String> {
    run(migrations, version, &mut Vec::new())
}

fn run(migrations: &[Migration<'_>], version: &str, applied: &mut Vec<String>) -> Result<String> {
    let mut current = version.to_string();
    for migration in migrations {
        if !migration.matches(&current) {
            trace!(migration = %migration.name, version = %current, "migration does not apply");
            continue;
        }
        debug!(migration = %migration.name, from = %current, "applying migration");
        current = migration.migrate().map_err(|err| Error::MigrationFailed {
            name: migration.name.clone(),
            source: Box::new(err),
        })?;
        info!(migration = %migration.name, version = %current, "migration complete");
        applied.push(migration.name.clone());
    }
    Ok(current)
}

/// Move vendored packages from `vendor/<registry>/<name>` to
/// `vendor/<registry>/<name>@<version>`.
///
/// Packages without a version, already at their versioned path, or with
/// nothing at the legacy path are skipped, so running this twice is safe.
pub fn migrate_vendor_cache(
    fs: &dyn Filesystem,
    app_root: &Path,
    manager: &dyn PackageManager,
) -> Result<()> {
    for pkg in manager.packages()? {
        let Some(versioned) =
            vendor::vendor_path(app_root, pkg.registry(), pkg.name(), pkg.version())
        else {
            trace!(package = %pkg, "no version, skipping");
            continue;
        };
        if fs.exists(&versioned).map_err(|e| Error::read(&versioned, e))? {
            trace!(package = %pkg, "already at versioned path");
            continue;
        }

        let legacy = vendor::strip_version(&versioned);
        if !fs.exists(&legacy).map_err(|e| Error::read(&legacy, e))? {
            trace!(package = %pkg, "nothing vendored");
            continue;
        }

        debug!(from = ?legacy, to = ?versioned, "moving vendored package");
        fs.rename(&legacy, &versioned)
            .map_err(|e| Error::write("rename", &legacy, e))?;
    }
    Ok(())
}

/// The migrations this version of ksapp knows about, oldest first.
pub fn default_migrations<'a>(
    fs: &'a dyn Filesystem,
    app_root: &'a Path,
    manager: &'a dyn PackageManager,
) -> Result<Vec<Migration<'a>>> {
    Ok(vec![Migration::new(
        "versioned vendor cache (0.1.0 to 0.2.0)",
        semver_matcher("=0.1.0")?,
        move || {
            migrate_vendor_cache(fs, app_root, manager)?;
            Ok("0.2.0".to_string())
        },
    )])
}

/// Outcome of [`upgrade`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    pub from: String,
    pub to: String,
    /// Migrations that ran, or for a dry run, that would run first.
    pub migrations: Vec<String>,
    pub dry_run: bool,
}

impl UpgradeReport {
    pub fn is_noop(&self) -> bool {
        self.migrations.is_empty()
    }
}

/// Bring an application up to the current schema and persist the result.
///
/// A dry run changes nothing and lists the migrations matching the
/// application's current version.
pub fn upgrade(
    store: &ConfigStore,
    manager: &dyn PackageManager,
    dry_run: bool,
) -> Result<UpgradeReport> {
    store.load()?;
    let from = store.api_version();
    let migrations = default_migrations(store.fs().as_ref(), store.root(), manager)?;

    if dry_run {
        let pending = migrations
            .iter()
            .filter(|m| m.matches(&from))
            .map(|m| m.name().to_string())
            .collect();
        return Ok(UpgradeReport {
            to: from.clone(),
            from,
            migrations: pending,
            dry_run,
        });
    }

    let mut applied = Vec::new();
    let current = run(&migrations, &from, &mut applied)?;

    if current != from {
        store.set_api_version(&current)?;
    }
    Ok(UpgradeReport {
        from,
        to: current,
        migrations: applied,
        dry_run,
    })
}
