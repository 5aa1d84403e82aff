// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Resolved packages and the collaborators that enumerate them.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::descriptor::Descriptor;
use crate::error::EntryKind;
use crate::fs::Filesystem;
use crate::prototype::{self, Prototype};
use crate::spec::{LibraryConfig, LibraryConfigs};
use crate::store::ConfigStore;
use crate::{Error, PARTS_FILENAME, PROTOTYPES_DIR, Result, vendor};

#[cfg(test)]
#[path = "./package_test.rs"]
mod package_test;

/// Package metadata from a vendored `parts.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartsSpec {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub license: Option<String>,
}

/// A package installed into an application's vendor directory.
#[derive(Clone)]
pub struct Package {
    registry: String,
    name: String,
    version: String,
    app_root: PathBuf,
    fs: Arc<dyn Filesystem>,
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("registry", &self.registry)
            .field("name", &self.name)
            .field("version", &self.version)
            .field("app_root", &self.app_root)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}

impl Package {
    /// Registry and name are required; an empty version refers to the
    /// unversioned vendor layout.
    pub fn new(
        fs: Arc<dyn Filesystem>,
        app_root: impl Into<PathBuf>,
        registry: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let pkg = Self {
            registry: registry.into(),
            name: name.into(),
            version: version.into(),
            app_root: app_root.into(),
            fs,
        };
        if pkg.registry.is_empty() || pkg.name.is_empty() {
            return Err(Error::InvalidDescriptor(pkg.descriptor().to_string()));
        }
        Ok(pkg)
    }

    /// The package a library reference points at.
    pub fn from_library(
        fs: Arc<dyn Filesystem>,
        app_root: impl Into<PathBuf>,
        library: &LibraryConfig,
    ) -> Result<Self> {
        Self::new(
            fs,
            app_root,
            library.registry.as_str(),
            library.name.as_str(),
            library.version.as_str(),
        )
    }

    pub fn registry(&self) -> &str {
        &self.registry
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    pub fn descriptor(&self) -> Descriptor {
        Descriptor::new(
            self.registry.as_str(),
            self.name.as_str(),
            self.version.as_str(),
        )
    }

    /// Location of the package below `vendor/`.
    pub fn path(&self) -> PathBuf {
        vendor::vendor_path(&self.app_root, &self.registry, &self.name, &self.version)
            .or_else(|| vendor::unversioned_path(&self.app_root, &self.registry, &self.name))
            // registry and name are checked in `new`
            .unwrap_or_else(|| vendor::vendor_dir(&self.app_root))
    }

    /// Read the package's `parts.yaml`.
    pub fn parts(&self) -> Result<PartsSpec> {
        let path = self.path().join(PARTS_FILENAME);
        let yaml = self
            .fs
            .read_to_string(&path)
            .map_err(|e| Error::read(&path, e))?;
        serde_yaml::from_str(&yaml).map_err(|error| Error::InvalidYaml { path, error })
    }

    pub fn description(&self) -> Result<String> {
        Ok(self.parts()?.description.unwrap_or_default())
    }

    /// Parse every `prototypes/*.jsonnet` file of the package.
    ///
    /// A package without a prototypes directory has none. The first
    /// malformed prototype fails the whole call.
    pub fn prototypes(&self) -> Result<Vec<Prototype>> {
        let dir = self.path().join(PROTOTYPES_DIR);
        if !self.fs.is_dir(&dir).map_err(|e| Error::read(&dir, e))? {
            debug!(package = %self, "package has no prototypes");
            return Ok(Vec::new());
        }

        let files = self.fs.walk(&dir).map_err(|e| Error::read(&dir, e))?;
        let mut prototypes = Vec::new();
        for path in files
            .iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == "jsonnet"))
        {
            let source = self
                .fs
                .read_to_string(path)
                .map_err(|e| Error::read(path, e))?;
            prototypes.push(prototype::parse(path, &source)?);
        }
        debug!(package = %self, count = prototypes.len(), "discovered prototypes");
        Ok(prototypes)
    }

    pub fn is_installed(&self, checker: &dyn InstallChecker) -> Result<bool> {
        checker.is_installed(self)
    }
}

/// Packages present under `vendor/`, identified by their `parts.yaml`.
///
/// Both `vendor/<registry>/<name>@<version>` and the unversioned legacy
/// layout are recognised.
pub fn vendored_packages(fs: Arc<dyn Filesystem>, app_root: &Path) -> Result<Vec<Package>> {
    let dir = vendor::vendor_dir(app_root);
    if !fs.is_dir(&dir).map_err(|e| Error::read(&dir, e))? {
        return Ok(Vec::new());
    }

    let mut found = BTreeMap::new();
    for path in fs.walk(&dir).map_err(|e| Error::read(&dir, e))? {
        let Ok(rel) = path.strip_prefix(&dir) else {
            continue;
        };
        let parts: Vec<_> = rel.iter().map(|c| c.to_string_lossy()).collect();
        let [registry, package_dir, file] = parts.as_slice() else {
            continue;
        };
        if file != PARTS_FILENAME {
            continue;
        }
        let package_dir: &str = package_dir;
        let (name, version) = package_dir.split_once('@').unwrap_or((package_dir, ""));
        let pkg = Package::new(fs.clone(), app_root, registry.to_string(), name, version)?;
        found.entry(pkg.descriptor()).or_insert(pkg);
    }
    Ok(found.into_values().collect())
}

/// Decides whether a package is installed in an application.
pub trait InstallChecker {
    fn is_installed(&self, package: &Package) -> Result<bool>;
}

/// Treats a package as installed when a library reference in the
/// application's spec (top-level or in any environment) names it.
#[derive(Debug)]
pub struct LibraryInstallChecker<'a> {
    store: &'a ConfigStore,
}

impl<'a> LibraryInstallChecker<'a> {
    pub fn new(store: &'a ConfigStore) -> Self {
        Self { store }
    }
}

fn references(library: &LibraryConfig, package: &Package) -> bool {
    library.name == package.name
        && library.registry == package.registry
        && (package.version.is_empty() || library.version == package.version)
}

impl InstallChecker for LibraryInstallChecker<'_> {
    fn is_installed(&self, package: &Package) -> Result<bool> {
        if self
            .store
            .libraries()
            .values()
            .any(|lib| references(lib, package))
        {
            return Ok(true);
        }
        Ok(self
            .store
            .environments()
            .iter()
            .flat_map(|(env, _)| env.libraries.values())
            .any(|lib| references(lib, package)))
    }
}

/// Enumerates the packages of an application.
pub trait PackageManager {
    /// Every package referenced anywhere in the application.
    fn packages(&self) -> Result<Vec<Package>>;

    /// Packages available to one environment: the application's libraries
    /// plus the environment's own.
    fn packages_for_environment(&self, env: &str) -> Result<Vec<Package>>;
}

/// A [`PackageManager`] backed by the library references in a
/// [`ConfigStore`]. Nothing is fetched.
#[derive(Debug)]
pub struct LibraryPackageManager<'a> {
    store: &'a ConfigStore,
}

impl<'a> LibraryPackageManager<'a> {
    pub fn new(store: &'a ConfigStore) -> Self {
        Self { store }
    }

    fn to_packages<'l>(
        &self,
        libraries: impl IntoIterator<Item = &'l LibraryConfig>,
    ) -> Result<Vec<Package>> {
        let mut unique = BTreeMap::new();
        for lib in libraries {
            let pkg = Package::from_library(self.store.fs().clone(), self.store.root(), lib)?;
            unique.entry(pkg.descriptor()).or_insert(pkg);
        }
        Ok(unique.into_values().collect())
    }
}

impl PackageManager for LibraryPackageManager<'_> {
    fn packages(&self) -> Result<Vec<Package>> {
        let libraries = self.store.libraries();
        let environments = self.store.environments();
        self.to_packages(
            libraries
                .values()
                .chain(environments.iter().flat_map(|(env, _)| env.libraries.values())),
        )
    }

    fn packages_for_environment(&self, env: &str) -> Result<Vec<Package>> {
        let (config, _) = self
            .store
            .environment(env)?
            .ok_or_else(|| Error::NotFound {
                kind: EntryKind::Environment,
                name: env.to_string(),
            })?;

        // Environment libraries shadow application libraries of the same name.
        let mut libraries: LibraryConfigs = self.store.libraries();
        libraries.extend(config.libraries);
        self.to_packages(libraries.values())
    }
}
