// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! The two-layer configuration store for an application directory.
//!
//! [`ConfigStore`] owns the in-memory copy of `app.yaml` and
//! `app.override.yaml`. Every mutation reloads from disk, applies the change
//! and saves both files again. The internal lock serialises `load` and `save`
//! within a process but is not held across a whole mutation, and nothing
//! guards against other processes editing the same files.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::error::EntryKind;
use crate::fs::Filesystem;
use crate::layered::{Layer, Layered};
use crate::spec::{
    AppSpec, EnvironmentConfig, LibraryConfig, LibraryConfigs, OVERRIDE_KIND, Override,
    RegistryConfig,
};
use crate::{APP_FILENAME, CURRENT_ENV_PATH, Error, OVERRIDE_FILENAME, Result, VENDOR_DIR};

#[cfg(test)]
#[path = "./store_test.rs"]
mod store_test;

#[derive(Debug, Clone)]
struct AppState {
    /// Everything from `app.yaml` except registries and environments.
    spec: AppSpec,
    registries: Layered<RegistryConfig>,
    environments: Layered<EnvironmentConfig>,
}

impl AppState {
    fn empty() -> Self {
        Self {
            spec: AppSpec::default(),
            registries: Layered::new(EntryKind::Registry),
            environments: Layered::new(EntryKind::Environment),
        }
    }

    fn from_files(mut spec: AppSpec, ov: Override) -> Self {
        let registries = Layered::from_layers(
            EntryKind::Registry,
            std::mem::take(&mut spec.registries),
            ov.registries,
        );
        let environments = Layered::from_layers(
            EntryKind::Environment,
            std::mem::take(&mut spec.environments),
            ov.environments,
        );
        Self {
            spec,
            registries,
            environments,
        }
    }

    fn to_files(&self) -> (AppSpec, Override) {
        let mut spec = self.spec.clone();
        spec.registries = self.registries.layer(Layer::Spec).clone();
        spec.environments = self.environments.layer(Layer::Spec).clone();
        let ov = Override {
            kind: Some(OVERRIDE_KIND.to_string()),
            registries: self.registries.layer(Layer::Override).clone(),
            environments: self.environments.layer(Layer::Override).clone(),
        };
        (spec, ov)
    }

    /// Apply the same rules `load` enforces to both files this state would
    /// write.
    fn validate(&self) -> Result<()> {
        let (spec, ov) = self.to_files();
        spec.validate()?;
        ov.validate()
    }
}

/// Reads, validates, mutates and persists an application's configuration.
pub struct ConfigStore {
    root: PathBuf,
    fs: Arc<dyn Filesystem>,
    state: Mutex<AppState>,
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    /// Create a store for the application at `root` without touching disk.
    pub fn new(fs: Arc<dyn Filesystem>, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fs,
            state: Mutex::new(AppState::empty()),
        }
    }

    /// Create a store and load the application's configuration.
    pub fn open(fs: Arc<dyn Filesystem>, root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(fs, root);
        store.load()?;
        Ok(store)
    }

    /// Write a fresh `app.yaml` for a new application and open it.
    pub fn create(fs: Arc<dyn Filesystem>, root: impl Into<PathBuf>, spec: AppSpec) -> Result<Self> {
        let store = Self::new(fs, root);
        let config_path = store.config_path();
        if store
            .fs
            .exists(&config_path)
            .map_err(|e| Error::read(&config_path, e))?
        {
            return Err(Error::ValidationFailed(format!(
                "{} already exists",
                config_path.display()
            )));
        }
        spec.validate()?;
        *store.lock() = AppState::from_files(spec, Override::default());
        store.save()?;
        store.load()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fs(&self) -> &Arc<dyn Filesystem> {
        &self.fs
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(APP_FILENAME)
    }

    pub fn override_path(&self) -> PathBuf {
        self.root.join(OVERRIDE_FILENAME)
    }

    pub fn vendor_path(&self) -> PathBuf {
        self.root.join(VENDOR_DIR)
    }

    fn current_env_path(&self) -> PathBuf {
        self.root.join(CURRENT_ENV_PATH)
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        // State is replaced wholesale by load, so a poisoned guard is still
        // internally consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read `app.yaml` and, when present, `app.override.yaml`.
    ///
    /// In-memory state is replaced only once both files have parsed. The
    /// loaded spec is validated last.
    pub fn load(&self) -> Result<()> {
        let config_path = self.config_path();
        let override_path = self.override_path();
        debug!(path = ?config_path, "loading application configuration");

        let mut state = self.lock();

        let spec = AppSpec::load(self.fs.as_ref(), &config_path)?;

        let has_override = self
            .fs
            .exists(&override_path)
            .map_err(|e| Error::read(&override_path, e))?;
        let ov = if has_override {
            debug!(path = ?override_path, "loading override configuration");
            let ov = Override::load(self.fs.as_ref(), &override_path)?;
            ov.validate()?;
            ov
        } else {
            Override::default()
        };

        let validation = spec.validate();
        debug!(api_version = %spec.api_version, "loaded application configuration");
        *state = AppState::from_files(spec, ov);
        validation
    }

    /// Write `app.yaml`, then replace `app.override.yaml`.
    ///
    /// Nothing is written unless both files would pass validation.
    /// The override file is always removed and only rewritten when it holds
    /// at least one entry, so it is either present with content or absent.
    /// A failure while rewriting it leaves it removed.
    pub fn save(&self) -> Result<()> {
        let config_path = self.config_path();
        let override_path = self.override_path();

        let state = self.lock();
        let (spec, ov) = state.to_files();
        spec.validate()?;
        ov.validate()?;
        debug!(path = ?config_path, api_version = %spec.api_version, "saving application configuration");

        let yaml = spec.to_yaml()?;
        self.fs
            .write(&config_path, yaml.as_bytes())
            .map_err(|e| Error::write("write", &config_path, e))?;

        self.remove_override(&override_path)?;

        if !ov.is_defined() {
            trace!(path = ?override_path, "no override entries, leaving override file absent");
            return Ok(());
        }
        let yaml = ov.to_yaml()?;
        self.fs
            .write(&override_path, yaml.as_bytes())
            .map_err(|e| Error::write("write", &override_path, e))
    }

    fn remove_override(&self, path: &Path) -> Result<()> {
        let exists = self.fs.exists(path).map_err(|e| Error::read(path, e))?;
        if exists {
            self.fs
                .remove_file(path)
                .map_err(|e| Error::write("remove", path, e))?;
        }
        Ok(())
    }

    /// Schema version of the loaded spec.
    pub fn api_version(&self) -> String {
        self.lock().spec.api_version.clone()
    }

    /// The loaded base spec including its registries and environments.
    /// Override entries are not included.
    pub fn spec(&self) -> AppSpec {
        self.lock().to_files().0
    }

    /// All registries from both layers, ordered by name.
    pub fn registries(&self) -> Vec<(RegistryConfig, Layer)> {
        let state = self.lock();
        state
            .registries
            .iter()
            .map(|(_, reg, layer)| (reg.clone(), layer))
            .collect()
    }

    pub fn registry(&self, name: &str) -> Result<Option<(RegistryConfig, Layer)>> {
        let state = self.lock();
        Ok(state
            .registries
            .get(name)?
            .map(|(reg, layer)| (reg.clone(), layer)))
    }

    /// All environments from both layers, ordered by name.
    pub fn environments(&self) -> Vec<(EnvironmentConfig, Layer)> {
        let state = self.lock();
        state
            .environments
            .iter()
            .map(|(_, env, layer)| (env.clone(), layer))
            .collect()
    }

    pub fn environment(&self, name: &str) -> Result<Option<(EnvironmentConfig, Layer)>> {
        let state = self.lock();
        Ok(state
            .environments
            .get(name)?
            .map(|(env, layer)| (env.clone(), layer)))
    }

    pub fn libraries(&self) -> LibraryConfigs {
        self.lock().spec.libraries.clone()
    }

    /// Reload, apply `change` to a copy of the state and persist it. The
    /// in-memory state and the files on disk are left untouched when the
    /// change fails or the result does not validate.
    fn mutate<R>(&self, change: impl FnOnce(&mut AppState) -> Result<R>) -> Result<R> {
        self.load()?;
        let mut next = self.lock().clone();
        let out = change(&mut next)?;
        next.validate()?;
        *self.lock() = next;
        self.save()?;
        Ok(out)
    }

    /// Add a registry to the spec or override layer.
    pub fn add_registry(&self, mut registry: RegistryConfig, is_override: bool) -> Result<()> {
        if registry.name.trim().is_empty() {
            return Err(Error::InvalidName {
                kind: EntryKind::Registry,
            });
        }
        registry.name = registry.name.trim().to_string();

        let layer = Layer::from_override(is_override);
        debug!(name = %registry.name, %layer, "adding registry");
        self.mutate(|state| {
            let name = registry.name.clone();
            state.registries.insert(&name, registry, layer)
        })
    }

    /// Replace a registry in whichever layer defines it.
    pub fn update_registry(&self, registry: RegistryConfig) -> Result<()> {
        if registry.name.trim().is_empty() {
            return Err(Error::InvalidName {
                kind: EntryKind::Registry,
            });
        }
        let name = registry.name.clone();
        let layer = self.mutate(|state| state.registries.update(&name, registry))?;
        debug!(%name, %layer, "updated registry");
        Ok(())
    }

    /// Insert or replace a library reference. Libraries only live in `app.yaml`.
    pub fn update_library(&self, name: &str, mut library: LibraryConfig) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidName {
                kind: EntryKind::Library,
            });
        }
        if library.name.is_empty() {
            library.name = name.to_string();
        }
        debug!(%name, registry = %library.registry, version = %library.version, "updating library");
        self.mutate(|state| {
            state.spec.libraries.insert(name.to_string(), library);
            Ok(())
        })
    }

    /// Add an environment to the spec or override layer.
    pub fn add_environment(&self, mut env: EnvironmentConfig, is_override: bool) -> Result<()> {
        if env.name.trim().is_empty() {
            return Err(Error::InvalidName {
                kind: EntryKind::Environment,
            });
        }
        env.name = env.name.trim().to_string();

        let layer = Layer::from_override(is_override);
        debug!(name = %env.name, %layer, "adding environment");
        self.mutate(|state| {
            let name = env.name.clone();
            state.environments.insert(&name, env, layer)
        })
    }

    /// Replace an environment in whichever layer defines it.
    pub fn update_environment(&self, env: EnvironmentConfig) -> Result<()> {
        if env.name.trim().is_empty() {
            return Err(Error::InvalidName {
                kind: EntryKind::Environment,
            });
        }
        let name = env.name.clone();
        let layer = self.mutate(|state| state.environments.update(&name, env))?;
        debug!(%name, %layer, "updated environment");
        Ok(())
    }

    /// Remove an environment from whichever layer defines it.
    pub fn remove_environment(&self, name: &str) -> Result<()> {
        let (_, layer) = self.mutate(|state| state.environments.remove(name))?;
        debug!(%name, %layer, "removed environment");
        Ok(())
    }

    /// Replace the schema version recorded in `app.yaml`.
    pub fn set_api_version(&self, version: &str) -> Result<()> {
        self.mutate(|state| {
            state.spec.api_version = version.to_string();
            Ok(())
        })
    }

    /// Name of the current environment, or an empty string when none is set
    /// or the marker cannot be read.
    pub fn current_environment(&self) -> String {
        let path = self.current_env_path();
        match self.fs.read_to_string(&path) {
            Ok(name) => name.trim().to_string(),
            Err(err) => {
                trace!(path = ?path, %err, "no current environment");
                String::new()
            }
        }
    }

    pub fn set_current_environment(&self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidName {
                kind: EntryKind::Environment,
            });
        }
        let path = self.current_env_path();
        if let Some(parent) = path.parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| Error::write("create", parent, e))?;
        }
        self.fs
            .write(&path, name.as_bytes())
            .map_err(|e| Error::write("write", &path, e))
    }
}
