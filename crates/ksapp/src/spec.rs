// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Data types for `app.yaml` and `app.override.yaml`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::fs::Filesystem;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./spec_test.rs"]
mod spec_test;

/// Schema versions this crate can load.
pub const SUPPORTED_API_VERSIONS: &[&str] = &["0.1.0", "0.2.0"];

/// `kind` written to application specs.
pub const APP_KIND: &str = "ksonnet.io/app";

/// `kind` written to override files.
pub const OVERRIDE_KIND: &str = "ksonnet.io/app-override";

pub type RegistryConfigs = BTreeMap<String, RegistryConfig>;
pub type LibraryConfigs = BTreeMap<String, LibraryConfig>;
pub type EnvironmentConfigs = BTreeMap<String, EnvironmentConfig>;

/// Accept a missing or `null` mapping as an empty one.
fn nullable_map<'de, D, T>(deserializer: D) -> std::result::Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<BTreeMap<String, T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A package registry. The name is the key it is stored under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegistryConfig {
    #[serde(skip)]
    pub name: String,

    /// How the registry is reached, e.g. `github` or `fs`.
    #[serde(default)]
    pub protocol: String,

    /// Location of the registry for its protocol.
    #[serde(default)]
    pub uri: String,
}

impl RegistryConfig {
    pub fn new(
        name: impl Into<String>,
        protocol: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            protocol: protocol.into(),
            uri: uri.into(),
        }
    }
}

/// Reference to an installed package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LibraryConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub registry: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl LibraryConfig {
    pub fn new(
        name: impl Into<String>,
        registry: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            registry: registry.into(),
            version: version.into(),
        }
    }
}

/// Cluster endpoint an environment deploys to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnvironmentDestination {
    #[serde(default)]
    pub server: String,

    #[serde(default)]
    pub namespace: String,
}

/// A deployment target. The name is the key it is stored under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    #[serde(skip)]
    pub name: String,

    #[serde(rename = "k8sVersion", default, skip_serializing_if = "String::is_empty")]
    pub kube_version: String,

    /// Directory of the environment below `environments/`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<EnvironmentDestination>,

    /// Component modules deployed to this environment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    /// Packages installed only for this environment.
    #[serde(default, deserialize_with = "nullable_map")]
    pub libraries: LibraryConfigs,
}

impl EnvironmentConfig {
    pub fn new(name: impl Into<String>, server: &str, namespace: &str) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            destination: Some(EnvironmentDestination {
                server: server.to_string(),
                namespace: namespace.to_string(),
            }),
            ..Default::default()
        }
    }
}

/// The base application specification from `app.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    /// Schema version, e.g. `0.2.0`.
    #[serde(default)]
    pub api_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, deserialize_with = "nullable_map")]
    pub registries: RegistryConfigs,

    #[serde(default, deserialize_with = "nullable_map")]
    pub libraries: LibraryConfigs,

    #[serde(default, deserialize_with = "nullable_map")]
    pub environments: EnvironmentConfigs,
}

impl Default for AppSpec {
    fn default() -> Self {
        Self {
            api_version: crate::CURRENT_API_VERSION.to_string(),
            kind: Some(APP_KIND.to_string()),
            name: None,
            version: None,
            description: None,
            authors: Vec::new(),
            license: None,
            registries: RegistryConfigs::new(),
            libraries: LibraryConfigs::new(),
            environments: EnvironmentConfigs::new(),
        }
    }
}

impl AppSpec {
    /// Parse a spec from YAML. `path` is only used for error reporting.
    pub fn from_yaml(path: &Path, yaml: &str) -> Result<Self> {
        let mut spec: Self = serde_yaml::from_str(yaml).map_err(|error| Error::InvalidYaml {
            path: path.to_path_buf(),
            error,
        })?;
        spec.normalize();
        Ok(spec)
    }

    /// Load a spec from `path`.
    pub fn load(fs: &dyn Filesystem, path: &Path) -> Result<Self> {
        let yaml = fs.read_to_string(path).map_err(|e| Error::read(path, e))?;
        Self::from_yaml(path, &yaml)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|error| Error::SerializeFailed {
            what: "application configuration",
            error,
        })
    }

    /// Fill in names that are implied by map keys.
    pub fn normalize(&mut self) {
        name_registries(&mut self.registries);
        name_environments(&mut self.environments);
        name_libraries(&mut self.libraries);
    }

    /// Check that the spec is usable: a recognised schema version and no
    /// blank required fields.
    pub fn validate(&self) -> Result<()> {
        validate_api_version(&self.api_version)?;
        validate_registries(&self.registries)?;
        validate_environments(&self.environments)?;
        for (key, lib) in &self.libraries {
            if key.trim().is_empty() {
                return Err(Error::ValidationFailed(
                    "library names must not be blank".to_string(),
                ));
            }
            if lib.registry.trim().is_empty() {
                return Err(Error::ValidationFailed(format!(
                    "library {key:?} does not name a registry"
                )));
            }
        }
        Ok(())
    }
}

/// The local override layer from `app.override.yaml`.
///
/// Only registries and environments can be overridden.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Override {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, deserialize_with = "nullable_map")]
    pub registries: RegistryConfigs,

    #[serde(default, deserialize_with = "nullable_map")]
    pub environments: EnvironmentConfigs,
}

impl Override {
    pub fn from_yaml(path: &Path, yaml: &str) -> Result<Self> {
        let mut ov: Self = serde_yaml::from_str(yaml).map_err(|error| Error::InvalidYaml {
            path: path.to_path_buf(),
            error,
        })?;
        name_registries(&mut ov.registries);
        name_environments(&mut ov.environments);
        Ok(ov)
    }

    pub fn load(fs: &dyn Filesystem, path: &Path) -> Result<Self> {
        let yaml = fs.read_to_string(path).map_err(|e| Error::read(path, e))?;
        Self::from_yaml(path, &yaml)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|error| Error::SerializeFailed {
            what: "override configuration",
            error,
        })
    }

    /// An override is defined when it holds at least one entry.
    pub fn is_defined(&self) -> bool {
        !self.registries.is_empty() || !self.environments.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(kind) = &self.kind {
            if kind != OVERRIDE_KIND {
                return Err(Error::ValidationFailed(format!(
                    "override kind must be {OVERRIDE_KIND:?}, found {kind:?}"
                )));
            }
        }
        validate_registries(&self.registries)?;
        validate_environments(&self.environments)
    }
}

fn name_registries(registries: &mut RegistryConfigs) {
    for (key, reg) in registries.iter_mut() {
        reg.name.clone_from(key);
    }
}

fn name_environments(environments: &mut EnvironmentConfigs) {
    for (key, env) in environments.iter_mut() {
        env.name.clone_from(key);
        name_libraries(&mut env.libraries);
    }
}

fn name_libraries(libraries: &mut LibraryConfigs) {
    for (key, lib) in libraries.iter_mut() {
        if lib.name.is_empty() {
            lib.name.clone_from(key);
        }
    }
}

fn validate_api_version(api_version: &str) -> Result<()> {
    if api_version.trim().is_empty() {
        return Err(Error::ValidationFailed("apiVersion is required".to_string()));
    }
    if semver::Version::parse(api_version).is_err() {
        return Err(Error::ValidationFailed(format!(
            "apiVersion {api_version:?} is not a semantic version"
        )));
    }
    if !SUPPORTED_API_VERSIONS.contains(&api_version) {
        return Err(Error::ValidationFailed(format!(
            "unsupported apiVersion {api_version:?} (supported: {})",
            SUPPORTED_API_VERSIONS.join(", ")
        )));
    }
    Ok(())
}

fn validate_registries(registries: &RegistryConfigs) -> Result<()> {
    for (key, reg) in registries {
        if key.trim().is_empty() {
            return Err(Error::ValidationFailed(
                "registry names must not be blank".to_string(),
            ));
        }
        if reg.protocol.trim().is_empty() {
            return Err(Error::ValidationFailed(format!(
                "registry {key:?} does not declare a protocol"
            )));
        }
    }
    Ok(())
}

fn validate_environments(environments: &EnvironmentConfigs) -> Result<()> {
    if environments.keys().any(|k| k.trim().is_empty()) {
        return Err(Error::ValidationFailed(
            "environment names must not be blank".to_string(),
        ));
    }
    Ok(())
}
