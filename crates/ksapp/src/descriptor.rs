// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Package descriptors of the form `[registry/]name[@version]`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./descriptor_test.rs"]
mod descriptor_test;

static DESCRIPTOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9\-]+)(/[^@]+)?(@[^@]+)?$").expect("descriptor pattern is valid")
});

/// A parsed package identifier.
///
/// `registry` and `version` are empty when the identifier leaves them out.
/// Descriptors are never persisted in this form; the string is canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Descriptor {
    pub registry: String,
    pub name: String,
    pub version: String,
}

impl Descriptor {
    pub fn new(
        registry: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            registry: registry.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn has_registry(&self) -> bool {
        !self.registry.is_empty()
    }

    pub fn has_version(&self) -> bool {
        !self.version.is_empty()
    }
}

/// Parse a package identifier.
///
/// Without a `/` segment the leading word is the package name, so
/// `nginx@1.2.3` has no registry. Pure: no filesystem or network access.
pub fn parse(id: &str) -> Result<Descriptor> {
    let caps = DESCRIPTOR_RE
        .captures(id)
        .ok_or_else(|| Error::InvalidDescriptor(id.to_string()))?;

    let first = caps.get(1).map_or("", |m| m.as_str());
    let version = caps
        .get(3)
        .map_or("", |m| m.as_str().trim_start_matches('@'));

    let descriptor = match caps.get(2) {
        None => Descriptor::new("", first, version),
        Some(name) => Descriptor::new(first, name.as_str().trim_start_matches('/'), version),
    };
    Ok(descriptor)
}

impl FromStr for Descriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_registry() {
            write!(f, "{}/", self.registry)?;
        }
        f.write_str(&self.name)?;
        if self.has_version() {
            write!(f, "@{}", self.version)?;
        }
        Ok(())
    }
}
