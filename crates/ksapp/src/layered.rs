// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Two-layer named collections: entries from `app.yaml` and from
//! `app.override.yaml`.
//!
//! Whether an entry is an override is a property of which map holds it,
//! not a flag stored on the entry. Every name is expected to live in exactly
//! one layer; inserts enforce that, and lookups report a [`Error::Conflict`]
//! when files edited by hand put a name in both.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EntryKind;
use crate::{Error, Result};

#[cfg(test)]
#[path = "./layered_test.rs"]
mod layered_test;

/// The configuration layer an entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// The tracked base configuration, `app.yaml`.
    Spec,
    /// The local, untracked `app.override.yaml`.
    Override,
}

impl Layer {
    pub fn from_override(is_override: bool) -> Self {
        if is_override {
            Self::Override
        } else {
            Self::Spec
        }
    }

    pub fn is_override(self) -> bool {
        self == Self::Override
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spec => f.write_str("app.yaml"),
            Self::Override => f.write_str("app.override.yaml"),
        }
    }
}

/// A named collection split across the spec and override layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Layered<T> {
    kind: EntryKind,
    spec: BTreeMap<String, T>,
    overrides: BTreeMap<String, T>,
}

impl<T> Layered<T> {
    pub fn new(kind: EntryKind) -> Self {
        Self {
            kind,
            spec: BTreeMap::new(),
            overrides: BTreeMap::new(),
        }
    }

    /// Build from already-loaded maps. Names present in both maps are kept
    /// as-is and surface as conflicts on lookup.
    pub fn from_layers(
        kind: EntryKind,
        spec: BTreeMap<String, T>,
        overrides: BTreeMap<String, T>,
    ) -> Self {
        Self {
            kind,
            spec,
            overrides,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn layer(&self, layer: Layer) -> &BTreeMap<String, T> {
        match layer {
            Layer::Spec => &self.spec,
            Layer::Override => &self.overrides,
        }
    }

    fn layer_mut(&mut self, layer: Layer) -> &mut BTreeMap<String, T> {
        match layer {
            Layer::Spec => &mut self.spec,
            Layer::Override => &mut self.overrides,
        }
    }

    /// Which layer holds `name`, if any.
    pub fn which(&self, name: &str) -> Result<Option<Layer>> {
        match (self.spec.contains_key(name), self.overrides.contains_key(name)) {
            (true, true) => Err(Error::Conflict {
                kind: self.kind,
                name: name.to_string(),
            }),
            (true, false) => Ok(Some(Layer::Spec)),
            (false, true) => Ok(Some(Layer::Override)),
            (false, false) => Ok(None),
        }
    }

    /// Look up `name` together with the layer it was found in.
    pub fn get(&self, name: &str) -> Result<Option<(&T, Layer)>> {
        Ok(match self.which(name)? {
            Some(layer) => self.layer(layer).get(name).map(|v| (v, layer)),
            None => None,
        })
    }

    /// Add a new entry to `layer`. Fails if the name exists in either layer.
    pub fn insert(&mut self, name: &str, value: T, layer: Layer) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidName { kind: self.kind });
        }
        for existing in [layer, other(layer)] {
            if self.layer(existing).contains_key(name) {
                return Err(Error::AlreadyExists {
                    kind: self.kind,
                    name: name.to_string(),
                    layer: existing,
                });
            }
        }
        self.layer_mut(layer).insert(name.to_string(), value);
        Ok(())
    }

    /// Replace an existing entry in whichever layer holds it.
    pub fn update(&mut self, name: &str, value: T) -> Result<Layer> {
        let layer = self.require(name)?;
        self.layer_mut(layer).insert(name.to_string(), value);
        Ok(layer)
    }

    /// Remove an entry from whichever layer holds it.
    pub fn remove(&mut self, name: &str) -> Result<(T, Layer)> {
        let layer = self.require(name)?;
        let value = self
            .layer_mut(layer)
            .remove(name)
            .ok_or_else(|| self.not_found(name))?;
        Ok((value, layer))
    }

    fn require(&self, name: &str) -> Result<Layer> {
        if name.trim().is_empty() {
            return Err(Error::InvalidName { kind: self.kind });
        }
        self.which(name)?.ok_or_else(|| self.not_found(name))
    }

    fn not_found(&self, name: &str) -> Error {
        Error::NotFound {
            kind: self.kind,
            name: name.to_string(),
        }
    }

    /// All entries of both layers, ordered by name, spec before override
    /// for a conflicting name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T, Layer)> + '_ {
        let mut entries: Vec<(&str, &T, Layer)> = self
            .spec
            .iter()
            .map(|(k, v)| (k.as_str(), v, Layer::Spec))
            .chain(
                self.overrides
                    .iter()
                    .map(|(k, v)| (k.as_str(), v, Layer::Override)),
            )
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0).then_with(|| layer_rank(a.2).cmp(&layer_rank(b.2))));
        entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.spec.len() + self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spec.is_empty() && self.overrides.is_empty()
    }

    /// Split back into `(spec, overrides)` maps for serialization.
    pub fn into_layers(self) -> (BTreeMap<String, T>, BTreeMap<String, T>) {
        (self.spec, self.overrides)
    }
}

fn other(layer: Layer) -> Layer {
    match layer {
        Layer::Spec => Layer::Override,
        Layer::Override => Layer::Spec,
    }
}

fn layer_rank(layer: Layer) -> u8 {
    match layer {
        Layer::Spec => 0,
        Layer::Override => 1,
    }
}
