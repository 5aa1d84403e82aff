// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for ksapp operations.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::layered::Layer;

/// Convenience Result type with ksapp Error.
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of named entry an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Registry,
    Environment,
    Library,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry => f.write_str("registry"),
            Self::Environment => f.write_str("environment"),
            Self::Library => f.write_str("library"),
        }
    }
}

/// Errors that can occur during ksapp operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Failed to read a file
    #[error("Failed to read {path:?}")]
    #[diagnostic(code(ksapp::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to write, rename or remove a file
    #[error("Failed to {op} {path:?}")]
    #[diagnostic(code(ksapp::write_failed))]
    WriteFailed {
        op: &'static str,
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Invalid YAML in a configuration file
    #[error("Invalid YAML in {path:?}: {error}")]
    #[diagnostic(
        code(ksapp::invalid_yaml),
        help("Check the YAML syntax and that only known fields are present")
    )]
    InvalidYaml {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    /// Failed to convert a value to YAML
    #[error("Failed to convert {what} to YAML")]
    #[diagnostic(code(ksapp::serialize_failed))]
    SerializeFailed {
        what: &'static str,
        #[source]
        error: serde_yaml::Error,
    },

    /// Configuration parsed but is semantically invalid
    #[error("Validation failed: {0}")]
    #[diagnostic(code(ksapp::validation_failed))]
    ValidationFailed(String),

    /// Blank name supplied to a mutating operation
    #[error("Invalid {kind} name: name must not be blank")]
    #[diagnostic(code(ksapp::invalid_name))]
    InvalidName { kind: EntryKind },

    /// Name already present
    #[error("{kind} {name:?} already exists in {layer}")]
    #[diagnostic(
        code(ksapp::already_exists),
        help("Use the update operation to change an existing {kind}")
    )]
    AlreadyExists {
        kind: EntryKind,
        name: String,
        layer: Layer,
    },

    /// Name absent from both layers
    #[error("{kind} not found: {name}")]
    #[diagnostic(code(ksapp::not_found))]
    NotFound { kind: EntryKind, name: String },

    /// Name present in both layers at once
    #[error("{kind} {name:?} found in both app.yaml and app.override.yaml")]
    #[diagnostic(
        code(ksapp::conflict),
        help("Remove the {kind} from one of the two files by hand")
    )]
    Conflict { kind: EntryKind, name: String },

    /// Package identifier does not match `[registry/]name[@version]`
    #[error("Invalid package descriptor {0:?}")]
    #[diagnostic(
        code(ksapp::invalid_descriptor),
        help("Package names should be in the form `<registry>/<library>@<version>`")
    )]
    InvalidDescriptor(String),

    /// Malformed prototype file
    #[error("Invalid prototype {path:?}: {reason}")]
    #[diagnostic(code(ksapp::invalid_prototype))]
    InvalidPrototype { path: PathBuf, reason: String },

    /// A migration step failed
    #[error("Migrating {name}")]
    #[diagnostic(code(ksapp::migration_failed))]
    MigrationFailed {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// No application directory above the starting point
    #[error("No app.yaml found in {0:?} or any parent directory")]
    #[diagnostic(
        code(ksapp::no_app),
        help("Run 'ksapp init' to create an application, or pass --app <dir>")
    )]
    NoAppRoot(PathBuf),

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(ksapp::io_error))]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn read(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::ReadFailed {
            path: path.into(),
            error,
        }
    }

    pub(crate) fn write(op: &'static str, path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::WriteFailed {
            op,
            path: path.into(),
            error,
        }
    }
}
