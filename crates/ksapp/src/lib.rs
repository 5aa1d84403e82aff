// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

//! ksapp - Layered Application Configuration
//!
//! This crate provides the core library for managing a ksonnet-style
//! application directory: its configuration files, vendored packages and
//! schema upgrades.
//!
//! # Overview
//!
//! An application is described by a tracked `app.yaml` and an optional,
//! untracked `app.override.yaml` holding local registries and environments.
//! Every registry or environment name lives in exactly one of the two files.
//! Packages are vendored below `vendor/<registry>/<name>@<version>`.
//!
//! # Example
//!
//! ```yaml
//! # app.yaml
//! apiVersion: 0.2.0
//! kind: ksonnet.io/app
//! name: guestbook
//! registries:
//!   incubator:
//!     protocol: github
//!     uri: github.com/ksonnet/parts/tree/master/incubator
//! libraries:
//!   nginx:
//!     registry: incubator
//!     version: 1.2.3
//! environments:
//!   default:
//!     destination:
//!       server: https://cluster.example.com
//!       namespace: default
//! ```

pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod eval;
pub mod fs;
pub mod layered;
pub mod package;
pub mod prototype;
pub mod spec;
pub mod store;
pub mod upgrade;
pub mod vendor;

pub use descriptor::Descriptor;
pub use discovery::find_app_root;
pub use error::{EntryKind, Error, Result};
pub use eval::EvalContext;
pub use fs::{Filesystem, MemoryFilesystem, OsFilesystem};
pub use layered::{Layer, Layered};
pub use package::{
    InstallChecker, LibraryInstallChecker, LibraryPackageManager, Package, PackageManager,
    PartsSpec, vendored_packages,
};
pub use prototype::Prototype;
pub use spec::{AppSpec, EnvironmentConfig, LibraryConfig, Override, RegistryConfig};
pub use store::ConfigStore;
pub use upgrade::{Migration, UpgradeReport, run_migrations, upgrade};

/// Well-known filename for the application spec.
pub const APP_FILENAME: &str = "app.yaml";

/// Well-known filename for local overrides.
pub const OVERRIDE_FILENAME: &str = "app.override.yaml";

/// Marker holding the current environment, relative to the app root.
pub const CURRENT_ENV_PATH: &str = ".ksonnet/current";

/// Directory packages are vendored into.
pub const VENDOR_DIR: &str = "vendor";

/// Package metadata file inside a vendored package.
pub const PARTS_FILENAME: &str = "parts.yaml";

/// Prototype directory inside a vendored package.
pub const PROTOTYPES_DIR: &str = "prototypes";

/// Schema version written by this release.
pub const CURRENT_API_VERSION: &str = "0.2.0";
