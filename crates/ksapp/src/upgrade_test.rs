// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

use std::cell::RefCell;
use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::fs::MemoryFilesystem;
use crate::package::LibraryPackageManager;
use crate::APP_FILENAME;

const ROOT: &str = "/app";

const LEGACY_APP: &str = r#"apiVersion: 0.1.0
registries:
  incubator:
    protocol: github
    uri: github.com/ksonnet/parts/tree/master/incubator
libraries:
  nginx:
    registry: incubator
    version: 1.2.3
"#;

#[fixture]
fn legacy_app() -> ConfigStore {
    let fs = Arc::new(MemoryFilesystem::new());
    fs.write(&Path::new(ROOT).join(APP_FILENAME), LEGACY_APP.as_bytes())
        .unwrap();
    fs.write(
        Path::new("/app/vendor/incubator/nginx/parts.yaml"),
        b"name: nginx\n",
    )
    .unwrap();
    ConfigStore::open(fs, ROOT).expect("Should open legacy app")
}

#[rstest]
#[case("=0.1.0", "0.1.0", true)]
#[case("=0.1.0", "0.2.0", false)]
#[case(">=0.1.0, <0.3.0", "0.2.5", true)]
#[case("=0.1.0", "not-a-version", false)]
#[case("=0.1.0", "", false)]
fn test_semver_matcher(#[case] range: &str, #[case] version: &str, #[case] expected: bool) {
    let matcher = semver_matcher(range).expect("valid range");
    assert_eq!(matcher(version), expected);
}

#[rstest]
fn test_semver_matcher_invalid_range() {
    assert!(matches!(
        semver_matcher("not a range"),
        Err(Error::ValidationFailed(_))
    ));
}

#[rstest]
fn test_run_migrations_chains_in_order() {
    let calls = RefCell::new(Vec::new());
    let migrations = vec![
        Migration::new(
            "one",
            |v: &str| v == "1",
            || {
                calls.borrow_mut().push("one");
                Ok("2".to_string())
            },
        ),
        Migration::new(
            "skipped",
            |v: &str| v == "1",
            || {
                calls.borrow_mut().push("skipped");
                Ok("9".to_string())
            },
        ),
        Migration::new(
            "two",
            |v: &str| v == "2",
            || {
                calls.borrow_mut().push("two");
                Ok("3".to_string())
            },
        ),
    ];

    let version = run_migrations(&migrations, "1").unwrap();
    assert_eq!(version, "3");
    assert_eq!(*calls.borrow(), vec!["one", "two"]);
}

#[rstest]
fn test_run_migrations_stops_on_failure() {
    let ran_after = RefCell::new(false);
    let migrations = vec![
        Migration::new(
            "broken",
            |_: &str| true,
            || Err(Error::ValidationFailed("boom".to_string())),
        ),
        Migration::new(
            "after",
            |_: &str| true,
            || {
                *ran_after.borrow_mut() = true;
                Ok("2".to_string())
            },
        ),
    ];

    match run_migrations(&migrations, "1") {
        Err(Error::MigrationFailed { name, .. }) => assert_eq!(name, "broken"),
        other => panic!("Expected MigrationFailed, got: {other:?}"),
    }
    assert!(!*ran_after.borrow());
}

#[rstest]
fn test_vendor_cache_migration(legacy_app: ConfigStore) {
    let manager = LibraryPackageManager::new(&legacy_app);
    let fs = legacy_app.fs().as_ref();
    let migrations = default_migrations(fs, legacy_app.root(), &manager).unwrap();

    let version = run_migrations(&migrations, "0.1.0").unwrap();
    assert_eq!(version, "0.2.0");
    assert!(fs
        .exists(Path::new("/app/vendor/incubator/nginx@1.2.3/parts.yaml"))
        .unwrap());
    assert!(!fs.exists(Path::new("/app/vendor/incubator/nginx")).unwrap());

    // Already versioned: nothing is renamed and nothing fails.
    migrate_vendor_cache(fs, legacy_app.root(), &manager).unwrap();
    assert!(fs
        .exists(Path::new("/app/vendor/incubator/nginx@1.2.3/parts.yaml"))
        .unwrap());
}

#[rstest]
fn test_vendor_cache_migration_nothing_vendored() {
    let fs = Arc::new(MemoryFilesystem::new());
    fs.write(&Path::new(ROOT).join(APP_FILENAME), LEGACY_APP.as_bytes())
        .unwrap();
    let store = ConfigStore::open(fs.clone(), ROOT).unwrap();
    let manager = LibraryPackageManager::new(&store);

    migrate_vendor_cache(fs.as_ref(), store.root(), &manager).unwrap();
    assert!(!fs.exists(Path::new("/app/vendor")).unwrap());
}

#[rstest]
fn test_upgrade_persists_version(legacy_app: ConfigStore) {
    let manager = LibraryPackageManager::new(&legacy_app);

    let report = upgrade(&legacy_app, &manager, false).unwrap();
    assert_eq!(report.from, "0.1.0");
    assert_eq!(report.to, "0.2.0");
    assert_eq!(report.migrations.len(), 1);
    assert_eq!(legacy_app.api_version(), "0.2.0");

    let yaml = legacy_app
        .fs()
        .read_to_string(&legacy_app.config_path())
        .unwrap();
    assert!(yaml.starts_with("apiVersion: 0.2.0"), "{yaml}");

    let again = upgrade(&legacy_app, &manager, false).unwrap();
    assert!(again.is_noop());
    assert_eq!(again.to, "0.2.0");
}

#[rstest]
fn test_upgrade_dry_run_changes_nothing(legacy_app: ConfigStore) {
    let manager = LibraryPackageManager::new(&legacy_app);
    let before = legacy_app
        .fs()
        .read_to_string(&legacy_app.config_path())
        .unwrap();

    let report = upgrade(&legacy_app, &manager, true).unwrap();
    assert!(report.dry_run);
    assert_eq!(report.migrations.len(), 1);
    assert_eq!(report.to, "0.1.0");

    let fs = legacy_app.fs();
    assert_eq!(fs.read_to_string(&legacy_app.config_path()).unwrap(), before);
    assert!(fs.exists(Path::new("/app/vendor/incubator/nginx")).unwrap());
}
