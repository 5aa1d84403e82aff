// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

use rstest::{fixture, rstest};

use super::*;
use crate::fs::MemoryFilesystem;
use crate::{APP_FILENAME, layered::Layer};

const ROOT: &str = "/app";

const APP_YAML: &str = r#"apiVersion: 0.2.0
registries:
  incubator:
    protocol: github
    uri: github.com/ksonnet/parts/tree/master/incubator
libraries:
  nginx:
    registry: incubator
    version: 1.2.3
environments:
  default:
    path: default
  prod:
    path: prod
    libraries:
      redis:
        registry: incubator
        version: 0.4.0
      nginx:
        registry: incubator
        version: 2.0.0
"#;

const PARTS_YAML: &str = r#"name: nginx
apiVersion: 0.0.1
kind: ksonnet.io/parts
description: Nginx is a popular web server
author: ksonnet team
keywords:
  - nginx
  - server
license: Apache 2.0
quickStart:
  prototype: io.ksonnet.pkg.nginx-simple
"#;

const PROTOTYPE: &str = "// @name io.ksonnet.pkg.nginx-simple\n\
                         // @description A simple nginx deployment\n\
                         // @param name string Component name\n\
                         {}\n";

#[fixture]
fn store() -> ConfigStore {
    let fs = Arc::new(MemoryFilesystem::new());
    fs.write(&Path::new(ROOT).join(APP_FILENAME), APP_YAML.as_bytes())
        .unwrap();
    ConfigStore::open(fs, ROOT).expect("Should open store")
}

fn nginx(store: &ConfigStore) -> Package {
    Package::new(store.fs().clone(), ROOT, "incubator", "nginx", "1.2.3").unwrap()
}

#[rstest]
fn test_package_path(store: ConfigStore) {
    let pkg = nginx(&store);
    assert_eq!(pkg.path(), Path::new("/app/vendor/incubator/nginx@1.2.3"));
    assert_eq!(pkg.to_string(), "incubator/nginx@1.2.3");

    let legacy = Package::new(store.fs().clone(), ROOT, "incubator", "nginx", "").unwrap();
    assert_eq!(legacy.path(), Path::new("/app/vendor/incubator/nginx"));
}

#[rstest]
#[case("", "nginx")]
#[case("incubator", "")]
fn test_package_requires_registry_and_name(
    store: ConfigStore,
    #[case] registry: &str,
    #[case] name: &str,
) {
    let result = Package::new(store.fs().clone(), ROOT, registry, name, "1.0.0");
    assert!(matches!(result, Err(Error::InvalidDescriptor(_))));
}

#[rstest]
fn test_parts(store: ConfigStore) {
    let pkg = nginx(&store);
    store
        .fs()
        .write(&pkg.path().join(PARTS_FILENAME), PARTS_YAML.as_bytes())
        .unwrap();

    let parts = pkg.parts().expect("Should read parts.yaml");
    assert_eq!(parts.name.as_deref(), Some("nginx"));
    assert_eq!(parts.keywords, vec!["nginx", "server"]);
    assert_eq!(pkg.description().unwrap(), "Nginx is a popular web server");
}

#[rstest]
fn test_parts_missing(store: ConfigStore) {
    assert!(matches!(
        nginx(&store).parts(),
        Err(Error::ReadFailed { .. })
    ));
}

#[rstest]
fn test_prototypes(store: ConfigStore) {
    let pkg = nginx(&store);
    let dir = pkg.path().join(PROTOTYPES_DIR);
    store
        .fs()
        .write(&dir.join("simple.jsonnet"), PROTOTYPE.as_bytes())
        .unwrap();
    store
        .fs()
        .write(&dir.join("README.md"), b"not a prototype")
        .unwrap();

    let prototypes = pkg.prototypes().expect("Should discover prototypes");
    assert_eq!(prototypes.len(), 1);
    assert_eq!(prototypes[0].name, "io.ksonnet.pkg.nginx-simple");
}

#[rstest]
fn test_prototypes_absent_dir(store: ConfigStore) {
    assert!(nginx(&store).prototypes().unwrap().is_empty());
}

#[rstest]
fn test_malformed_prototype_fails_discovery(store: ConfigStore) {
    let pkg = nginx(&store);
    let dir = pkg.path().join(PROTOTYPES_DIR);
    store
        .fs()
        .write(&dir.join("a.jsonnet"), PROTOTYPE.as_bytes())
        .unwrap();
    store
        .fs()
        .write(&dir.join("b.jsonnet"), b"// @name broken\n{}\n")
        .unwrap();

    assert!(matches!(
        pkg.prototypes(),
        Err(Error::InvalidPrototype { .. })
    ));
}

#[rstest]
#[case::top_level("nginx", "1.2.3", true)]
#[case::any_version("nginx", "", true)]
#[case::environment_only("redis", "0.4.0", true)]
#[case::environment_version("nginx", "2.0.0", true)]
#[case::other_version("nginx", "9.9.9", false)]
#[case::unknown("mysql", "", false)]
fn test_library_install_checker(
    store: ConfigStore,
    #[case] name: &str,
    #[case] version: &str,
    #[case] expected: bool,
) {
    let pkg = Package::new(store.fs().clone(), ROOT, "incubator", name, version).unwrap();
    let checker = LibraryInstallChecker::new(&store);
    assert_eq!(pkg.is_installed(&checker).unwrap(), expected);
}

#[rstest]
fn test_manager_packages(store: ConfigStore) {
    let manager = LibraryPackageManager::new(&store);
    let names: Vec<_> = manager
        .packages()
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        names,
        vec![
            "incubator/nginx@1.2.3",
            "incubator/nginx@2.0.0",
            "incubator/redis@0.4.0",
        ]
    );
}

#[rstest]
fn test_manager_packages_for_environment(store: ConfigStore) {
    let manager = LibraryPackageManager::new(&store);

    let default: Vec<_> = manager
        .packages_for_environment("default")
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(default, vec!["incubator/nginx@1.2.3"]);

    let prod: Vec<_> = manager
        .packages_for_environment("prod")
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(prod, vec!["incubator/nginx@2.0.0", "incubator/redis@0.4.0"]);
}

#[rstest]
fn test_manager_unknown_environment(store: ConfigStore) {
    let manager = LibraryPackageManager::new(&store);
    assert!(matches!(
        manager.packages_for_environment("staging"),
        Err(Error::NotFound { .. })
    ));
}

#[rstest]
fn test_override_environment_packages(store: ConfigStore) {
    let mut env = crate::spec::EnvironmentConfig::new("local", "https://localhost", "dev");
    env.libraries.insert(
        "mysql".to_string(),
        LibraryConfig::new("mysql", "incubator", "5.7.0"),
    );
    store.add_environment(env, true).unwrap();
    assert_eq!(store.environment("local").unwrap().unwrap().1, Layer::Override);

    let manager = LibraryPackageManager::new(&store);
    let local: Vec<_> = manager
        .packages_for_environment("local")
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(local, vec!["incubator/mysql@5.7.0", "incubator/nginx@1.2.3"]);
}

#[rstest]
fn test_vendored_packages(store: ConfigStore) {
    let fs = store.fs();
    for path in [
        "/app/vendor/incubator/nginx@1.2.3/parts.yaml",
        "/app/vendor/incubator/redis/parts.yaml",
        "/app/vendor/incubator/redis/prototypes/redis.jsonnet",
        "/app/vendor/stray.txt",
    ] {
        fs.write(Path::new(path), b"name: x\n").unwrap();
    }

    let names: Vec<_> = vendored_packages(fs.clone(), Path::new(ROOT))
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(names, vec!["incubator/nginx@1.2.3", "incubator/redis"]);
}

#[rstest]
fn test_vendored_packages_without_vendor_dir(store: ConfigStore) {
    assert!(
        vendored_packages(store.fs().clone(), Path::new(ROOT))
            .unwrap()
            .is_empty()
    );
}
