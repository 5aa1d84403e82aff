// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use rstest::{fixture, rstest};

use super::*;

#[fixture]
fn registries() -> Layered<String> {
    let mut l = Layered::new(EntryKind::Registry);
    l.insert("incubator", "github".to_string(), Layer::Spec).unwrap();
    l.insert("local", "fs".to_string(), Layer::Override).unwrap();
    l
}

#[rstest]
fn test_get_reports_layer(registries: Layered<String>) {
    assert_eq!(
        registries.get("incubator").unwrap(),
        Some((&"github".to_string(), Layer::Spec))
    );
    assert_eq!(
        registries.get("local").unwrap(),
        Some((&"fs".to_string(), Layer::Override))
    );
    assert_eq!(registries.get("missing").unwrap(), None);
}

#[rstest]
#[case(Layer::Spec)]
#[case(Layer::Override)]
fn test_insert_rejects_name_in_any_layer(mut registries: Layered<String>, #[case] target: Layer) {
    for name in ["incubator", "local"] {
        match registries.insert(name, "x".to_string(), target) {
            Err(Error::AlreadyExists { name: got, .. }) => assert_eq!(got, name),
            other => panic!("Expected AlreadyExists, got: {other:?}"),
        }
    }
    assert_eq!(registries.len(), 2);
}

#[rstest]
fn test_insert_rejects_blank_name(mut registries: Layered<String>) {
    assert!(matches!(
        registries.insert("  ", "x".to_string(), Layer::Spec),
        Err(Error::InvalidName {
            kind: EntryKind::Registry
        })
    ));
}

#[rstest]
fn test_update_stays_in_layer(mut registries: Layered<String>) {
    let layer = registries.update("local", "git".to_string()).unwrap();
    assert_eq!(layer, Layer::Override);
    assert_eq!(registries.layer(Layer::Override)["local"], "git");
    assert!(!registries.layer(Layer::Spec).contains_key("local"));
}

#[rstest]
fn test_update_missing_is_not_found(mut registries: Layered<String>) {
    assert!(matches!(
        registries.update("nope", "x".to_string()),
        Err(Error::NotFound { .. })
    ));
}

#[rstest]
fn test_conflict_from_loaded_layers() {
    let spec = BTreeMap::from([("dup".to_string(), 1)]);
    let overrides = BTreeMap::from([("dup".to_string(), 2)]);
    let mut l = Layered::from_layers(EntryKind::Environment, spec, overrides);

    assert!(matches!(l.which("dup"), Err(Error::Conflict { .. })));
    assert!(matches!(l.update("dup", 3), Err(Error::Conflict { .. })));
    assert!(matches!(l.remove("dup"), Err(Error::Conflict { .. })));

    let names: Vec<_> = l.iter().map(|(n, v, layer)| (n, *v, layer)).collect();
    assert_eq!(names, vec![("dup", 1, Layer::Spec), ("dup", 2, Layer::Override)]);
}

#[rstest]
fn test_remove(mut registries: Layered<String>) {
    let (value, layer) = registries.remove("incubator").unwrap();
    assert_eq!(value, "github");
    assert_eq!(layer, Layer::Spec);
    assert_eq!(registries.len(), 1);
}

#[rstest]
fn test_iter_is_sorted_across_layers() {
    let mut l = Layered::new(EntryKind::Registry);
    l.insert("b", 2, Layer::Override).unwrap();
    l.insert("c", 3, Layer::Spec).unwrap();
    l.insert("a", 1, Layer::Spec).unwrap();
    let names: Vec<_> = l.iter().map(|(n, _, _)| n).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[rstest]
fn test_into_layers(registries: Layered<String>) {
    let (spec, overrides) = registries.into_layers();
    assert_eq!(spec.keys().collect::<Vec<_>>(), vec!["incubator"]);
    assert_eq!(overrides.keys().collect::<Vec<_>>(), vec!["local"]);
}
