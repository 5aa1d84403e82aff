// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

use rstest::rstest;

use super::*;

#[rstest]
#[case("incubator/nginx@1.2.3", "incubator", "nginx", "1.2.3")]
#[case("incubator/nginx", "incubator", "nginx", "")]
#[case("nginx@1.2.3", "", "nginx", "1.2.3")]
#[case("nginx", "", "nginx", "")]
#[case("my-registry/redis@00112233ff", "my-registry", "redis", "00112233ff")]
#[case("stable/charts/redis@2.0", "stable", "charts/redis", "2.0")]
fn test_parse_valid(
    #[case] id: &str,
    #[case] registry: &str,
    #[case] name: &str,
    #[case] version: &str,
) {
    let d = parse(id).expect("descriptor should parse");
    assert_eq!(d, Descriptor::new(registry, name, version));
}

#[rstest]
#[case("")]
#[case("nginx@1@2")]
#[case("incubator/nginx@1.2.3@4")]
#[case("bad_name")]
#[case("/nginx")]
#[case("@1.2.3")]
#[case("incubator/@1.2.3")]
fn test_parse_invalid(#[case] id: &str) {
    match parse(id) {
        Err(crate::Error::InvalidDescriptor(got)) => assert_eq!(got, id),
        other => panic!("Expected InvalidDescriptor for {id:?}, got: {other:?}"),
    }
}

#[rstest]
fn test_from_str_matches_parse() {
    let d: Descriptor = "incubator/nginx@1.2.3".parse().unwrap();
    assert!(d.has_registry());
    assert!(d.has_version());
    assert_eq!(d, parse("incubator/nginx@1.2.3").unwrap());
}

#[rstest]
#[case("incubator/nginx@1.2.3")]
#[case("incubator/nginx")]
#[case("nginx@1.2.3")]
#[case("nginx")]
fn test_display_is_canonical(#[case] id: &str) {
    assert_eq!(parse(id).unwrap().to_string(), id);
}
