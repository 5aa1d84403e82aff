// Copyright (c) Contributors to the ksapp project.
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use rstest::rstest;
use tempfile::TempDir;

use super::*;

#[rstest]
fn test_memory_write_creates_parents() {
    let fs = MemoryFilesystem::new();
    fs.write(Path::new("/app/vendor/incubator/nginx/parts.yaml"), b"name: nginx")
        .unwrap();

    assert!(fs.is_dir(Path::new("/app/vendor/incubator/nginx")).unwrap());
    assert!(fs.is_dir(Path::new("/app")).unwrap());
    assert!(fs.exists(Path::new("/app/vendor")).unwrap());
    assert_eq!(
        fs.read_to_string(Path::new("/app/vendor/incubator/nginx/parts.yaml"))
            .unwrap(),
        "name: nginx"
    );
}

#[rstest]
fn test_memory_read_missing_is_not_found() {
    let fs = MemoryFilesystem::new();
    let err = fs.read(Path::new("/missing")).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[rstest]
fn test_memory_rename_directory_moves_tree() {
    let fs = MemoryFilesystem::new();
    fs.write(Path::new("/v/nginx/parts.yaml"), b"a").unwrap();
    fs.write(Path::new("/v/nginx/prototypes/simple.jsonnet"), b"b")
        .unwrap();
    fs.write(Path::new("/v/nginx-extra/parts.yaml"), b"c").unwrap();

    fs.rename(Path::new("/v/nginx"), Path::new("/v/nginx@1.2.3"))
        .unwrap();

    assert!(!fs.exists(Path::new("/v/nginx")).unwrap());
    assert!(fs.is_dir(Path::new("/v/nginx@1.2.3/prototypes")).unwrap());
    assert_eq!(fs.read(Path::new("/v/nginx@1.2.3/parts.yaml")).unwrap(), b"a");
    // Sibling sharing the string prefix is untouched.
    assert_eq!(fs.read(Path::new("/v/nginx-extra/parts.yaml")).unwrap(), b"c");
}

#[rstest]
fn test_memory_rename_missing_fails() {
    let fs = MemoryFilesystem::new();
    assert!(fs.rename(Path::new("/nope"), Path::new("/other")).is_err());
}

#[rstest]
fn test_memory_walk_lists_files_only() {
    let fs = MemoryFilesystem::new();
    fs.write(Path::new("/p/b.jsonnet"), b"").unwrap();
    fs.write(Path::new("/p/a.jsonnet"), b"").unwrap();
    fs.write(Path::new("/p/nested/c.jsonnet"), b"").unwrap();
    fs.create_dir_all(Path::new("/p/empty")).unwrap();

    let files = fs.walk(Path::new("/p")).unwrap();
    assert_eq!(
        files,
        vec![
            PathBuf::from("/p/a.jsonnet"),
            PathBuf::from("/p/b.jsonnet"),
            PathBuf::from("/p/nested/c.jsonnet"),
        ]
    );
}

#[rstest]
fn test_memory_remove_file() {
    let fs = MemoryFilesystem::new();
    fs.write(Path::new("/f"), b"x").unwrap();
    fs.remove_file(Path::new("/f")).unwrap();
    assert!(!fs.exists(Path::new("/f")).unwrap());
    assert!(fs.remove_file(Path::new("/f")).is_err());
}

#[rstest]
fn test_os_write_is_readable_and_replaces() {
    let tmp = TempDir::new().unwrap();
    let fs = OsFilesystem;
    let path = tmp.path().join("nested").join("app.yaml");

    fs.write(&path, b"first").unwrap();
    fs.write(&path, b"second").unwrap();

    assert_eq!(fs.read_to_string(&path).unwrap(), "second");
    // No temporary files are left behind next to the target.
    let entries: Vec<_> = std::fs::read_dir(tmp.path().join("nested"))
        .unwrap()
        .collect();
    assert_eq!(entries.len(), 1);
}

#[rstest]
fn test_os_walk_and_rename() {
    let tmp = TempDir::new().unwrap();
    let fs = OsFilesystem;
    let legacy = tmp.path().join("vendor").join("incubator").join("nginx");
    fs.write(&legacy.join("prototypes").join("simple.jsonnet"), b"")
        .unwrap();
    fs.write(&legacy.join("parts.yaml"), b"").unwrap();

    let versioned = tmp.path().join("vendor").join("incubator").join("nginx@1.2.3");
    fs.rename(&legacy, &versioned).unwrap();

    assert!(!fs.exists(&legacy).unwrap());
    assert!(fs.is_dir(&versioned).unwrap());
    let files = fs.walk(&versioned).unwrap();
    assert_eq!(
        files,
        vec![
            versioned.join("parts.yaml"),
            versioned.join("prototypes").join("simple.jsonnet"),
        ]
    );
}

#[rstest]
fn test_os_is_dir_missing_is_false() {
    let tmp = TempDir::new().unwrap();
    assert!(!OsFilesystem.is_dir(&tmp.path().join("missing")).unwrap());
}
