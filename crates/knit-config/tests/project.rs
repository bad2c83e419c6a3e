use std::fs;

use knit_config::{ConfigError, PackageType, Project};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) {
    fs::write(dir.path().join(name), content).unwrap();
}

#[test]
fn loads_manifest_and_tsconfig() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "package.json",
        r#"{"name":"pkg","version":"1.0.0","type":"module","main":"./lib/index.js"}"#,
    );
    write(
        &dir,
        "tsconfig.json",
        r#"{"compilerOptions":{"outDir":"lib","sourceMap":true}}"#,
    );

    let project = Project::load(dir.path()).unwrap();
    assert_eq!(project.manifest.package_type, PackageType::Module);
    assert_eq!(project.out_dir(), dir.path().join("lib"));
    assert_eq!(project.root_dir(), dir.path().join("src"));
    assert!(project.tsconfig.source_map());
}

#[test]
fn tsconfig_is_optional() {
    let dir = TempDir::new().unwrap();
    write(&dir, "package.json", r#"{"name":"pkg","version":"1.0.0"}"#);

    let project = Project::load(dir.path()).unwrap();
    assert_eq!(project.out_dir(), dir.path().join("dist"));
}

#[test]
fn missing_manifest_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = Project::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ManifestNotFound(_)));
}

#[test]
fn invalid_manifest_names_the_file() {
    let dir = TempDir::new().unwrap();
    write(&dir, "package.json", "{ not json");

    let err = Project::load(dir.path()).unwrap_err();
    match err {
        ConfigError::Parse { path, .. } => assert!(path.ends_with("package.json")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn manifest_without_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(&dir, "package.json", r#"{"name":"pkg"}"#);

    let err = Project::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingField("version")));
}
