mod helpers;

use helpers::{create_package, load, matrix_for, outputs, relative, task_for};
use knit_matrix::{
    EntryTarget, MatrixError, MatrixOptions, ModuleFormat, Platform, RegistrySlot, build_matrix,
};

const LIB_TSCONFIG: &str = r#"{"compilerOptions":{"outDir":"lib","rootDir":"src"}}"#;

#[tokio::test]
async fn conditional_exports_produce_one_task_per_format() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{
                "name": "pkg",
                "version": "1.0.0",
                "type": "module",
                "exports": {
                    "require": "./lib/index.cjs",
                    "import": "./lib/index.mjs"
                }
            }"#,
        ),
        ("tsconfig.json", LIB_TSCONFIG),
        ("src/index.ts", "export const x = 1;"),
    ]);

    let matrix = matrix_for(&dir).await;
    assert_eq!(outputs(&dir, &matrix), ["lib/index.cjs", "lib/index.mjs"]);

    let cjs = task_for(&dir, &matrix, "lib/index.cjs");
    assert_eq!(cjs.format, ModuleFormat::Cjs);
    assert_eq!(cjs.entry_name, "index");
    assert_eq!(cjs.entry, dir.path().join("src").join("index.ts"));

    let esm = task_for(&dir, &matrix, "lib/index.mjs");
    assert_eq!(esm.format, ModuleFormat::Esm);
    assert_eq!(esm.entry_name, "index");
    assert_eq!(esm.platform, Platform::Node);
}

#[tokio::test]
async fn js_extension_inherits_package_type() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{"name":"pkg","version":"1.0.0","main":"./dist/index.js"}"#,
        ),
        ("src/index.ts", ""),
    ]);

    let matrix = matrix_for(&dir).await;
    assert_eq!(matrix.tasks.len(), 1);
    assert_eq!(matrix.tasks[0].format, ModuleFormat::Cjs);
}

#[tokio::test]
async fn first_declaration_wins() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{
                "name": "pkg",
                "version": "1.0.0",
                "type": "module",
                "main": "./dist/index.js",
                "exports": {
                    ".": {
                        "browser": "./dist/index.js",
                        "default": "./dist/index.js"
                    }
                }
            }"#,
        ),
        ("src/index.ts", ""),
    ]);

    let matrix = matrix_for(&dir).await;
    assert_eq!(outputs(&dir, &matrix), ["dist/index.js"]);
    // `main` came first, so the node preset owns the output
    assert_eq!(matrix.tasks[0].platform, Platform::Node);
}

#[tokio::test]
async fn output_files_are_unique() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{
                "name": "pkg",
                "version": "1.0.0",
                "main": "./dist/index.js",
                "module": "./dist/index.mjs",
                "exports": {
                    ".": {"import": "./dist/index.mjs", "require": "./dist/index.js"},
                    "./*": {"import": "./dist/*.mjs", "require": "./dist/*.js"}
                }
            }"#,
        ),
        ("src/index.ts", ""),
        ("src/a.ts", ""),
        ("src/nested/b.ts", ""),
    ]);

    let matrix = matrix_for(&dir).await;
    let mut all = outputs(&dir, &matrix);
    let total = all.len();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), total);
    assert!(all.contains(&"dist/nested/b.mjs".to_string()));
    assert!(all.contains(&"dist/a.js".to_string()));
}

#[tokio::test]
async fn wildcard_expands_recursively() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{"name":"pkg","version":"1.0.0","type":"module","exports":{"./*":"./dist/*.js"}}"#,
        ),
        ("src/a.ts", ""),
        ("src/deep/er/b.tsx", ""),
        ("src/types.d.ts", ""),
    ]);

    let matrix = matrix_for(&dir).await;
    assert_eq!(outputs(&dir, &matrix), ["dist/a.js", "dist/deep/er/b.js"]);
    assert_eq!(
        task_for(&dir, &matrix, "dist/deep/er/b.js").entry_name,
        "deep/er/b"
    );
}

#[tokio::test]
async fn declaration_branches_only_fill_types_slot() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{
                "name": "pkg",
                "version": "1.0.0",
                "type": "module",
                "types": "./dist/index.d.ts",
                "exports": {
                    "types": "./dist/index.d.ts",
                    "import": "./dist/index.js"
                }
            }"#,
        ),
        ("src/index.ts", ""),
    ]);

    let matrix = matrix_for(&dir).await;
    assert_eq!(outputs(&dir, &matrix), ["dist/index.js"]);
    assert_eq!(matrix.declarations.len(), 1);
    assert_eq!(matrix.declarations[0].target, EntryTarget::Declaration);

    let source = dir.path().join("src").join("index.ts");
    let types = matrix.registry.get(&source, RegistrySlot::Types).unwrap();
    assert_eq!(relative(dir.path(), types), "dist/index.d.ts");
}

#[tokio::test]
async fn declaration_sources_are_matched() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{
                "name": "pkg",
                "version": "1.0.0",
                "exports": {"./types": {"types": "./dist/types.d.ts"}}
            }"#,
        ),
        ("src/types.d.ts", "export type A = string;"),
    ]);

    let matrix = matrix_for(&dir).await;
    assert!(matrix.tasks.is_empty());
    let source = dir.path().join("src").join("types.d.ts");
    assert!(matrix.registry.get(&source, RegistrySlot::Types).is_some());
}

#[tokio::test]
async fn platform_conditions_register_separate_slots() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{
                "name": "pkg",
                "version": "1.0.0",
                "type": "module",
                "exports": {
                    ".": {
                        "browser": "./dist/browser/index.js",
                        "node": "./dist/node/index.js"
                    },
                    "./shared": {
                        "browser": "./dist/browser/shared.js",
                        "node": "./dist/node/shared.js"
                    }
                }
            }"#,
        ),
        ("src/browser/index.ts", ""),
        ("src/node/index.ts", ""),
        ("src/browser/shared.ts", ""),
        ("src/node/shared.ts", ""),
    ]);

    let matrix = matrix_for(&dir).await;
    assert_eq!(
        task_for(&dir, &matrix, "dist/browser/index.js").platform,
        Platform::Browser
    );
    assert_eq!(
        task_for(&dir, &matrix, "dist/node/shared.js").platform,
        Platform::Node
    );
}

#[tokio::test]
async fn package_json_passthrough_without_exports() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{"name":"pkg","version":"1.0.0","main":"./dist/index.js"}"#,
        ),
        ("src/index.ts", ""),
    ]);

    let matrix = matrix_for(&dir).await;
    let manifest = dir.path().join("package.json");
    assert_eq!(
        matrix.registry.get(&manifest, RegistrySlot::Default),
        Some(manifest.as_path())
    );
}

#[tokio::test]
async fn no_implicit_passthrough_with_exports() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{"name":"pkg","version":"1.0.0","exports":"./dist/index.js"}"#,
        ),
        ("src/index.ts", ""),
    ]);

    let matrix = matrix_for(&dir).await;
    assert!(matrix.registry.slots(&dir.path().join("package.json")).is_none());
}

#[tokio::test]
async fn non_output_files_are_passthrough() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{"name":"pkg","version":"1.0.0","exports":{"./styles/*":"./styles/*"}}"#,
        ),
        ("styles/base.css", ""),
        ("styles/theme/dark.css", ""),
    ]);

    let matrix = matrix_for(&dir).await;
    assert!(matrix.tasks.is_empty());
    let dark = dir.path().join("styles").join("theme").join("dark.css");
    assert!(matrix.registry.get(&dark, RegistrySlot::Default).is_some());
}

#[tokio::test]
async fn bin_entries_are_executable() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{"name":"pkg","version":"1.0.0","bin":{"pkg":"./dist/cli.js"}}"#,
        ),
        ("src/cli.ts", ""),
    ]);

    let matrix = matrix_for(&dir).await;
    assert!(task_for(&dir, &matrix, "dist/cli.js").executable);
}

#[tokio::test]
async fn bin_marks_existing_output_executable() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{"name":"pkg","version":"1.0.0","main":"./dist/cli.js","bin":"./dist/cli.js"}"#,
        ),
        ("src/cli.ts", ""),
    ]);

    let matrix = matrix_for(&dir).await;
    assert_eq!(matrix.tasks.len(), 1);
    assert!(matrix.tasks[0].executable);
}

#[tokio::test]
async fn shared_options_apply_to_every_task() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{
                "name": "pkg",
                "version": "1.0.0",
                "exports": {"import": "./dist/a.mjs", "require": "./dist/a.cjs"}
            }"#,
        ),
        (
            "tsconfig.json",
            r#"{"compilerOptions":{"target":"ES2022","sourceMap":true}}"#,
        ),
        ("src/a.ts", ""),
    ]);

    let options = MatrixOptions {
        minify: true,
        ..Default::default()
    };
    let matrix = build_matrix(&load(&dir), &options).await.unwrap();
    for task in &matrix.tasks {
        assert!(task.minify);
        assert!(task.sourcemap);
        assert_eq!(task.target, "es2022");
        assert!(task
            .define
            .contains(&("process.env.NODE_ENV".to_string(), "\"production\"".to_string())));
    }
}

#[tokio::test]
async fn resolving_twice_is_identical() {
    let dir = create_package(&[
        (
            "package.json",
            r#"{
                "name": "pkg",
                "version": "1.0.0",
                "exports": {".": "./dist/index.js", "./*": "./dist/*.js"}
            }"#,
        ),
        ("src/index.ts", ""),
        ("src/x.ts", ""),
    ]);

    let first = matrix_for(&dir).await;
    let second = matrix_for(&dir).await;
    assert_eq!(first.tasks, second.tasks);
    assert_eq!(first.registry, second.registry);
}

#[tokio::test]
async fn escaping_targets_are_rejected() {
    let dir = create_package(&[(
        "package.json",
        r#"{"name":"pkg","version":"1.0.0","exports":"../elsewhere/index.js"}"#,
    )]);

    let err = build_matrix(&load(&dir), &MatrixOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MatrixError::InvalidPattern { .. }));
}
