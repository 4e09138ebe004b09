//! Module resolution against real directory trees.

mod common;

use common::{create_test_project, fixture};
use kiln_config::{BuildOptions, PathRole, SearchRoot};
use kiln_graph::{AssetKind, Matched, ResolveError, Strategy};
use tempfile::TempDir;

#[test]
fn relative_with_extension_order() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[
            ("src/main.js", ""),
            ("src/util.js", "export const a = 1;"),
            ("src/util.ts", "export const a = 2;"),
        ],
    );
    let fx = fixture(&root, &BuildOptions::default());

    let resolved = fx.resolver.resolve(&root.join("src/main.js"), "./util").unwrap();
    assert_eq!(resolved.path(), root.join("src/util.js"));
    assert_eq!(resolved.matched, Matched::Extension(".js".into()));
    assert_eq!(resolved.asset.kind, AssetKind::Script);
    assert_eq!(resolved.trail.len(), 1);
    assert_eq!(resolved.trail[0].strategy, Strategy::Relative);
}

#[test]
fn exact_file_beats_extensions() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[("src/main.js", ""), ("src/data", "raw"), ("src/data.js", "")],
    );
    let fx = fixture(&root, &BuildOptions::default());

    let resolved = fx.resolver.resolve(&root.join("src/main.js"), "./data").unwrap();
    assert_eq!(resolved.path(), root.join("src/data"));
    assert_eq!(resolved.matched, Matched::Exact);
}

#[test]
fn alias_resolves_under_role() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[
            ("src/main.js", ""),
            ("src/components/Nav.vue", "<template><nav/></template>"),
        ],
    );
    let fx = fixture(&root, &BuildOptions::default());

    let resolved = fx
        .resolver
        .resolve(&root.join("src/main.js"), "@/components/Nav")
        .unwrap();
    assert_eq!(resolved.path(), root.join("src/components/Nav.vue"));
    assert_eq!(resolved.asset.kind, AssetKind::Component);
    assert!(matches!(
        &resolved.trail[0].strategy,
        Strategy::Alias { token, role: PathRole::Source } if token == "@"
    ));
}

#[test]
fn longest_alias_token_wins() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[("src/main.js", ""), ("src/components/Card.vue", "<template/>")],
    );
    let options = BuildOptions::default().with_alias("@c", PathRole::Components);
    let fx = fixture(&root, &options);

    let resolved = fx.resolver.resolve(&root.join("src/main.js"), "@c/Card").unwrap();
    assert_eq!(resolved.path(), root.join("src/components/Card.vue"));
}

#[test]
fn alias_token_needs_separator() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[
            ("src/main.js", ""),
            ("node_modules/@scope/pkg/index.js", ""),
        ],
    );
    let fx = fixture(&root, &BuildOptions::default());

    // "@scope" starts with "@" but not "@/", so it is a bare specifier
    let resolved = fx.resolver.resolve(&root.join("src/main.js"), "@scope/pkg").unwrap();
    assert_eq!(resolved.path(), root.join("node_modules/@scope/pkg/index.js"));
    assert_eq!(resolved.matched, Matched::Index(".js".into()));
}

#[test]
fn source_root_searched_before_dependencies() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[
            ("src/main.js", ""),
            ("src/store.js", "// local"),
            ("node_modules/store/index.js", "// package"),
        ],
    );
    let fx = fixture(&root, &BuildOptions::default());

    let resolved = fx.resolver.resolve(&root.join("src/main.js"), "store").unwrap();
    assert_eq!(resolved.path(), root.join("src/store.js"));
}

#[test]
fn package_module_field_preferred_over_main() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[
            ("src/main.js", ""),
            (
                "node_modules/vue/package.json",
                r#"{ "main": "dist/vue.cjs.js", "module": "dist/vue.esm.js" }"#,
            ),
            ("node_modules/vue/dist/vue.cjs.js", ""),
            ("node_modules/vue/dist/vue.esm.js", ""),
        ],
    );
    let fx = fixture(&root, &BuildOptions::default());

    let resolved = fx.resolver.resolve(&root.join("src/main.js"), "vue").unwrap();
    assert_eq!(resolved.path(), root.join("node_modules/vue/dist/vue.esm.js"));
    assert_eq!(resolved.matched, Matched::PackageField("module".into()));
    assert_eq!(resolved.trail.len(), 2);
}

#[test]
fn not_found_lists_searched_locations() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(&temp, &[("src/main.js", "")]);
    let fx = fixture(&root, &BuildOptions::default());

    let err = fx.resolver.resolve(&root.join("src/main.js"), "missing").unwrap_err();
    match err {
        ResolveError::ModuleNotFound {
            specifier,
            from,
            searched,
        } => {
            assert_eq!(specifier, "missing");
            assert_eq!(from, root.join("src/main.js"));
            assert_eq!(searched, vec![root.join("src/missing"), root.join("node_modules/missing")]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn relative_escape_is_rejected() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(&temp, &[("src/main.js", "")]);
    let fx = fixture(&root, &BuildOptions::default());

    let err = fx
        .resolver
        .resolve(&root.join("src/main.js"), "../../../etc/passwd")
        .unwrap_err();
    assert!(matches!(err, ResolveError::OutsideProject { .. }));
}

#[test]
fn custom_root_order() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[
            ("src/main.js", ""),
            ("src/store.js", ""),
            ("node_modules/store.js", ""),
        ],
    );
    let mut options = BuildOptions::default();
    options.resolve.roots = vec![SearchRoot::Dependencies, SearchRoot::Role(PathRole::Source)];
    let fx = fixture(&root, &options);

    let resolved = fx.resolver.resolve(&root.join("src/main.js"), "store").unwrap();
    assert_eq!(resolved.path(), root.join("node_modules/store.js"));
}

#[test]
fn resolution_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[("src/main.js", ""), ("src/lib/index.ts", "")],
    );
    let fx = fixture(&root, &BuildOptions::default());

    let from = root.join("src/main.js");
    let first = fx.resolver.resolve(&from, "./lib").unwrap();
    let second = fx.resolver.resolve(&from, "./lib").unwrap();
    assert_eq!(first, second);
    assert_eq!(first.matched, Matched::Index(".ts".into()));
}
