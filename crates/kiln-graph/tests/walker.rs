//! Graph walking over small projects.

mod common;

use common::{create_test_project, fixture};
use kiln_config::BuildOptions;
use kiln_graph::{AssetKind, Error, GraphWalker, ImportKind, ModuleId, ResolveError};
use tempfile::TempDir;

#[test]
fn walks_scripts_components_and_styles() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[
            (
                "src/main.js",
                "import App from './App.vue';\nimport './styles/main.css';\nnew App();\n",
            ),
            (
                "src/App.vue",
                "<template><div/></template>\n<script>\nimport Nav from '@/components/Nav.vue';\nexport default { components: { Nav } };\n</script>\n<style>.a { background: url(./img/bg.png); }</style>\n",
            ),
            ("src/components/Nav.vue", "<template><nav/></template>\n"),
            ("src/styles/main.css", "@import 'base.css';\n"),
            ("src/styles/base.css", "body { margin: 0; }\n"),
            ("src/img/bg.png", "PNG"),
        ],
    );
    let fx = fixture(&root, &BuildOptions::default());

    let graph = GraphWalker::new(&fx.resolver, &fx.scanner)
        .walk(&root.join("src/main.js"))
        .unwrap();

    let ids: Vec<&str> = graph.modules().map(|m| m.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "src/main.js",
            "src/App.vue",
            "src/styles/main.css",
            "src/components/Nav.vue",
            "src/img/bg.png",
            "src/styles/base.css",
        ]
    );
    assert_eq!(graph.entry(), Some(&ModuleId::from("src/main.js")));
    let bg = graph.get(&"src/img/bg.png".into()).unwrap();
    assert_eq!(bg.kind, AssetKind::RasterImage);
    assert_eq!(bg.size, 3);
}

#[test]
fn dynamic_imports_are_recorded_as_lazy_roots() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[
            ("src/main.js", "const load = () => import('./views/About.js');\n"),
            ("src/views/About.js", "export default 'about';\n"),
        ],
    );
    let fx = fixture(&root, &BuildOptions::default());

    let graph = GraphWalker::new(&fx.resolver, &fx.scanner)
        .walk(&root.join("src/main.js"))
        .unwrap();
    assert_eq!(graph.lazy_roots(), vec![ModuleId::from("src/views/About.js")]);
    let edge = graph.dependencies(&"src/main.js".into()).next().unwrap();
    assert_eq!(edge.kind, ImportKind::Dynamic);
}

#[test]
fn provided_module_becomes_edge() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[
            ("src/main.js", "console.log(process.env.MODE);\n"),
            ("node_modules/process/browser.js", "var process = module.exports = {};\n"),
        ],
    );
    let fx = fixture(&root, &BuildOptions::default());

    let graph = GraphWalker::new(&fx.resolver, &fx.scanner)
        .walk(&root.join("src/main.js"))
        .unwrap();
    let provided = graph.get(&"node_modules/process/browser.js".into()).unwrap();
    assert!(provided.is_dependency);
    let edge = graph.dependencies(&"src/main.js".into()).next().unwrap();
    assert_eq!(edge.kind, ImportKind::Provided);
}

#[test]
fn missing_provided_module_is_skipped() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(&temp, &[("src/main.js", "process.exit();\n")]);
    let fx = fixture(&root, &BuildOptions::default());

    let graph = GraphWalker::new(&fx.resolver, &fx.scanner)
        .walk(&root.join("src/main.js"))
        .unwrap();
    assert_eq!(graph.len(), 1);
}

#[test]
fn missing_import_aborts_walk() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(&temp, &[("src/main.js", "import x from './nope';\n")]);
    let fx = fixture(&root, &BuildOptions::default());

    let err = GraphWalker::new(&fx.resolver, &fx.scanner)
        .walk(&root.join("src/main.js"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Resolve(ResolveError::ModuleNotFound { ref specifier, .. }) if specifier == "./nope"
    ));
    assert_eq!(err.path(), Some(root.join("src/main.js").as_path()));
}

#[test]
fn cycles_terminate() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[
            ("src/main.js", "import './a.js';\n"),
            ("src/a.js", "import './b.js';\n"),
            ("src/b.js", "import './a.js';\nimport './main.js';\n"),
        ],
    );
    let fx = fixture(&root, &BuildOptions::default());

    let graph = GraphWalker::new(&fx.resolver, &fx.scanner)
        .walk(&root.join("src/main.js"))
        .unwrap();
    assert_eq!(graph.len(), 3);
    assert_eq!(graph.reuse_count(&"src/a.js".into()), 2);
}
