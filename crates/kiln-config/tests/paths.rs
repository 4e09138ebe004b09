//! Path registry built from loaded configuration.

use kiln_config::{ConfigError, KilnConfig, PathRegistry, PathRole};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn overrides_are_composed_under_root() {
    let dir = TempDir::new().unwrap();
    let config = KilnConfig::from_value(json!({
        "build": { "paths": { "build": "public_html", "icons": "assets/./icons" } }
    }))
    .unwrap();

    let registry = PathRegistry::new(dir.path(), &config.build.paths).unwrap();
    assert_eq!(registry.resolve(PathRole::Build), dir.path().join("public_html"));
    assert_eq!(registry.resolve(PathRole::Icons), dir.path().join("assets/icons"));
    assert_eq!(registry.lookup("static").unwrap(), dir.path().join("static"));
}

#[test]
fn escaping_override_fails_construction() {
    let dir = TempDir::new().unwrap();
    let config = KilnConfig::from_value(json!({
        "build": { "paths": { "public": "src/../../elsewhere" } }
    }))
    .unwrap();

    let err = PathRegistry::new(dir.path(), &config.build.paths).unwrap_err();
    assert!(matches!(err, ConfigError::RoleOutsideProject { role, .. } if role == "public"));
}

#[test]
fn relative_strips_root() {
    let dir = TempDir::new().unwrap();
    let registry = PathRegistry::new(dir.path(), &Default::default()).unwrap();
    let file = registry.resolve(PathRole::Source).join("main.js");
    assert_eq!(registry.relative(&file).unwrap(), std::path::Path::new("src/main.js"));
    assert!(registry.relative(std::path::Path::new("/elsewhere/x.js")).is_none());
}

#[test]
fn build_dir_over_sources_fails_construction() {
    let dir = TempDir::new().unwrap();
    for build in [".", "src", "static", "node_modules"] {
        let config = KilnConfig::from_value(json!({
            "build": { "paths": { "build": build } }
        }))
        .unwrap();

        let err = PathRegistry::new(dir.path(), &config.build.paths).unwrap_err();
        assert!(matches!(err, ConfigError::BuildDirOverlap { .. }), "{build}: {err}");
    }
}
