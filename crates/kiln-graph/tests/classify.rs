//! Inventory classification over a real tree.

mod common;

use common::create_test_project;
use kiln_config::{PathRegistry, PathsConfig};
use kiln_graph::{AssetKind, Classifier};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn same_svg_bytes_classify_by_location() {
    let temp = TempDir::new().unwrap();
    let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\"><path d=\"M0 0\"/></svg>";
    let root = create_test_project(
        &temp,
        &[("src/icons/arrow.svg", svg), ("src/img/arrow.svg", svg)],
    );
    let registry = Arc::new(PathRegistry::new(&root, &PathsConfig::default()).unwrap());
    let classifier = Classifier::new(registry).unwrap();

    assert_eq!(
        classifier.classify(&root.join("src/icons/arrow.svg")),
        AssetKind::VectorIcon
    );
    assert_eq!(
        classifier.classify(&root.join("src/img/arrow.svg")),
        AssetKind::Unclassified
    );
}

#[test]
fn icon_inventory_is_sorted_and_filtered() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(
        &temp,
        &[
            ("src/icons/zoom.svg", "<svg/>"),
            ("src/icons/nav/arrow.svg", "<svg/>"),
            ("src/icons/README.md", "icons"),
            ("src/main.js", ""),
        ],
    );
    let registry = Arc::new(PathRegistry::new(&root, &PathsConfig::default()).unwrap());
    let classifier = Classifier::new(registry).unwrap();

    let icons = classifier.icons().unwrap();
    let names: Vec<_> = icons.iter().map(|r| r.stem()).collect();
    assert_eq!(names, vec!["arrow", "zoom"]);
}

#[test]
fn missing_directory_is_empty_inventory() {
    let temp = TempDir::new().unwrap();
    let root = create_test_project(&temp, &[]);
    let registry = Arc::new(PathRegistry::new(&root, &PathsConfig::default()).unwrap());
    let classifier = Classifier::new(registry).unwrap();
    assert!(classifier.icons().unwrap().is_empty());
}
