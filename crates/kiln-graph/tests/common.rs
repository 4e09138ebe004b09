//! Shared helpers for building throwaway projects.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_config::{BuildOptions, PathRegistry};
use kiln_graph::{Classifier, ImportScanner, ModuleResolver};
use tempfile::TempDir;

/// Write `files` under a fresh temp dir and return its canonical root.
pub fn create_test_project(temp: &TempDir, files: &[(&str, &str)]) -> PathBuf {
    let root = temp.path().canonicalize().unwrap();
    for (rel, content) in files {
        write(&root, rel, content);
    }
    root
}

pub fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub struct Fixture {
    pub registry: Arc<PathRegistry>,
    pub resolver: ModuleResolver,
    pub scanner: ImportScanner,
}

pub fn fixture(root: &Path, options: &BuildOptions) -> Fixture {
    let registry = Arc::new(PathRegistry::new(root, &options.paths).unwrap());
    let classifier = Arc::new(Classifier::new(registry.clone()).unwrap());
    let resolver = ModuleResolver::new(registry.clone(), classifier, &options.resolve);
    let scanner = ImportScanner::new(&options.provide).unwrap();
    Fixture {
        registry,
        resolver,
        scanner,
    }
}
