//! Shared test utilities for kiln-bundler tests
//!
//! Builds throwaway project trees in a temp directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use kiln_bundler::{BuildOptions, BuildOutput, Pipeline, Result};
use tempfile::TempDir;

pub const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
</head>
<body>
<div id="app"></div>
</body>
</html>
"#;

/// A project rooted in a temp directory, seeded with the entry document
/// template.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let project = Self {
            dir: TempDir::new().expect("temp dir"),
        };
        project.file("public/index.html", TEMPLATE);
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to the project-relative `path`, creating parents.
    pub fn file(&self, path: &str, contents: impl AsRef<[u8]>) -> &Self {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&full, contents).expect("write project file");
        self
    }

    pub fn build(&self) -> Result<BuildOutput> {
        self.build_with(BuildOptions::default())
    }

    pub fn build_with(&self, options: BuildOptions) -> Result<BuildOutput> {
        Pipeline::new(self.root(), options)?.run()
    }

    pub fn out(&self) -> PathBuf {
        self.dir.path().join("dist")
    }

    pub fn read_out(&self, filename: &str) -> String {
        fs::read_to_string(self.out().join(filename))
            .unwrap_or_else(|e| panic!("read dist/{filename}: {e}"))
    }

    pub fn out_exists(&self, filename: &str) -> bool {
        self.out().join(filename).exists()
    }

    /// Every file under `dist/`, relative and `/` separated, sorted.
    pub fn out_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        collect(&self.out(), &self.out(), &mut files);
        files.sort();
        files
    }
}

fn collect(base: &Path, dir: &Path, files: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries {
        let path = entry.expect("dir entry").path();
        if path.is_dir() {
            collect(base, &path, files);
        } else {
            let rel = path.strip_prefix(base).expect("under base");
            files.push(
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/"),
            );
        }
    }
}

/// The libs/commons project: one dependency, a component imported from
/// three places, an image and a stylesheet.
pub fn libs_commons_project() -> Project {
    let project = Project::new();
    project
        .file(
            "src/main.js",
            r#"import Vue from 'vue';
import Button from './components/Button.vue';
import { pageA } from './a.js';
import { pageB } from './b.js';
import logo from './assets/logo.png';
import './styles/app.css';

export function boot() {
  return [Vue.version, Button.name, pageA(), pageB(), logo];
}
"#,
        )
        .file(
            "src/a.js",
            r#"import Button from './components/Button.vue';

export function pageA() {
  return Button.name + ':a';
}
"#,
        )
        .file(
            "src/b.js",
            r#"import Button from '@/components/Button.vue';

export function pageB() {
  return Button.name + ':b';
}
"#,
        )
        .file(
            "src/components/Button.vue",
            r#"<template>
  <button class="btn"><slot /></button>
</template>

<script>
export default {
  name: 'KButton'
};
</script>

<style scoped>
.btn { color: red; }
</style>
"#,
        )
        .file("src/assets/logo.png", b"\x89PNG fake image bytes")
        .file(
            "src/styles/app.css",
            "body { background: url('../assets/logo.png'); }\n",
        )
        .file(
            "node_modules/vue/package.json",
            r#"{ "name": "vue", "main": "dist/vue.js" }"#,
        )
        .file(
            "node_modules/vue/dist/vue.js",
            "module.exports = { version: '2.7.0' };\n",
        );
    project
}
