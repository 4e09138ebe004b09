//! Graph walker.
//!
//! Breadth-first traversal from the single entry: read each module, scan its
//! references, resolve them and enqueue whatever is new.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::asset::AssetKind;
use crate::component::split_component;
use crate::error::{Error, Result};
use crate::graph::{Dependency, Module, ModuleGraph, ModuleId};
use crate::imports::{ImportKind, ImportRecord, ImportScanner};
use crate::resolve::ModuleResolver;

pub struct GraphWalker<'a> {
    resolver: &'a ModuleResolver,
    scanner: &'a ImportScanner,
}

impl<'a> GraphWalker<'a> {
    pub fn new(resolver: &'a ModuleResolver, scanner: &'a ImportScanner) -> Self {
        Self { resolver, scanner }
    }

    /// Walk the closure of `entry`.
    ///
    /// # Errors
    ///
    /// The first unresolvable reference aborts the walk. Provided modules
    /// that cannot be resolved are skipped with a warning instead.
    pub fn walk(&self, entry: &Path) -> Result<ModuleGraph> {
        let registry = self.resolver.registry();
        if !registry.is_within_project(entry) {
            return Err(Error::EntryOutsideProject {
                path: entry.to_path_buf(),
            });
        }

        let mut graph = ModuleGraph::new();
        let mut queue: VecDeque<(ModuleId, PathBuf, AssetKind)> = VecDeque::new();

        let entry_path = entry.to_path_buf();
        let entry_id = ModuleId::new(registry.display_relative(&entry_path));
        let kind = self.resolver.classifier().classify(&entry_path);
        graph.add_module(self.module(&entry_id, &entry_path, kind)?);
        graph.set_entry(entry_id.clone());
        queue.push_back((entry_id, entry_path, kind));

        while let Some((id, path, kind)) = queue.pop_front() {
            let records = self.scan(&path, kind)?;

            for record in records {
                let specifier = self.normalize(&record);
                let resolved = match self.resolver.resolve(&path, &specifier) {
                    Ok(resolved) => resolved,
                    Err(err) if record.kind == ImportKind::Provided => {
                        tracing::warn!(
                            module = %id,
                            specifier = %record.specifier,
                            "provided module not found, skipping: {err}"
                        );
                        continue;
                    }
                    Err(err) => return Err(err.into()),
                };

                let target_path = resolved.path().to_path_buf();
                let target = ModuleId::new(registry.display_relative(&target_path));
                if target == id {
                    continue;
                }

                if !graph.contains(&target) {
                    let target_kind = resolved.asset.kind;
                    graph.add_module(self.module(&target, &target_path, target_kind)?);
                    queue.push_back((target.clone(), target_path, target_kind));
                }

                graph.add_dependency(
                    &id,
                    Dependency {
                        specifier: record.specifier,
                        target,
                        kind: record.kind,
                    },
                );
            }
        }

        tracing::debug!(modules = graph.len(), "module graph complete");
        Ok(graph)
    }

    fn module(&self, id: &ModuleId, path: &Path, kind: AssetKind) -> Result<Module> {
        let size = fs::metadata(path)
            .map_err(|source| Error::Read {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let is_dependency = self.resolver.registry().is_dependency(path);
        Ok(Module::new(id.clone(), path, kind)
            .dependency(is_dependency)
            .with_size(size))
    }

    fn scan(&self, path: &Path, kind: AssetKind) -> Result<Vec<ImportRecord>> {
        if !kind.is_scannable() {
            return Ok(Vec::new());
        }

        let source = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(match kind {
            AssetKind::Script => self.scanner.scan_script(&source),
            AssetKind::Stylesheet => self.scanner.scan_stylesheet(&source),
            AssetKind::Component => {
                let parts = split_component(&source).map_err(|source| Error::Scan {
                    path: path.to_path_buf(),
                    source,
                })?;
                let mut records = parts
                    .script
                    .map(|block| self.scanner.scan_script(block.content))
                    .unwrap_or_default();
                for style in &parts.styles {
                    records.extend(self.scanner.scan_stylesheet(style.content));
                }
                records
            }
            _ => Vec::new(),
        })
    }

    /// Stylesheet references are relative unless they say otherwise; `~`
    /// marks a module request.
    fn normalize(&self, record: &ImportRecord) -> String {
        let spec = record.specifier.as_str();
        if record.kind != ImportKind::StyleUrl {
            return spec.to_string();
        }
        if let Some(module) = spec.strip_prefix('~') {
            return module.to_string();
        }
        if spec.starts_with('.') || spec.starts_with('/') || self.resolver.is_aliased(spec) {
            return spec.to_string();
        }
        format!("./{spec}")
    }
}
