//! # kiln-graph
//!
//! Everything between a file on disk and a node in the module graph:
//!
//! - [`Classifier`]: file → [`AssetKind`] through an ordered pattern table
//! - [`ModuleResolver`]: import specifier → file, with a recorded search trail
//! - [`ImportScanner`] and [`split_component`]: references inside sources
//! - [`GraphWalker`]: breadth-first closure from the entry into a [`ModuleGraph`]
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kiln_config::{BuildOptions, PathRegistry};
//! use kiln_graph::{Classifier, GraphWalker, ImportScanner, ModuleResolver};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = BuildOptions::default();
//! let registry = Arc::new(PathRegistry::new(".", &options.paths)?);
//! let classifier = Arc::new(Classifier::new(registry.clone())?);
//! let resolver = ModuleResolver::new(registry.clone(), classifier, &options.resolve);
//! let scanner = ImportScanner::new(&options.provide)?;
//!
//! let entry = registry.project_file("entry", &options.entry)?;
//! let graph = GraphWalker::new(&resolver, &scanner).walk(&entry)?;
//! println!("{} modules", graph.len());
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod classify;
pub mod component;
pub mod error;
pub mod graph;
pub mod imports;
pub mod resolve;
pub mod walker;

pub use asset::{AssetKind, AssetReference, content_type};
pub use classify::{ClassRule, Classifier};
pub use component::{Block, ComponentParts, split_component};
pub use error::{Error, ResolveError, Result, ScanError};
pub use graph::{Dependency, Module, ModuleGraph, ModuleId};
pub use imports::{ImportKind, ImportRecord, ImportScanner, strip_comments};
pub use resolve::{Matched, ModuleResolver, ResolvedModule, SearchStep, Strategy};
pub use walker::GraphWalker;
