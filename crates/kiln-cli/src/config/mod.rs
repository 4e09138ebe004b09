//! Configuration loading for CLI commands.
//!
//! Layers, lowest to highest:
//!
//! 1. serde defaults of [`KilnConfig`]
//! 2. the config file (`kiln.toml`, or the `kiln` field of `package.json`),
//!    with the selected profile merged in
//! 3. `KILN_*` environment variables, `__` separating nested keys
//!    (`KILN_BUILD__OUTPUT__PUBLIC_PATH=/cdn/`)
//! 4. command-line flags

mod loading;

use std::path::PathBuf;

use kiln_config::{BuildOptions, GlobalSettings, KilnConfig};

pub use loading::{ENV_PREFIX, load};

/// Where the config comes from.
#[derive(Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Explicit config file; discovered under the root when `None`
    pub config: Option<PathBuf>,
    pub profile: Option<String>,
}

/// Command-line values that override every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub entry: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
}

/// Result of loading: the effective options and where they came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub root: PathBuf,
    /// Config file that was read, if any
    pub source: Option<PathBuf>,
    pub profile: Option<String>,
    pub build: BuildOptions,
    pub settings: GlobalSettings,
}

impl LoadedConfig {
    fn new(root: PathBuf, source: Option<PathBuf>, profile: Option<String>, config: KilnConfig) -> Self {
        Self {
            root,
            source,
            profile,
            build: config.build,
            settings: config.settings,
        }
    }
}
