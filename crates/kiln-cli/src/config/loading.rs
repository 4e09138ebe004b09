use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Serialized};
use kiln_bundler::LogLevel;
use kiln_config::{ConfigDiscovery, KilnConfig, load_file};
use serde_json::Value;

use super::{ConfigArgs, LoadedConfig, Overrides};
use crate::commands::utils::resolve_path;
use crate::error::{CliError, Result};

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "KILN_";

/// Load the effective configuration for the project at `root`.
///
/// # Errors
///
/// - `--config` names a file that does not exist
/// - `--profile` names a profile the file does not define
/// - the file, an environment override or `settings.log_level` is malformed
pub fn load(root: &Path, args: &ConfigArgs, overrides: &Overrides) -> Result<LoadedConfig> {
    let source = match &args.config {
        Some(path) => {
            let path = resolve_path(path, &std::env::current_dir()?);
            if !path.is_file() {
                return Err(CliError::ConfigFileNotFound(path));
            }
            Some(path)
        }
        None => ConfigDiscovery::new(root).find(),
    };

    let file = match &source {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_file(path)?
        }
        None => {
            tracing::debug!(root = %root.display(), "no config file, using defaults");
            KilnConfig::default()
        }
    };

    if let Some(name) = &args.profile {
        if !file.profiles.contains_key(name) {
            let mut available: Vec<String> = file.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: name.clone(),
                available,
            });
        }
    }
    let file = file.materialize_profile(args.profile.as_deref())?;

    let value: Value = layered(file.to_value()?, overrides).extract()?;
    let config = KilnConfig::from_value(value)?;

    if let Some(level) = &config.settings.log_level {
        level
            .parse::<LogLevel>()
            .map_err(|message| CliError::InvalidArgument(format!("settings.log_level: {message}")))?;
    }

    Ok(LoadedConfig::new(
        root.to_path_buf(),
        source,
        args.profile.clone(),
        config,
    ))
}

fn layered(file: Value, overrides: &Overrides) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(file))
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["log"]).split("__"));

    if let Some(entry) = &overrides.entry {
        figment = figment.merge(Serialized::default("build.entry", entry));
    }
    if let Some(out_dir) = &overrides.out_dir {
        figment = figment.merge(Serialized::default("build.paths.build", out_dir));
    }
    if let Some(jobs) = overrides.jobs {
        figment = figment.merge(Serialized::default("settings.parallel_jobs", jobs));
    }
    figment
}
