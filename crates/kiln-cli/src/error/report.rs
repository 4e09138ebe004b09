//! Conversion from CLI errors to miette reports.

use kiln_config::ConfigError;
use miette::{Report, miette};

use super::CliError;

/// Convert a [`CliError`] into a report, attaching a hint where one helps.
///
/// Build errors already implement `miette::Diagnostic` and keep their code
/// and help text.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(err) => Report::new(err),
        CliError::Config(err) => config_error_to_miette(err),
        CliError::ConfigFileNotFound(ref path) => miette!(
            code = "kiln::config_file_not_found",
            help = "Pass an existing file to --config, or drop the flag to use kiln.toml.",
            "config file not found: {}",
            path.display()
        ),
        CliError::ProfileNotFound { ref name, ref available } => {
            let help = if available.is_empty() {
                "The config defines no profiles. Add a [profiles.<name>] table.".to_string()
            } else {
                format!("Available profiles: {}", available.join(", "))
            };
            miette!(
                code = "kiln::profile_not_found",
                help = help,
                "profile '{}' is not defined",
                name
            )
        }
        CliError::Layering(ref inner) => miette!(
            code = "kiln::config_override",
            help = "Check KILN_* environment variables, e.g. KILN_BUILD__TITLE=Shop.",
            "failed to merge configuration overrides: {}",
            inner
        ),
        other => miette!("{}", other),
    }
}

fn config_error_to_miette(err: ConfigError) -> Report {
    let help = match &err {
        ConfigError::NotFound => Some("Create a kiln.toml in the project root.".to_string()),
        ConfigError::EntryNotFound { .. } => {
            Some("Set build.entry in kiln.toml or pass --entry.".to_string())
        }
        ConfigError::FileNotFound { field, .. } => {
            Some(format!("Set build.{field} to an existing file."))
        }
        ConfigError::UnknownRole { .. } => {
            Some("Valid roles are src, build, public, static, icons and components.".to_string())
        }
        ConfigError::BuildDirOverlap { .. } => Some(
            "The build directory is emptied before every build; pass --out-dir dist or set build.paths.build.".to_string(),
        ),
        ConfigError::SchemaValidation { hint, .. } => hint.clone(),
        ConfigError::InvalidValue { .. } | ConfigError::InvalidProfileOverride { .. } => {
            Some("Check kiln.toml for typos and value types.".to_string())
        }
        _ => None,
    };
    match help {
        Some(help) => miette!(code = "kiln::config", help = help, "{}", err),
        None => miette!(code = "kiln::config", "{}", err),
    }
}
