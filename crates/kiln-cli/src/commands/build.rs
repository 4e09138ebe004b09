//! `kiln build`

use kiln_bundler::{BuildOutput, Pipeline};

use crate::cli::{BuildArgs, GlobalArgs};
use crate::commands::utils;
use crate::config::{self, ConfigArgs, LoadedConfig, Overrides};
use crate::error::Result;
use crate::{logger, ui};

/// Execute the build command.
///
/// 1. Load configuration (defaults < config file < `KILN_*` env < flags)
/// 2. Run the pipeline: clean, classify, lint, resolve, transform,
///    partition, emit
/// 3. Print the summary table
///
/// # Errors
///
/// Configuration errors and the first failing pipeline stage's error.
pub fn execute(args: BuildArgs, global: &GlobalArgs) -> Result<()> {
    let root = utils::project_root(args.root.as_deref())?;
    let loaded = config::load(
        &root,
        &ConfigArgs {
            config: args.config,
            profile: args.profile,
        },
        &Overrides {
            entry: args.entry,
            out_dir: args.out_dir,
            jobs: args.jobs.map(usize::from),
        },
    )?;
    logger::init_logger(
        global.verbose,
        global.quiet,
        global.no_color,
        loaded.settings.log_level.as_deref(),
    );

    let output = build(&loaded, global.quiet)?;

    if !global.quiet {
        ui::print_build_summary(&output);
        if !output.lint.is_empty() {
            ui::warning(&format!(
                "{} lint finding(s); run with --verbose for details",
                output.lint.len()
            ));
        }
        ui::success(&format!(
            "Built {} chunk(s) into {} in {}",
            output.chunks.len(),
            utils::display_under(&output.output_dir, &loaded.root),
            ui::format_duration(output.duration)
        ));
    }
    Ok(())
}

/// Run the pipeline for already loaded configuration.
pub fn build(loaded: &LoadedConfig, quiet: bool) -> Result<BuildOutput> {
    if !quiet {
        describe(loaded);
    }

    let spinner = ui::Spinner::new("Building", quiet);
    let result = Pipeline::new(&loaded.root, loaded.build.clone())
        .and_then(|pipeline| pipeline.with_settings(loaded.settings.clone()).run());
    spinner.finish();
    Ok(result?)
}

fn describe(loaded: &LoadedConfig) {
    match &loaded.source {
        Some(source) => ui::info(&format!(
            "Using {}",
            utils::display_under(source, &loaded.root)
        )),
        None => ui::info("No kiln.toml found, using defaults"),
    }
    if let Some(profile) = &loaded.profile {
        ui::info(&format!("Profile: {profile}"));
    }
    ui::info(&format!("Entry: {}", loaded.build.entry.display()));
}
