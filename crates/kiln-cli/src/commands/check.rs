//! `kiln check`
//!
//! Validates configuration without building and prints what a build would
//! use: the role table and the chunk rules in evaluation order.

use std::fmt::Write as _;

use kiln_config::{
    BuildOptions, ChunkRuleConfig, ChunkScope, ChunkTest, PathRegistry, PathRole, validate_fs,
};

use crate::cli::{CheckArgs, GlobalArgs};
use crate::commands::utils;
use crate::config::{self, ConfigArgs, Overrides};
use crate::error::Result;
use crate::{logger, ui};

/// Execute the check command.
///
/// # Errors
///
/// Schema violations, a missing entry or template, and role directories
/// outside the project root.
pub fn execute(args: CheckArgs, global: &GlobalArgs) -> Result<()> {
    let root = utils::project_root(args.root.as_deref())?;
    let loaded = config::load(
        &root,
        &ConfigArgs {
            config: args.config,
            profile: args.profile,
        },
        &Overrides::default(),
    )?;
    logger::init_logger(
        global.verbose,
        global.quiet,
        global.no_color,
        loaded.settings.log_level.as_deref(),
    );

    if !global.quiet {
        match &loaded.source {
            Some(source) => ui::info(&format!(
                "Checking {}",
                utils::display_under(source, &loaded.root)
            )),
            None => ui::warning("No kiln.toml found, checking defaults"),
        }
    }

    validate_fs(&loaded.build, &loaded.root)?;
    let registry = PathRegistry::new(&loaded.root, &loaded.build.paths)?;

    if !global.quiet {
        print!("{}", render_report(&registry, &loaded.build));
        ui::success("Configuration is valid");
    }
    Ok(())
}

/// The role table followed by the chunk rules in evaluation order.
pub fn render_report(registry: &PathRegistry, options: &BuildOptions) -> String {
    let mut out = String::from("Roles\n");

    let mut roles: Vec<(&str, String)> = PathRole::ALL
        .iter()
        .map(|&role| (role.key(), registry.display_relative(registry.resolve(role))))
        .collect();
    roles.push((
        "dependencies",
        registry.display_relative(registry.dependency_root()),
    ));
    let width = roles.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    for (key, dir) in &roles {
        let _ = writeln!(out, "  {key:<width$}  {dir}");
    }

    out.push_str("\nChunk rules (evaluation order)\n");
    let rules = options.rules_in_evaluation_order();
    if rules.is_empty() {
        out.push_str("  (none)\n");
    }
    let name_width = rules.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let test_width = rules.iter().map(|r| describe_test(&r.test).len()).max().unwrap_or(0);
    for (index, rule) in rules.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {:<name_width$}  {:<test_width$}  priority {:<3}  {:<7}  min {}",
            index + 1,
            rule.name,
            describe_test(&rule.test),
            rule.priority,
            describe_scope(rule),
            rule.min_chunks,
        );
    }

    let _ = writeln!(
        out,
        "\nRuntime chunk: {}\nLazy chunks: {}",
        yes_no(options.chunks.runtime_chunk),
        yes_no(options.chunks.lazy_chunks)
    );
    out
}

fn describe_test(test: &ChunkTest) -> String {
    match test {
        ChunkTest::Dependencies => "dependencies".to_string(),
        ChunkTest::Role(role) => format!("role:{role}"),
        ChunkTest::Regex(pattern) => format!("regex:/{pattern}/"),
    }
}

fn describe_scope(rule: &ChunkRuleConfig) -> &'static str {
    match rule.scope {
        ChunkScope::Initial => "initial",
        ChunkScope::Async => "async",
        ChunkScope::All => "all",
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
