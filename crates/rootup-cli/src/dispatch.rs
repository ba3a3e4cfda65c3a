use std::path::PathBuf;

use anyhow::{anyhow, Result};
use rootup_core::{ProductNaming, ResolutionContext, Reporter};
use rootup_registry::{
    read_installed_product, InstalledProduct, TargetResolver, TemplateIndex, TemplateSource,
};
use rootup_updater::{read_manifest, RootUpdater};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::{load_project_config, ProjectConfig};
use crate::render::{
    current_output_style, format_change_set_lines, format_descriptor_lines, ConsoleReporter,
    OutputStyle,
};
use crate::{Cli, Commands, ResolveArgs};

pub(crate) fn run_cli(cli: Cli) -> Result<()> {
    init_tracing(cli.verbose);

    let project_dir = cli.project_dir.unwrap_or_else(|| PathBuf::from("."));
    let config = load_project_config(&project_dir, cli.config.as_deref())?;
    debug!(
        manifest = %config.manifest.display(),
        templates = %config.templates.display(),
        "loaded project config"
    );
    let style = current_output_style(cli.plain);
    let reporter = ConsoleReporter::new(style, cli.verbose > 0);

    match cli.command {
        Commands::Update { resolve, dry_run } => {
            let outcome = run_update_command(&config, &resolve, !dry_run, style, &reporter)?;
            reporter.print_lines(&outcome.change_lines);
            if outcome.pending && !outcome.written {
                println!("dry run: {} was not modified", config.manifest.display());
            }
        }
        Commands::Diff { resolve } => {
            let outcome = run_update_command(&config, &resolve, false, style, &reporter)?;
            if outcome.pending {
                reporter.print_lines(&outcome.change_lines);
            } else {
                println!("No root manifest changes");
            }
        }
        Commands::Show { resolve } => {
            let lines = run_show_command(&config, &resolve)?;
            reporter.print_lines(&lines);
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct UpdateOutcome {
    pub pending: bool,
    pub written: bool,
    pub change_lines: Vec<String>,
}

pub(crate) fn run_update_command(
    config: &ProjectConfig,
    resolve: &ResolveArgs,
    write: bool,
    style: OutputStyle,
    reporter: &dyn Reporter,
) -> Result<UpdateOutcome> {
    let naming = ProductNaming::new(&config.vendor);
    let installed = locked_product(config, &naming)?;
    let live = read_manifest(&config.manifest)?;
    let index = TemplateIndex::open(&config.templates);
    let resolver = TargetResolver::new(&index, naming, installed, &live)
        .with_runtime_package(&config.runtime_package);
    let context = resolution_context(config, resolve);

    let mut updater = RootUpdater::new(&config.manifest, &config.plugin_package, reporter);
    let pending = updater.run_update(&resolver, &context)?;
    if !pending {
        return Ok(UpdateOutcome::default());
    }

    let change_lines = format_change_set_lines(style, updater.change_set(), &live);
    if write {
        updater.write_updated_manifest()?;
    }
    Ok(UpdateOutcome {
        pending,
        written: write,
        change_lines,
    })
}

pub(crate) fn run_show_command(config: &ProjectConfig, resolve: &ResolveArgs) -> Result<Vec<String>> {
    let naming = ProductNaming::new(&config.vendor);
    let installed = locked_product(config, &naming)?;
    let live = read_manifest(&config.manifest)?;
    let index = TemplateIndex::open(&config.templates);

    let original = index.find(&installed.edition, &installed.version)?;
    let original_label = format!(
        "{} {}",
        naming.project_package(&installed.edition),
        installed.pretty_version
    );

    let resolver = TargetResolver::new(&index, naming, installed, &live)
        .with_runtime_package(&config.runtime_package);
    let target = resolver.resolve_target(&resolution_context(config, resolve))?;

    let mut lines = format_descriptor_lines("installed", &original_label, original.as_ref());
    if original.is_none() {
        lines.push("  (no template available)".to_string());
    }
    lines.extend(format_descriptor_lines(
        "target",
        &resolver.label_for(&target),
        Some(&target),
    ));
    Ok(lines)
}

pub(crate) fn resolution_context(config: &ProjectConfig, resolve: &ResolveArgs) -> ResolutionContext {
    ResolutionContext {
        override_local_changes: resolve.override_local_changes,
        ignore_platform_reqs: resolve.ignore_platform_reqs,
        runtime_version: resolve.runtime_version.clone(),
        minimum_stability: resolve.stability.unwrap_or(config.stability),
    }
}

fn locked_product(config: &ProjectConfig, naming: &ProductNaming) -> Result<InstalledProduct> {
    read_installed_product(&config.lock, naming)?.ok_or_else(|| {
        anyhow!(
            "no {}/product-*-edition package is locked in {}",
            naming.vendor(),
            config.lock.display()
        )
    })
}

fn init_tracing(verbosity: u8) {
    let default_directive = match verbosity {
        0 | 1 => "warn",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("ROOTUP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
