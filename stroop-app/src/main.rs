mod app;
mod artifacts;
mod bridge;
mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use stroop_experiment::{load_trial_log, summarize};
use stroop_render::{ChartFont, LoadedFont, load_font, register_chart_font};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::App;
use artifacts::{ArtifactPaths, write_artifacts, write_chart};
use cli::{Args, Command};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn chart_font(loaded: &LoadedFont) -> Option<ChartFont> {
    match register_chart_font(loaded.bytes.clone()) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!(path = %loaded.path.display(), error = %format!("{e:#}"), "chart drawn without text");
            None
        }
    }
}

fn analyze(args: &Args, log: &Path, chart: Option<&Path>) -> Result<()> {
    let trials = load_trial_log(log).with_context(|| format!("loading {}", log.display()))?;
    let summary = summarize(&trials);
    summary.log();
    print!("{}", summary.report());

    if let Some(chart) = chart {
        let font = match load_font(args.font.as_deref()) {
            Ok(loaded) => chart_font(&loaded),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "chart drawn without text");
                None
            }
        };
        let title = log
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        write_chart(chart, &title, &trials, font)?;
    }
    Ok(())
}

fn run_session(args: &Args) -> Result<()> {
    let config = args.session_config()?;
    // Surface configuration errors before a fullscreen window opens.
    config.validate()?;
    let loaded = load_font(args.font.as_deref())?;
    info!(path = %loaded.path.display(), subject = %args.subject, "font loaded");
    let chart_text = chart_font(&loaded);

    let outcome = App::new(config, Some(loaded.font)).run()?;
    let results = match outcome {
        Ok(results) => results,
        Err(e) if e.is_cancelled() => {
            info!("session cancelled; nothing written");
            return Ok(());
        }
        Err(e) => return Err(e).context("session failed"),
    };

    let paths = ArtifactPaths::now(&args.output_dir, &args.subject);
    let summary = write_artifacts(&paths, &args.subject, results.trials(), chart_text)?;
    summary.log();
    info!(
        log = %paths.trial_log.display(),
        chart = %paths.chart.display(),
        summary = %paths.summary.display(),
        "results saved"
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match &args.command {
        Some(Command::Analyze { log, chart }) => analyze(&args, log, chart.as_deref()),
        None => run_session(&args),
    }
}
