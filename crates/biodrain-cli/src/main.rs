/// Offline evaluator for recorded site snapshots.
/// Prints JSON results on stdout; logs go to stderr.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use biodrain_core::{
    AnalysisRequest, AnalysisResult, DrainageEngine, EngineConfig, Providers, SiteSnapshot,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "biodrain",
    version,
    about = "Nature-inspired drainage design from site snapshots"
)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one snapshot file.
    Evaluate {
        snapshot: PathBuf,
        /// Engine configuration JSON (defaults to the reference calibration).
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Evaluate every `*.json` snapshot in a directory, in parallel.
    Batch {
        dir: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Print the reference configuration.
    Config,
}

#[derive(Serialize)]
struct BatchEntry {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = EngineConfig::from_json_str(&text)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    tracing::info!(version = %config.version, "loaded engine configuration");
    Ok(config)
}

fn read_snapshot(path: &Path) -> Result<SiteSnapshot> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    SiteSnapshot::from_json_str(&text)
        .with_context(|| format!("Invalid snapshot {}", path.display()))
}

fn job(snapshot: &SiteSnapshot) -> (AnalysisRequest, Providers) {
    (snapshot.request.clone(), Providers::single(Arc::new(snapshot.measurements.clone())))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn snapshot_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Evaluate { snapshot, config, pretty } => {
            let engine = DrainageEngine::new(load_config(config.as_deref())?)?;
            let snapshot = read_snapshot(&snapshot)?;
            let (request, providers) = job(&snapshot);
            let result = engine.evaluate(&request, &providers).context("Rejected request")?;
            print_json(&result, pretty)?;
        }

        Command::Batch { dir, config, pretty } => {
            let engine = DrainageEngine::new(load_config(config.as_deref())?)?;
            let files = snapshot_files(&dir)?;
            tracing::info!(count = files.len(), dir = %dir.display(), "evaluating batch");

            let mut entries = Vec::with_capacity(files.len());
            let mut loaded = Vec::new();
            for path in &files {
                let file = path
                    .file_name()
                    .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
                match read_snapshot(path) {
                    Ok(snapshot) => {
                        loaded.push((entries.len(), job(&snapshot)));
                        entries.push(BatchEntry {
                            file,
                            label: snapshot.label,
                            result: None,
                            error: None,
                        });
                    }
                    Err(e) => {
                        tracing::error!(file = %file, "{e:#}");
                        entries.push(BatchEntry {
                            file,
                            label: None,
                            result: None,
                            error: Some(format!("{e:#}")),
                        });
                    }
                }
            }

            let (slots, jobs): (Vec<usize>, Vec<_>) = loaded.into_iter().unzip();
            for (slot, outcome) in slots.into_iter().zip(engine.evaluate_batch(&jobs)) {
                let entry = &mut entries[slot];
                match outcome {
                    Ok(result) => entry.result = Some(result),
                    Err(e) => {
                        tracing::error!(file = %entry.file, "{e}");
                        entry.error = Some(e.to_string());
                    }
                }
            }

            print_json(&entries, pretty)?;
            let failed = entries.iter().filter(|e| e.error.is_some()).count();
            if failed > 0 {
                bail!("{failed} of {} snapshots failed", entries.len());
            }
        }

        Command::Config => {
            print_json(&EngineConfig::default(), true)?;
        }
    }

    Ok(())
}
