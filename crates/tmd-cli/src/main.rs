//! tmd command line.
//!
//! `tmd check` loads a model tree once and reports its diagnostics.
//! `tmd watch` keeps the model loaded and re-resolves it as files change.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use tmd_core::{FileDiagnostics, ModelConfig, ModelFile, ModelStore, ModelWatcher};

mod ui;

/// Configuration file picked up from the working directory.
const DEFAULT_CONFIG: &str = "tmd.yaml";

#[derive(Parser)]
#[command(name = "tmd")]
#[command(about = "Load, resolve and watch .tmd model trees")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./tmd.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Model root, overriding the configuration
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Human)]
    format: Format,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the model once and report diagnostics
    Check,

    /// Load the model and re-resolve it on every change
    Watch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let base = match cli.command {
        Commands::Check => 0,
        Commands::Watch => 3,
    };
    init_tracing(base + usize::from(cli.verbose));

    let config = load_config(cli.config.as_deref(), cli.root)?;

    match cli.command {
        Commands::Check => check(config, cli.format),
        Commands::Watch => watch(config, cli.format).await,
    }
}

/// Installs the log subscriber. `RUST_LOG` wins over the verbosity level.
fn init_tracing(level: usize) {
    const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
    let default = LEVELS[level.min(LEVELS.len() - 1)];

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>, root: Option<PathBuf>) -> miette::Result<ModelConfig> {
    let mut config = match path {
        Some(path) => ModelConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => ModelConfig::load(Path::new(DEFAULT_CONFIG))?,
        None => ModelConfig::default(),
    };

    if let Some(root) = root {
        config.model_root = root;
    }

    Ok(config)
}

/// Loads the whole tree once.
fn check(config: ModelConfig, format: Format) -> miette::Result<()> {
    let store = ModelStore::new(config);

    let spinner = (format == Format::Human).then(|| ui::spinner("Resolving model..."));
    let start = Instant::now();
    let outcome = store.load_all()?;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let failures = store.load_failures();
    let errors = count(outcome.diagnostics(), true) + failures.len();

    match format {
        Format::Json => {
            let report = serde_json::json!({
                "committed": outcome.is_committed(),
                "files": store.files().len(),
                "loadFailures": failures
                    .iter()
                    .map(|(file, failure)| serde_json::json!({ "file": file, "message": failure.message }))
                    .collect::<Vec<_>>(),
                "diagnostics": diagnostics_json(outcome.diagnostics()),
            });
            println!("{report}");
        }
        Format::Human => {
            if errors > 0 {
                ui::nope_header();
            }
            for failure in failures.values() {
                ui::error(&failure.message);
            }
            print_diagnostics(outcome.diagnostics());

            if errors == 0 {
                let files = store.files();
                let classes: usize = files.iter().map(|f| f.own_classes().count()).sum();
                let endpoints: usize = files.iter().map(|f| f.own_endpoints().count()).sum();
                ui::looking_good();
                println!();
                println!(
                    "    {} {} {} {} {} {} {}",
                    ui::plural(files.len(), "file"),
                    ui::symbols::DOT,
                    ui::plural(classes, "class"),
                    ui::symbols::DOT,
                    ui::plural(endpoints, "endpoint"),
                    ui::symbols::DOT,
                    ui::plural(store.domains().len(), "domain"),
                );
                ui::timing("Resolved", start.elapsed().as_millis());
            }
        }
    }

    if errors > 0 {
        return Err(miette::miette!("model has {}", ui::plural(errors, "error")));
    }
    Ok(())
}

/// Keeps the model loaded until interrupted.
async fn watch(config: ModelConfig, format: Format) -> miette::Result<()> {
    if format == Format::Human {
        ui::header(env!("CARGO_PKG_VERSION"));
    }

    let root = config.model_root.clone();
    let store = Arc::new(ModelStore::new(config));
    store.add_watcher(Box::new(ConsoleWatcher { format }));
    store.load_all()?;

    let _watch = store.watch(tokio::runtime::Handle::current())?;

    if format == Format::Human {
        ui::info(&format!("Watching {}", root.display()));
    }

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| miette::miette!("failed to listen for ctrl-c: {e}"))?;

    if format == Format::Human {
        println!();
        ui::dim("Stopping watch mode.");
    }
    Ok(())
}

/// Prints a line per batch. Diagnostics themselves come through the log.
struct ConsoleWatcher {
    format: Format,
}

impl ModelWatcher for ConsoleWatcher {
    fn name(&self) -> &str {
        "console"
    }

    fn on_errors(&mut self, diagnostics: &[FileDiagnostics]) {
        match self.format {
            Format::Json => println!("{}", serde_json::json!({ "diagnostics": diagnostics_json(diagnostics) })),
            Format::Human => {
                let errors = count(diagnostics, true);
                let warnings = count(diagnostics, false);
                if errors > 0 {
                    ui::error(&format!(
                        "Model rejected: {}, {}",
                        ui::plural(errors, "error"),
                        ui::plural(warnings, "warning")
                    ));
                } else if warnings > 0 {
                    ui::dim(&ui::plural(warnings, "warning"));
                }
            }
        }
    }

    fn on_files_changed(&mut self, files: &[Arc<ModelFile>]) {
        match self.format {
            Format::Json => {
                let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
                println!("{}", serde_json::json!({ "updated": names }));
            }
            Format::Human => ui::success(&format!("Model updated: {}", ui::plural(files.len(), "file"))),
        }
    }
}

fn count(diagnostics: &[FileDiagnostics], errors: bool) -> usize {
    diagnostics
        .iter()
        .flat_map(|d| &d.errors)
        .filter(|e| e.is_error() == errors)
        .count()
}

fn print_diagnostics(diagnostics: &[FileDiagnostics]) {
    for error in diagnostics.iter().flat_map(|d| &d.errors) {
        ui::diagnostic(error);
    }
    if diagnostics.iter().any(|d| !d.errors.is_empty()) {
        println!();
    }
}

fn diagnostics_json(diagnostics: &[FileDiagnostics]) -> serde_json::Value {
    serde_json::Value::Array(
        diagnostics
            .iter()
            .filter(|d| !d.errors.is_empty())
            .map(|d| serde_json::json!({ "file": d.file.name, "errors": d.errors }))
            .collect(),
    )
}
