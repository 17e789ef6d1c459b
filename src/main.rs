//! reverie: a local terminal assistant for thinking models.

use clap::Parser;
use reverie::config::Config;
use reverie::engine::{InferenceEngine, OllamaEngine};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Chat with a local thinking model, watching it reason as it answers.
#[derive(Debug, Parser)]
#[command(name = "reverie", version, about)]
struct Cli {
    /// Config file (default: <config dir>/reverie/config.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Model used for chat.
    #[arg(long, value_name = "MODEL")]
    chat_model: Option<String>,

    /// Model used to classify requests.
    #[arg(long, value_name = "MODEL")]
    router_model: Option<String>,

    /// Ollama server URL.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Log file (default: <data dir>/reverie/reverie.log).
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Do not read or write session files.
    #[arg(long)]
    no_history: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(model) = self.chat_model {
            config.engine.chat_model = model;
        }
        if let Some(model) = self.router_model {
            config.engine.router_model = model;
        }
        if let Some(url) = self.base_url {
            config.engine.base_url = url;
        }
        if self.no_history {
            config.history.enabled = false;
        }
    }
}

fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reverie")
        .join("reverie.log")
}

/// The terminal belongs to the UI, so logs go to a file.
fn init_logging(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_path = cli.log_file.clone().unwrap_or_else(default_log_path);
    if let Err(err) = init_logging(&log_path) {
        eprintln!("reverie: cannot open log file {}: {err}", log_path.display());
    }

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("reverie: {err}");
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);
    tracing::info!(
        base_url = %config.engine.base_url,
        chat_model = %config.engine.chat_model,
        router_model = %config.engine.router_model,
        "starting"
    );

    let engine: Arc<dyn InferenceEngine> = match OllamaEngine::new(&config.engine) {
        Ok(engine) => Arc::new(engine),
        Err(err) => {
            eprintln!("reverie: {err}");
            return ExitCode::FAILURE;
        }
    };

    match reverie::app::run(&config, engine) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "fatal");
            eprintln!("reverie: {err}");
            ExitCode::FAILURE
        }
    }
}
