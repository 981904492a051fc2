use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use predictive_composer::{Engine, ListStyle, TemplateRenderer};
use predictive_ingestion::stores::ERROR_LOG;
use predictive_schemas::MergeMode;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

#[derive(Parser, Debug)]
#[command(name = "predictive")]
#[command(version)]
#[command(about = "Tag suggestions learned from the tagsets you export")]
struct Args {
    /// Directory holding the data files (defaults to <Documents>/Predictive)
    #[arg(long, env = "PREDICTIVE_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List suggestions for a tag
    Suggest {
        tag: String,

        /// Only show suggestions starting with this text
        #[arg(long)]
        prefix: Option<String>,

        #[arg(long, value_enum, default_value_t = Style::Standard)]
        style: Style,
    },
    /// Report whether a tag has any suggestions
    Check { tag: String },
    /// Accept a suggestion for a tag, reinforcing the association
    Accept { tag: String, suggestion: String },
    /// Remove a learned association
    Unrelate { tag: String, suggestion: String },
    /// Export a tagset and remember it
    Export {
        #[arg(required = true)]
        tags: Vec<String>,

        /// Export even when some tags are on the notify list
        #[arg(long)]
        force: bool,
    },
    /// Merge or replace a data file from another machine
    Import {
        file: PathBuf,

        /// Replace the existing file instead of merging into it
        #[arg(long)]
        replace: bool,
    },
    /// Show the current configuration
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Style {
    Short,
    Standard,
    Detailed,
}

impl From<Style> for ListStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Short => ListStyle::Short,
            Style::Standard => ListStyle::Standard,
            Style::Detailed => ListStyle::Detailed,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let data_dir = args.data_dir.clone().unwrap_or_else(default_data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    let _guard = init_tracing(&data_dir)?;

    info!("Predictive v{}", env!("CARGO_PKG_VERSION"));
    debug!("Data directory: {}", data_dir.display());

    let engine = Engine::open(&data_dir).await?;
    let result = run(&engine, args.command, args.json).await;
    engine.shutdown().await?;
    result
}

async fn run(engine: &Engine, command: Command, as_json: bool) -> Result<()> {
    let renderer = TemplateRenderer::new();

    match command {
        Command::Suggest { tag, prefix, style } => {
            let suggestions = engine.suggest(0, &tag, prefix.as_deref()).await;
            if as_json {
                print_json(&suggestions)?;
            } else {
                println!("{}", renderer.render_suggestions(style.into(), &tag, &suggestions));
            }
        }
        Command::Check { tag } => {
            let exists = engine.has_suggestions(&tag).await;
            if as_json {
                print_json(&json!({ "tag": tag, "has_suggestions": exists }))?;
            } else if exists {
                println!("Suggestions available for '{}'.", tag);
            } else {
                println!("No suggestions for '{}'.", tag);
            }
        }
        Command::Accept { tag, suggestion } => {
            let score = engine.accept(&tag, &suggestion).await?;
            if as_json {
                print_json(&json!({ "tag": tag, "suggestion": suggestion, "score": score }))?;
            } else {
                println!("Learned {} -> {} (score {}).", tag, suggestion, score);
            }
        }
        Command::Unrelate { tag, suggestion } => {
            let removed = engine.unrelate(&tag, &suggestion).await?;
            if as_json {
                print_json(&json!({ "tag": tag, "suggestion": suggestion, "removed": removed }))?;
            } else if removed {
                println!("Unrelated {} and {}.", tag, suggestion);
            } else {
                println!("{} and {} were not related.", tag, suggestion);
            }
        }
        Command::Export { tags, force } => {
            let preview = engine.preview_export(&tags).await?;
            if !preview.flagged.is_empty() && !force {
                bail!(
                    "notify-listed tags in export: {} (use --force to export anyway)",
                    preview.flagged.join(", ")
                );
            }

            let report = engine.export(tags).await?;
            if as_json {
                print_json(&report)?;
            } else {
                println!("{}", renderer.render_export(&report));
            }
        }
        Command::Import { file, replace } => {
            let mode = if replace {
                MergeMode::Replace
            } else {
                MergeMode::Merge
            };
            let report = engine.import(file, mode).await?;
            if as_json {
                print_json(&json!({ "report": report, "status": report.status_message() }))?;
            } else {
                println!("{}", report.status_message());
            }
        }
        Command::Config => {
            let config = engine.config().await;
            if as_json {
                print_json(&config)?;
            } else {
                println!("{}", renderer.render_config(&config));
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn default_data_dir() -> PathBuf {
    dirs::document_dir()
        .map(|docs| docs.join("Predictive"))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Console output on stderr plus warnings and errors appended to `<data-dir>/error.log`
fn init_tracing(data_dir: &Path) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(data_dir, ERROR_LOG);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer)
                .with_filter(LevelFilter::WARN),
        )
        .try_init()
        .context("failed to initialize logging")?;

    Ok(guard)
}
