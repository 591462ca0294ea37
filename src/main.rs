//! Whispersubs - Batch Subtitle Generation
//!
//! Entry point for the whispersubs command line tool, which walks a video or
//! a folder of videos and writes an `.srt` file next to each one using
//! whisper-cpp and ffmpeg.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use whispersubs::cli::{Args, Commands};
use whispersubs::config::{Config, InputMode};
use whispersubs::discovery::{collect_items, enumerate};
use whispersubs::language::SiblingFileStore;
use whispersubs::media::MediaProcessorFactory;
use whispersubs::models::{find_model, ModelManager, AVAILABLE_MODELS};
use whispersubs::progress::ProgressObserver;
use whispersubs::transcribe::TranscriberFactory;
use whispersubs::workflow::{BatchOrchestrator, ItemOutcome};

const DEFAULT_CONFIG_FILE: &str = "whispersubs.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Held until exit so buffered file logs are flushed
    let _log_guard = setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Run {
            path,
            input_mode,
            replace,
            multi_lang,
            replace_lang,
            language,
            preserve_intermediary_files,
            model,
        } => {
            let mode: InputMode = input_mode.parse()?;

            let subbing = &mut config.subbing;
            subbing.replace |= replace;
            subbing.multi_lang |= multi_lang;
            subbing.replace_lang |= replace_lang;
            subbing.preserve_intermediary_files |= preserve_intermediary_files;
            if let Some(language) = language {
                subbing.provide_lang = true;
                subbing.provided_lang = language;
            }
            if let Some(model) = model {
                config.transcriber.model = model;
            }

            run_batch(config, &path, mode).await?;
        }
        Commands::List { path, recursive } => {
            let items = enumerate(&path, recursive)?;
            for item in &items {
                let shown = pathdiff::diff_paths(item, &path).unwrap_or_else(|| item.clone());
                println!("{}", shown.display());
            }
            println!("\n{} videos found in {}", items.len(), path.display());
        }
        Commands::Models { download } => {
            let manager = ModelManager::new(&config.transcriber.models_dir);

            println!("\nAvailable Whisper Models:");
            println!("{:<16} {:<26} {:<10} {:<10}", "Name", "Filename", "Size (MB)", "Status");
            println!("{}", "-".repeat(65));
            for model in AVAILABLE_MODELS.iter() {
                let status = if manager.is_downloaded(model) { "Downloaded" } else { "Missing" };
                println!(
                    "{:<16} {:<26} {:<10.1} {:<10}",
                    model.name,
                    model.filename(),
                    model.size_mb,
                    status
                );
            }

            if let Some(name) = download {
                let model = find_model(&name)
                    .ok_or_else(|| anyhow::anyhow!("Unknown model '{}'", name))?;
                manager.download_model(model).await?;
            }
        }
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(())
}

async fn run_batch(config: Config, path: &Path, mode: InputMode) -> Result<()> {
    info!("Collecting items from {} (mode: {})", path.display(), mode);
    let items: Vec<PathBuf> = collect_items(path, mode)?;
    if items.is_empty() {
        warn!("No videos found in {}", path.display());
        return Ok(());
    }

    let manager = ModelManager::new(&config.transcriber.models_dir);
    let model_path = manager.resolve_model_path(&config.transcriber.model);
    if !model_path.exists() {
        if let Some(model) = find_model(&config.transcriber.model) {
            warn!("Model {} is missing, run `whispersubs models --download {}`", model.name, model.name);
        }
    }

    let transcriber = TranscriberFactory::create_default(config.transcriber.clone(), model_path);
    let extractor = MediaProcessorFactory::create_extractor(config.media.clone());
    let fallback_seconds = f64::from(config.transcriber.chunk_seconds);
    let orchestrator = BatchOrchestrator::new(config.subbing, extractor, Box::new(SiblingFileStore))
        .with_fallback_segment_seconds(fallback_seconds);
    orchestrator.check_dependencies(transcriber.as_ref()).await?;

    let cancelled = orchestrator.cancellation_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current item");
            cancelled.store(true, Ordering::SeqCst);
        }
    });

    let report = orchestrator
        .spawn(items, transcriber, Box::new(ProgressObserver::new()))
        .await??;

    println!(
        "\n{} done, {} skipped, {} rejected, {} failed{}",
        report.done(),
        report.skipped(),
        report.rejected(),
        report.failures().count(),
        if report.cancelled { " (cancelled)" } else { "" }
    );
    for item in report.failures() {
        if let ItemOutcome::Failed(message) = &item.outcome {
            println!("  {}: {}", item.path.display(), message);
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".whispersubs").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "whispersubs.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("whispersubs.log").display()
    );

    Ok(guard)
}
