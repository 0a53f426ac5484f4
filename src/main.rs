//! Comment Translator - command line entry point
//!
//! Loads configuration, sets up logging, and drives the comment
//! translation workflow over files, directories or plain text.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use comment_translator::cli::{Args, Commands};
use comment_translator::config::{Config, Provider};
use comment_translator::error::TranslatorError;
use comment_translator::translate::TranslateOptions;
use comment_translator::workflow::{FileReport, SourceDocument, Workflow};

const DEFAULT_CONFIG_FILE: &str = "comment-translator.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
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
    apply_overrides(&mut config, &args)?;

    let mut workflow = Workflow::new(&config)?;

    // Ctrl-C stops issuing requests; finished edits are still written
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing current request...");
            on_signal.cancel();
        }
    });

    match args.command {
        Commands::Translate { input, output, language, dry_run, json } => {
            let report = workflow
                .translate_file(&input, output.as_deref(), language.as_deref(), dry_run, &cancel)
                .await?;
            if json {
                println!("{}", report.to_json()?);
            } else {
                print_report(&report, dry_run);
            }
        }
        Commands::Batch { input_dir, dry_run, json } => {
            let reports = workflow.translate_directory(&input_dir, dry_run, &cancel).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    print_report(report, dry_run);
                }
                let translated: usize = reports.iter().map(|r| r.translation.translated()).sum();
                println!("\n{} files, {} comments translated", reports.len(), translated);
            }
        }
        Commands::Extract { input, language, json } => {
            let language = workflow.language_for(&input, language.as_deref())?;
            let content = tokio::fs::read_to_string(&input).await?;
            let document = SourceDocument::parse(&content);

            let comments = workflow.find_comments(&document.lines, &language);
            if json {
                println!("{}", serde_json::to_string_pretty(&comments)?);
            } else if comments.is_empty() {
                println!("No comments found.");
            } else {
                println!("{:<8} {}", "Line", "Comment");
                println!("{}", "-".repeat(60));
                for (line_number, comment) in comments {
                    println!("{:<8} {}", line_number + 1, comment.comment);
                }
            }
        }
        Commands::Text { text } => {
            let request = workflow.options().request(&text);
            let result = workflow.service_mut().translate(&request).await?;
            println!("{}", result.translated_text);
            info!(
                "Translated from {} to {}",
                result.source_lang.as_deref().unwrap_or("?"),
                result.target_lang
            );
        }
        Commands::Languages => {
            let registry = workflow.extractor().registry();
            println!("Fallback: {}", registry.fallback());
            for id in registry.language_ids() {
                println!("  {}", id);
            }
        }
        Commands::InitConfig { path, force } => {
            init_config(&config, &path, force)?;
            return Ok(());
        }
    }

    let stats = workflow.stats();
    info!("Cache: {} entries, history: {} entries", stats.cache_size, stats.history_size);

    Ok(())
}

/// Command line flags win over the configuration file
fn apply_overrides(config: &mut Config, args: &Args) -> Result<()> {
    let translate = &mut config.translate;
    if let Some(source) = &args.source {
        translate.source_language = source.clone();
    }
    if let Some(target) = &args.target {
        translate.target_language = target.clone();
    }
    if let Some(provider) = &args.provider {
        translate.provider = provider.parse::<Provider>()?;
    }
    if let Some(url) = &args.libre_url {
        translate.libre_translate_url = url.clone();
    }

    // Validate eagerly so a bad provider setup fails before any file is read
    let options = TranslateOptions::from_config(translate);
    if options.provider == Provider::LibreTranslate
        && options.provider_endpoint.as_deref().map(str::trim).unwrap_or("").is_empty()
    {
        return Err(TranslatorError::Config("LibreTranslate URL is not configured".to_string()).into());
    }
    Ok(())
}

/// Write the effective configuration, refusing to clobber an existing file
fn init_config(config: &Config, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(TranslatorError::Config(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        ))
        .into());
    }
    config.save_to_file(path)?;
    println!("Wrote configuration to {}", path.display());
    Ok(())
}

fn print_report(report: &FileReport, dry_run: bool) {
    let translation = &report.translation;
    println!(
        "{} ({}): {}/{} comments translated, {} failed{}",
        report.path.display(),
        report.language,
        translation.translated(),
        translation.comments_found,
        translation.failed,
        if translation.cancelled { ", cancelled" } else { "" }
    );

    if dry_run {
        for edit in &translation.edits {
            println!("  {:>5} - {}", edit.line_number + 1, edit.original.trim());
            println!("  {:>5} + {}", edit.line_number + 1, edit.translated.trim());
        }
    }
}

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".comment-translator").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "comment-translator.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - level: {}, file: {}",
          log_level, log_dir.join("comment-translator.log").display());

    Ok(())
}
