//! Run command - classify and tag the library once

use anyhow::{Context, Result};
use audience_tagger_adapters::{library::JsonLibrary, llm::ProviderFactory};
use audience_tagger_domain::{
    ProgressSink, RunOutcome, SystemClock, cancel_pair, usecases::ClassifyLibrary,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::args::RunArgs;
use crate::config::AppConfig;

/// Progress sink that reports through tracing
struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, percent: f64) {
        tracing::debug!(percent = format!("{:.1}", percent), "Classification progress");
    }
}

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let mut settings = config.run_settings()?;
    if args.overwrite {
        settings.overwrite_existing = true;
    }
    if let Some(delay_ms) = args.delay_ms {
        settings.delay = Duration::from_millis(delay_ms);
    }

    let library_path = args.library.unwrap_or(config.general.library_path.clone());

    tracing::info!(
        library = %library_path.display(),
        provider = %settings.provider.provider,
        overwrite = settings.overwrite_existing,
        "Starting audience-tagger run"
    );

    // Build dependencies
    let library = Arc::new(
        JsonLibrary::open(&library_path).context("Failed to open library file")?,
    );
    let factory = Arc::new(ProviderFactory::new(config.adapter_llm_config()));
    let usecase = ClassifyLibrary::new(library, factory, Arc::new(LogProgress), Arc::new(SystemClock));

    // Ctrl+C requests a cooperative stop
    let (cancel, signal) = cancel_pair();
    let shutdown = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, stopping after current item");
            cancel.cancel();
        }
    });

    let outcome = usecase.run(settings, signal).await;
    shutdown.abort();

    match outcome.context("Classification run failed")? {
        RunOutcome::NotStarted(reason) => {
            println!("Nothing to do: {}", reason);
        }
        RunOutcome::Finished(summary) => {
            let status = if summary.cancelled {
                "cancelled"
            } else {
                "complete"
            };
            println!(
                "Run {}: {} of {} items processed ({} tagged, {} unchanged, {} skipped, {} failed)",
                status,
                summary.processed,
                summary.total,
                summary.tagged,
                summary.unchanged,
                summary.skipped,
                summary.failed
            );
        }
    }

    Ok(())
}
