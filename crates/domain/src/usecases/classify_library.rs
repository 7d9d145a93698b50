//! Library classification use case - walks items, classifies, and tags them

use std::sync::Arc;

use crate::{
    cancel::CancelSignal,
    model::{ItemOutcome, MediaItem, RunOutcome, RunSettings, RunSummary, SkipReason},
    policy::{TagPolicy, audience_labels},
    ports::{
        AudienceClassifier, ClassifierFactory, Clock, FactoryError, ItemQuery, ItemRepository,
        ProgressSink, RepositoryError, UpdateReason,
    },
};
use tokio::time::sleep;

/// Orchestrates one classification run over the library
pub struct ClassifyLibrary<R, F, P, Cl>
where
    R: ItemRepository + ?Sized,
    F: ClassifierFactory + ?Sized,
    P: ProgressSink + ?Sized,
    Cl: Clock + ?Sized,
{
    repository: Arc<R>,
    factory: Arc<F>,
    progress: Arc<P>,
    clock: Arc<Cl>,
}

impl<R, F, P, Cl> ClassifyLibrary<R, F, P, Cl>
where
    R: ItemRepository + ?Sized,
    F: ClassifierFactory + ?Sized,
    P: ProgressSink + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(repository: Arc<R>, factory: Arc<F>, progress: Arc<P>, clock: Arc<Cl>) -> Self {
        Self {
            repository,
            factory,
            progress,
            clock,
        }
    }

    /// Run once with the given settings snapshot
    ///
    /// The classifier is built after the preconditions pass and is dropped
    /// when this returns, on every path. Progress is reported once per
    /// processed item; an empty library reports a single 100.
    pub async fn run(
        &self,
        settings: RunSettings,
        mut cancel: CancelSignal,
    ) -> Result<RunOutcome, RunError> {
        if let Some(reason) = check_preconditions(&settings) {
            tracing::info!(reason = %reason, "Skipping audience classification");
            return Ok(RunOutcome::NotStarted(reason));
        }

        let classifier = self.factory.create(&settings.provider)?;

        let items = self
            .repository
            .query(ItemQuery {
                kind: settings.item_kind,
                recursive: true,
                exclude_virtual: true,
            })
            .await?;

        let total = items.len();
        let policy = TagPolicy::new(settings.overwrite_existing);

        tracing::info!(
            provider = classifier.provider(),
            total = total,
            overwrite = settings.overwrite_existing,
            "Starting audience classification"
        );

        let mut summary = RunSummary {
            processed: 0,
            total,
            tagged: 0,
            unchanged: 0,
            skipped: 0,
            failed: 0,
            cancelled: false,
            started_at: self.clock.now(),
            finished_at: self.clock.now(),
        };

        for mut item in items {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let Some(outcome) = self
                .process_item(classifier.as_ref(), policy, &mut item, &mut cancel)
                .await
            else {
                summary.cancelled = true;
                break;
            };

            match &outcome {
                ItemOutcome::Tagged { .. } => summary.tagged += 1,
                ItemOutcome::Unchanged { .. } => summary.unchanged += 1,
                ItemOutcome::Skipped { .. } => summary.skipped += 1,
                ItemOutcome::Failed { .. } => summary.failed += 1,
            }
            summary.processed += 1;

            let percent = summary.processed as f64 / total as f64 * 100.0;
            tracing::debug!(item_id = %item.id, percent = percent, "Progress");
            self.progress.report(percent);

            if summary.processed < total && !settings.delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        summary.cancelled = true;
                        break;
                    }
                    _ = sleep(settings.delay) => {}
                }
            }
        }

        if total == 0 {
            self.progress.report(100.0);
        }

        summary.finished_at = self.clock.now();

        if summary.cancelled {
            tracing::info!(
                processed = summary.processed,
                total = summary.total,
                "Audience classification cancelled"
            );
        } else {
            tracing::info!(
                processed = summary.processed,
                tagged = summary.tagged,
                unchanged = summary.unchanged,
                skipped = summary.skipped,
                failed = summary.failed,
                "Audience classification complete"
            );
        }

        Ok(RunOutcome::Finished(summary))
    }

    /// Process a single item; `None` means cancellation interrupted the call
    async fn process_item(
        &self,
        classifier: &dyn AudienceClassifier,
        policy: TagPolicy,
        item: &mut MediaItem,
        cancel: &mut CancelSignal,
    ) -> Option<ItemOutcome> {
        if !policy.should_classify(&item.tags) {
            tracing::debug!(
                item_id = %item.id,
                title = %item.title,
                existing = ?audience_labels(&item.tags),
                "Item already labelled, skipping"
            );
            return Some(ItemOutcome::Skipped {
                reason: "Already has an audience label".to_string(),
            });
        }

        let request = item.to_request();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            result = classifier.classify(&request) => result,
        };

        let label = match result {
            Ok(label) => label,
            Err(e) => {
                tracing::warn!(
                    item_id = %item.id,
                    title = %item.title,
                    error = %e,
                    "No classification for item"
                );
                return Some(ItemOutcome::Failed {
                    error: format!("Classification failed: {}", e),
                });
            }
        };

        let changed = policy.apply(&mut item.tags, label);

        if let Err(e) = self
            .repository
            .persist(item, UpdateReason::MetadataEdit)
            .await
        {
            tracing::error!(item_id = %item.id, title = %item.title, error = %e, "Failed to save item");
            return Some(ItemOutcome::Failed {
                error: format!("Persist failed: {}", e),
            });
        }

        tracing::info!(
            item_id = %item.id,
            title = %item.title,
            label = %label,
            changed = changed,
            "Classified item"
        );

        Some(if changed {
            ItemOutcome::Tagged { label }
        } else {
            ItemOutcome::Unchanged { label }
        })
    }
}

/// Determine whether a run should do any work
pub fn check_preconditions(settings: &RunSettings) -> Option<SkipReason> {
    if !settings.enabled {
        Some(SkipReason::Disabled)
    } else if !settings.run_on_trigger {
        Some(SkipReason::TriggerDisabled)
    } else if !settings.provider.has_credential() {
        Some(SkipReason::MissingCredential)
    } else {
        None
    }
}

/// Errors that abort a run before the item loop
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] FactoryError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}
