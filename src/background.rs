use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info, warn, info_span, Instrument};
use crate::domain::services::dispatcher::DispatchSummary;
use crate::error::AppError;
use crate::state::AppState;

const OUTBOX_BATCH_SIZE: i64 = 10;
const OUTBOX_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_ATTEMPTS: i32 = 5;

fn claim_lease() -> chrono::Duration {
    chrono::Duration::minutes(5)
}

/// Drains the event outbox and fans each event out to its recipients.
///
/// Wakes on every publish and otherwise polls. Claims left behind by a dead
/// worker are handed out again once their lease runs out.
pub async fn start_notification_worker(state: Arc<AppState>) {
    info!("Starting notification worker...");

    loop {
        match state.outbox_repo.release_stale_claims(Utc::now() - claim_lease()).await {
            Ok(0) => {}
            Ok(released) => warn!(released, "Re-queued abandoned outbox claims"),
            Err(e) => error!("Failed to release stale outbox claims: {:?}", e),
        }

        match process_outbox_batch(&state).await {
            // A full batch means more may be waiting.
            Ok(processed) if processed.len() as i64 >= OUTBOX_BATCH_SIZE => continue,
            Ok(_) => {}
            Err(e) => error!("Failed to claim outbox events: {:?}", e),
        }

        tokio::select! {
            _ = state.event_signal.notified() => {}
            _ = sleep(OUTBOX_POLL_INTERVAL) => {}
        }
    }
}

/// Claims one batch of pending events and runs each through the pipeline, oldest first.
///
/// Returns the dispatch summaries of the events that completed. Dispatch is
/// idempotent per recipient, so a retried event never notifies twice.
pub async fn process_outbox_batch(state: &AppState) -> Result<Vec<DispatchSummary>, AppError> {
    let entries = state.outbox_repo.claim_pending(OUTBOX_BATCH_SIZE, Utc::now()).await?;
    let mut summaries = Vec::with_capacity(entries.len());

    for entry in entries {
        let event = entry.event();
        let span = info_span!(
            "notification_event",
            outbox_id = %entry.id,
            event_id = %event.event_id(),
            event_kind = %event.kind_name(),
            actor_id = %event.actor_id(),
            post_id = event.post_id().unwrap_or_default(),
            attempt = entry.attempts
        );

        async {
            let outcome = match state.pipeline.handle(event).await {
                Ok(summary) => {
                    info!(failed = summary.failed, "Event processed");
                    summaries.push(summary);
                    state.outbox_repo.complete(&entry.id).await
                }
                Err(AppError::NotFound(msg)) => {
                    warn!("Event target disappeared before fan-out: {}", msg);
                    state.outbox_repo.fail(&entry.id, &msg).await
                }
                Err(e) if entry.attempts >= MAX_ATTEMPTS => {
                    error!("Event processing failed, giving up after {} attempts: {}", entry.attempts, e);
                    state.outbox_repo.fail(&entry.id, &e.to_string()).await
                }
                Err(e) => {
                    warn!("Event processing failed, will retry: {}", e);
                    state.outbox_repo.release(&entry.id, &e.to_string()).await
                }
            };

            if let Err(e) = outcome {
                error!("Failed to record outbox status: {:?}", e);
            }
        }
            .instrument(span)
            .await;
    }

    if !summaries.is_empty() {
        debug!(processed = summaries.len(), "Outbox batch finished");
    }
    Ok(summaries)
}

/// Recurring trigger for the stale-invite purge.
pub async fn start_purge_scheduler(state: Arc<AppState>) {
    info!("Starting invite purge scheduler (every {:?})", state.config.purge_interval);

    let mut ticker = interval(state.config.purge_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let span = info_span!("invite_purge");
        async {
            if let Err(e) = state.invites.purge_stale_invites(Utc::now()).await {
                error!("Invite purge failed, will retry next run: {}", e);
            }
        }
            .instrument(span)
            .await;
    }
}
