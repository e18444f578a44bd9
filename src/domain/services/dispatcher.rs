use std::collections::HashSet;
use std::sync::Arc;
use serde_json::{json, Value};
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use crate::domain::{
    models::{
        device::Device,
        notification::{dedupe_key, NewNotificationParams, Notification, NotificationKind},
    },
    ports::{DeviceRepository, NotificationRepository, PushService},
    services::bundler::{BundleTrigger, NotificationBundler},
};
use crate::error::AppError;

/// One domain event resolved to its audience.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub event_id: String,
    pub kind: NotificationKind,
    pub from_user_id: String,
    pub post_id: Option<String>,
    pub conversation_id: Option<String>,
    pub title: String,
    pub message: String,
    pub payload: Value,
    pub recipients: HashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientOutcome {
    Notified,
    /// Row persisted, recipient has no active device.
    StoredOnly,
    Bundled,
    SkippedSelf,
    SkippedSharedDevice,
    SkippedDuplicate,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub notified: usize,
    pub stored_only: usize,
    pub bundled: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DispatchSummary {
    fn record(&mut self, outcome: RecipientOutcome) {
        match outcome {
            RecipientOutcome::Notified => self.notified += 1,
            RecipientOutcome::StoredOnly => self.stored_only += 1,
            RecipientOutcome::Bundled => self.bundled += 1,
            RecipientOutcome::SkippedSelf
            | RecipientOutcome::SkippedSharedDevice
            | RecipientOutcome::SkippedDuplicate => self.skipped += 1,
        }
    }
}

/// Persists notification rows and attempts push delivery, one recipient at a time.
///
/// The row is always written before the push attempt. Push failures are
/// remediated and logged here and never reach the caller.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationRepository>,
    devices: Arc<dyn DeviceRepository>,
    push: Arc<dyn PushService>,
    bundler: Arc<NotificationBundler>,
}

impl NotificationDispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        devices: Arc<dyn DeviceRepository>,
        push: Arc<dyn PushService>,
        bundler: Arc<NotificationBundler>,
    ) -> Self {
        Self { notifications, devices, push, bundler }
    }

    pub async fn dispatch(&self, request: DispatchRequest) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        let actor_devices: HashSet<String> = match self.devices.active_devices(&request.from_user_id).await {
            Ok(devices) => devices.into_iter().map(|d| d.device_id).collect(),
            Err(e) => {
                warn!(actor_id = %request.from_user_id, "Could not load actor devices, shared-device check disabled: {}", e);
                HashSet::new()
            }
        };

        let request = Arc::new(request);
        let actor_devices = Arc::new(actor_devices);
        let mut tasks = JoinSet::new();

        for recipient in request.recipients.iter().cloned() {
            let this = self.clone();
            let request = request.clone();
            let actor_devices = actor_devices.clone();
            let span = info_span!(
                "dispatch_recipient",
                event_id = %request.event_id,
                kind = %request.kind,
                to_user_id = %recipient
            );

            tasks.spawn(
                async move { this.dispatch_to(&recipient, &request, &actor_devices).await }
                    .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(outcome)) => summary.record(outcome),
                Ok(Err(e)) => {
                    error!("Notification for recipient failed: {}", e);
                    summary.failed += 1;
                }
                Err(e) => {
                    error!("Recipient dispatch task aborted: {:?}", e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            event_id = %request.event_id,
            kind = %request.kind,
            notified = summary.notified,
            stored_only = summary.stored_only,
            bundled = summary.bundled,
            skipped = summary.skipped,
            failed = summary.failed,
            "Dispatch finished"
        );
        summary
    }

    async fn dispatch_to(
        &self,
        recipient: &str,
        request: &DispatchRequest,
        actor_devices: &HashSet<String>,
    ) -> Result<RecipientOutcome, AppError> {
        if recipient == request.from_user_id {
            return Ok(RecipientOutcome::SkippedSelf);
        }

        let devices = self.devices.active_devices(recipient).await?;
        if devices.iter().any(|d| actor_devices.contains(&d.device_id)) {
            debug!("Recipient shares a device with the actor, skipping");
            return Ok(RecipientOutcome::SkippedSharedDevice);
        }

        if self.already_recorded(recipient, request).await? {
            info!("Notification skipped (idempotency)");
            return Ok(RecipientOutcome::SkippedDuplicate);
        }

        if let Some(post_id) = request.post_id.as_deref() {
            if self.bundler.should_bundle(recipient, post_id, request.kind).await? {
                let trigger = BundleTrigger {
                    event_id: &request.event_id,
                    from_user_id: &request.from_user_id,
                    to_user_id: recipient,
                    post_id,
                    kind: request.kind,
                };
                if let Some(summary) = self.bundler.create_bundled_notification(&trigger).await? {
                    self.deliver_best_effort(&devices, &summary).await;
                    return Ok(RecipientOutcome::Bundled);
                }
            }
        }

        let notification = Notification::new(NewNotificationParams {
            event_id: request.event_id.clone(),
            kind: request.kind,
            from_user_id: request.from_user_id.clone(),
            to_user_id: recipient.to_string(),
            title: request.title.clone(),
            message: request.message.clone(),
            payload: request.payload.clone(),
            post_id: request.post_id.clone(),
            conversation_id: request.conversation_id.clone(),
        });
        let stored = self.notifications.create(&notification).await?;

        if devices.is_empty() {
            debug!(notification_id = %stored.id, "No active device, stored without push");
            return Ok(RecipientOutcome::StoredOnly);
        }

        self.deliver_best_effort(&devices, &stored).await;
        Ok(RecipientOutcome::Notified)
    }

    async fn already_recorded(&self, recipient: &str, request: &DispatchRequest) -> Result<bool, AppError> {
        for summary in [false, true] {
            let key = dedupe_key(&request.event_id, recipient, request.kind, summary);
            if self.notifications.exists_by_dedupe_key(&key).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn deliver_best_effort(&self, devices: &[Device], notification: &Notification) {
        match self.deliver(devices, notification).await {
            Ok(()) => {}
            Err(AppError::TransientDelivery(msg)) => {
                warn!(notification_id = %notification.id, "Push failed, leaving retry to the delivery queue: {}", msg);
            }
            Err(AppError::PermanentDelivery(handles)) => {
                warn!(notification_id = %notification.id, retired = handles.len(), "Push endpoints were invalid and have been deactivated");
            }
            Err(e) => {
                error!(notification_id = %notification.id, "Push delivery error: {}", e);
            }
        }
    }

    async fn deliver(&self, devices: &[Device], notification: &Notification) -> Result<(), AppError> {
        if devices.is_empty() {
            return Ok(());
        }

        let handles: Vec<String> = devices.iter().map(|d| d.push_token.clone()).collect();
        let payload = json!({
            "notification_id": notification.id,
            "type": notification.kind,
            "data": notification.payload.0,
        });

        let report = self.push.send(&handles, &notification.title, &notification.message, &payload).await?;

        for (handle, reason) in report.failures() {
            warn!(handle = %handle, "Push to device failed: {}", reason);
        }

        let invalid = report.invalid_handles();
        for handle in &invalid {
            if let Err(e) = self.devices.deactivate(handle).await {
                error!(handle = %handle, "Failed to deactivate invalid device: {}", e);
            }
        }

        debug!(notification_id = %notification.id, delivered = report.delivered_count(), "Push attempted");

        if !invalid.is_empty() {
            return Err(AppError::PermanentDelivery(invalid));
        }
        Ok(())
    }
}
