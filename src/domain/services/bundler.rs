use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use chrono::{Duration, Utc};
use serde_json::json;
use crate::domain::{
    models::notification::{NewNotificationParams, Notification, NotificationKind},
    ports::NotificationRepository,
};
use crate::error::AppError;
use tracing::info;

pub const DEFAULT_WINDOW_MINUTES: i64 = 15;
pub const DEFAULT_THRESHOLD: i64 = 3;

/// The event that tipped a (recipient, post) pair over the bundling threshold.
pub struct BundleTrigger<'a> {
    pub event_id: &'a str,
    pub from_user_id: &'a str,
    pub to_user_id: &'a str,
    pub post_id: &'a str,
    pub kind: NotificationKind,
}

/// Collapses bursts of post activity into one summary per window.
pub struct NotificationBundler {
    notifications: Arc<dyn NotificationRepository>,
    window: Duration,
    threshold: i64,
}

impl NotificationBundler {
    pub fn new(notifications: Arc<dyn NotificationRepository>, window_minutes: i64, threshold: i64) -> Self {
        Self {
            notifications,
            window: Duration::minutes(window_minutes),
            threshold,
        }
    }

    pub async fn should_bundle(&self, user_id: &str, post_id: &str, kind: NotificationKind) -> Result<bool, AppError> {
        if !kind.is_bundleable() {
            return Ok(false);
        }

        let since = Utc::now() - self.window;
        if self.notifications.has_summary_since(user_id, post_id, since).await? {
            return Ok(false);
        }

        let pending = self.notifications.count_unbundled_since(user_id, post_id, kind, since).await?;
        Ok(pending >= self.threshold)
    }

    /// Writes one summary covering every unbundled notification for the pair in
    /// the window plus the triggering event, and points the originals at it.
    pub async fn create_bundled_notification(&self, trigger: &BundleTrigger<'_>) -> Result<Option<Notification>, AppError> {
        let since = Utc::now() - self.window;
        let originals = self.notifications.list_unbundled_since(trigger.to_user_id, trigger.post_id, since).await?;
        if originals.is_empty() {
            return Ok(None);
        }

        let mut actors: BTreeMap<NotificationKind, HashSet<&str>> = BTreeMap::new();
        for original in &originals {
            actors.entry(original.kind).or_default().insert(original.from_user_id.as_str());
        }
        actors.entry(trigger.kind).or_default().insert(trigger.from_user_id);

        let counts: Vec<(NotificationKind, usize)> = actors.iter().map(|(kind, users)| (*kind, users.len())).collect();
        let message = summary_message(&counts);
        let kinds: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(kind, count)| (kind.as_str().to_string(), json!(count)))
            .collect();

        let summary = Notification::summary(NewNotificationParams {
            event_id: trigger.event_id.to_string(),
            kind: trigger.kind,
            from_user_id: trigger.from_user_id.to_string(),
            to_user_id: trigger.to_user_id.to_string(),
            title: "New activity on your post".to_string(),
            message,
            payload: json!({
                "post_id": trigger.post_id,
                "summary": true,
                "count": originals.len() + 1,
                "kinds": kinds,
            }),
            post_id: Some(trigger.post_id.to_string()),
            conversation_id: None,
        });

        let original_ids: Vec<String> = originals.iter().map(|n| n.id.clone()).collect();
        let created = self.notifications.bundle(&summary, &original_ids).await?;

        if let Some(ref summary) = created {
            info!(
                summary_id = %summary.id,
                to_user_id = %trigger.to_user_id,
                post_id = %trigger.post_id,
                bundled = original_ids.len(),
                "Bundled notifications into summary"
            );
        }
        Ok(created)
    }
}

/// "3 people liked your post, 1 person commented on your post"
pub fn summary_message(counts: &[(NotificationKind, usize)]) -> String {
    counts
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(kind, count)| {
            let who = if *count == 1 { "1 person".to_string() } else { format!("{} people", count) };
            format!("{} {}", who, kind.verb_phrase())
        })
        .collect::<Vec<_>>()
        .join(", ")
}
