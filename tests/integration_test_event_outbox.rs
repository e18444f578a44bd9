mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use fanpost_backend::domain::events::DomainEvent;
use fanpost_backend::domain::models::{outbox::OutboxStatus, post::PostKind};

async fn inbox_len(app: &TestApp, user_id: &str) -> usize {
    app.state.notification_repo.list_for_user(user_id, 100).await.unwrap().len()
}

async fn outbox_statuses(app: &TestApp) -> Vec<String> {
    sqlx::query_scalar::<_, String>("SELECT status FROM event_outbox ORDER BY created_at")
        .fetch_all(&app.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_published_event_survives_restart() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::Generic).await;
    app.register_device("artist-1", "phone", "tok-artist").await;

    app.state.interactions.react("fan-1", &post.id).await.unwrap();
    assert_eq!(outbox_statuses(&app).await, vec!["PENDING"]);

    // The process "dies" before the worker gets to the event.
    let restarted = app.reopen().await;
    let summaries = restarted.process_events().await;

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].notified, 1);
    assert_eq!(inbox_len(&restarted, "artist-1").await, 1);
    assert_eq!(restarted.push.sent_to("tok-artist").len(), 1);

    assert_eq!(outbox_statuses(&app).await, vec!["COMPLETED"]);
    assert!(app.process_events().await.is_empty());
}

#[tokio::test]
async fn test_abandoned_claim_is_requeued_after_lease() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::Generic).await;

    app.state.interactions.comment("fan-1", &post.id, "first").await.unwrap();

    // A worker claims the row and never finishes.
    let claimed = app.state.outbox_repo.claim_pending(10, Utc::now()).await.unwrap();
    assert_eq!(claimed.len(), 1);
    assert_eq!(claimed[0].status, OutboxStatus::Processing);
    assert_eq!(claimed[0].attempts, 1);

    assert!(app.process_events().await.is_empty());
    assert_eq!(inbox_len(&app, "artist-1").await, 0);

    // Claims younger than the cutoff stay put.
    let released = app.state.outbox_repo.release_stale_claims(Utc::now() - Duration::minutes(5)).await.unwrap();
    assert_eq!(released, 0);

    let released = app.state.outbox_repo.release_stale_claims(Utc::now() + Duration::minutes(1)).await.unwrap();
    assert_eq!(released, 1);

    let summaries = app.process_events().await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(inbox_len(&app, "artist-1").await, 1);

    let entry = app.state.outbox_repo.find_by_id(&claimed[0].id).await.unwrap().unwrap();
    assert_eq!(entry.status, OutboxStatus::Completed);
    assert_eq!(entry.attempts, 2);
}

#[tokio::test]
async fn test_event_for_missing_post_is_marked_failed() {
    let app = TestApp::new().await;

    app.state.events.publish(DomainEvent::PostReacted {
        event_id: DomainEvent::new_event_id(),
        actor_id: "fan-1".to_string(),
        post_id: "no-such-post".to_string(),
    }).await.unwrap();

    assert!(app.process_events().await.is_empty());

    let id = sqlx::query_scalar::<_, String>("SELECT id FROM event_outbox")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let entry = app.state.outbox_repo.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(entry.status, OutboxStatus::Failed);
    assert!(entry.error_message.is_some());
    assert_eq!(entry.event_type, "POST_REACTED");

    // Failed rows are not picked up again.
    assert!(app.process_events().await.is_empty());
}

#[tokio::test]
async fn test_replayed_event_does_not_notify_twice() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::Generic).await;
    app.register_device("artist-1", "phone", "tok-artist").await;

    app.state.interactions.react("fan-1", &post.id).await.unwrap();
    let first = app.process_events().await;
    assert_eq!(first[0].notified, 1);

    // Worker crashed after delivering but before recording completion.
    sqlx::query("UPDATE event_outbox SET status = 'PENDING'")
        .execute(&app.pool)
        .await
        .unwrap();

    let replay = app.process_events().await;
    assert_eq!(replay.len(), 1);
    assert_eq!(replay[0].notified, 0);
    assert_eq!(replay[0].skipped, 1);

    assert_eq!(inbox_len(&app, "artist-1").await, 1);
    assert_eq!(app.push.sent_to("tok-artist").len(), 1);
}

#[tokio::test]
async fn test_events_are_dispatched_in_publish_order() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::Generic).await;

    for text in ["one", "two", "three"] {
        app.state.interactions.comment("fan-1", &post.id, text).await.unwrap();
    }

    let events = app.discard_events().await;
    let texts: Vec<&str> = events.iter().map(|e| match e {
        DomainEvent::PostCommented { text, .. } => text.as_str(),
        other => panic!("unexpected event {:?}", other),
    }).collect();

    assert_eq!(texts, vec!["one", "two", "three"]);
    assert_eq!(outbox_statuses(&app).await, vec!["COMPLETED"; 3]);
}
