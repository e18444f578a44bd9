mod common;

use common::{artist, TestApp};
use fanpost_backend::domain::events::DomainEvent;
use fanpost_backend::domain::models::{
    invite::InviteStatus,
    notification::NotificationKind,
    post::PostKind,
};

async fn inbox_len(app: &TestApp, user_id: &str) -> usize {
    app.state.notification_repo.list_for_user(user_id, 100).await.unwrap().len()
}

#[tokio::test]
async fn test_comment_notifies_owner_and_fans_but_not_commenter() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::Generic).await;
    for fan in ["fan-1", "fan-2", "fan-3"] {
        app.follow(fan, &post.id).await;
    }

    app.state.interactions.comment("fan-1", &post.id, "love this").await.unwrap();
    let summaries = app.process_events().await;

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].stored_only, 3);
    assert_eq!(summaries[0].failed, 0);

    assert_eq!(inbox_len(&app, "artist-1").await, 1);
    assert_eq!(inbox_len(&app, "fan-2").await, 1);
    assert_eq!(inbox_len(&app, "fan-3").await, 1);
    assert_eq!(inbox_len(&app, "fan-1").await, 0);

    let row = &app.state.notification_repo.list_for_user("fan-2", 10).await.unwrap()[0];
    assert_eq!(row.kind, NotificationKind::Comment);
    assert_eq!(row.from_user_id, "fan-1");
    assert_eq!(row.post_id.as_deref(), Some(post.id.as_str()));
    assert_eq!(row.message, "love this");
    assert!(!row.is_read);
}

#[tokio::test]
async fn test_owner_activity_never_notifies_owner() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::Generic).await;
    app.follow("fan-1", &post.id).await;

    app.state.interactions.comment("artist-1", &post.id, "thanks all").await.unwrap();
    let summaries = app.process_events().await;

    assert_eq!(summaries[0].skipped, 1);
    assert_eq!(inbox_len(&app, "artist-1").await, 0);
    assert_eq!(inbox_len(&app, "fan-1").await, 1);
}

#[tokio::test]
async fn test_reaction_notifies_owner_only() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::Generic).await;
    app.follow("fan-1", &post.id).await;
    app.follow("fan-2", &post.id).await;
    app.register_device("artist-1", "artist-phone", "tok-artist").await;

    assert!(app.state.interactions.react("fan-1", &post.id).await.unwrap());
    let summaries = app.process_events().await;

    assert_eq!(summaries[0].notified, 1);
    assert_eq!(inbox_len(&app, "artist-1").await, 1);
    assert_eq!(inbox_len(&app, "fan-2").await, 0);

    let pushes = app.push.sent_to("tok-artist");
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].payload["type"], "REACTION");

    // Reacting again is a no-op and emits nothing.
    assert!(!app.state.interactions.react("fan-1", &post.id).await.unwrap());
    assert!(app.process_events().await.is_empty());
}

#[tokio::test]
async fn test_shared_device_suppresses_notification() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::Generic).await;
    app.follow("fan-1", &post.id).await;

    app.register_device("artist-1", "family-tablet", "tok-artist").await;
    app.register_device("fan-1", "family-tablet", "tok-fan").await;

    app.state.interactions.react("fan-1", &post.id).await.unwrap();
    let summaries = app.process_events().await;

    assert_eq!(summaries[0].skipped, 1);
    assert_eq!(inbox_len(&app, "artist-1").await, 0);
    assert!(app.push.sent().is_empty());
}

#[tokio::test]
async fn test_recipient_without_device_still_gets_inbox_row() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::Generic).await;
    app.follow("fan-1", &post.id).await;

    app.state.interactions.react("fan-1", &post.id).await.unwrap();
    let summaries = app.process_events().await;

    assert_eq!(summaries[0].stored_only, 1);
    assert_eq!(inbox_len(&app, "artist-1").await, 1);
    assert!(app.push.sent().is_empty());
}

#[tokio::test]
async fn test_invalid_endpoint_is_deactivated() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::Generic).await;
    app.follow("fan-1", &post.id).await;
    app.register_device("artist-1", "old-phone", "tok-dead").await;
    app.push.mark_invalid("tok-dead");

    app.state.interactions.react("fan-1", &post.id).await.unwrap();
    let summaries = app.process_events().await;

    assert_eq!(summaries[0].failed, 0);
    assert_eq!(inbox_len(&app, "artist-1").await, 1);
    assert!(app.state.device_repo.active_devices("artist-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transient_push_failure_is_isolated_per_recipient() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::Generic).await;
    app.follow("fan-1", &post.id).await;
    app.follow("fan-2", &post.id).await;
    app.register_device("fan-1", "phone-1", "tok-timeout").await;
    app.register_device("fan-2", "phone-2", "tok-ok").await;
    app.push.mark_unreachable("tok-timeout");

    app.state.interactions.comment("artist-1", &post.id, "new drop friday").await.unwrap();
    let summaries = app.process_events().await;

    assert_eq!(summaries[0].failed, 0);
    assert_eq!(inbox_len(&app, "fan-1").await, 1);
    assert_eq!(inbox_len(&app, "fan-2").await, 1);
    assert_eq!(app.push.sent_to("tok-ok").len(), 1);
    assert!(app.push.sent_to("tok-timeout").is_empty());

    // A transient failure does not retire the device.
    assert_eq!(app.state.device_repo.active_devices("fan-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_replayed_event_is_not_delivered_twice() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::Generic).await;
    app.follow("fan-1", &post.id).await;
    app.follow("fan-2", &post.id).await;
    app.register_device("artist-1", "artist-phone", "tok-artist").await;

    let event = DomainEvent::PostCommented {
        event_id: DomainEvent::new_event_id(),
        actor_id: "fan-1".into(),
        post_id: post.id.clone(),
        comment_id: "comment-1".into(),
        text: "first!".into(),
    };

    let first = app.state.pipeline.handle(&event).await.unwrap();
    let second = app.state.pipeline.handle(&event).await.unwrap();

    assert_eq!(first.notified + first.stored_only, 2);
    assert_eq!(second.skipped, 2);
    assert_eq!(inbox_len(&app, "artist-1").await, 1);
    assert_eq!(inbox_len(&app, "fan-2").await, 1);
    assert_eq!(app.push.sent_to("tok-artist").len(), 1);
}

#[tokio::test]
async fn test_invite_lifecycle_notifications() {
    let app = TestApp::new().await;
    let post = app.create_post("artist-1", PostKind::InviteOnly).await;

    let invite = app.state.invites.create_invite(&artist("artist-1"), &post.id, "fan-1", None).await.unwrap();
    app.process_events().await;

    let invitee_inbox = app.state.notification_repo.list_for_user("fan-1", 10).await.unwrap();
    assert_eq!(invitee_inbox.len(), 1);
    assert_eq!(invitee_inbox[0].kind, NotificationKind::Invite);
    assert_eq!(invitee_inbox[0].payload.0["invite_id"], invite.id.as_str());

    app.state.invites.transition("fan-1", &invite.id, InviteStatus::Accepted).await.unwrap();
    app.process_events().await;

    let owner_inbox = app.state.notification_repo.list_for_user("artist-1", 10).await.unwrap();
    assert_eq!(owner_inbox.len(), 1);
    assert_eq!(owner_inbox[0].from_user_id, "fan-1");
    assert_eq!(owner_inbox[0].payload.0["status"], "ACCEPTED");
}

#[tokio::test]
async fn test_message_notifies_recipient() {
    let app = TestApp::new().await;
    app.register_device("fan-2", "phone", "tok-fan-2").await;

    app.state.interactions.send_message("fan-1", "fan-2", "conv-1", "hey there").await.unwrap();
    app.process_events().await;

    let inbox = app.state.notification_repo.list_for_user("fan-2", 10).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::Message);
    assert_eq!(inbox[0].conversation_id.as_deref(), Some("conv-1"));
    assert!(inbox[0].post_id.is_none());
    assert_eq!(app.push.sent_to("tok-fan-2")[0].body, "hey there");
}

#[tokio::test]
async fn test_event_for_deleted_post_is_not_found() {
    let app = TestApp::new().await;

    let event = DomainEvent::PostReacted {
        event_id: DomainEvent::new_event_id(),
        actor_id: "fan-1".into(),
        post_id: "gone".into(),
    };

    let result = app.state.pipeline.handle(&event).await;
    assert!(matches!(result, Err(fanpost_backend::error::AppError::NotFound(_))));
}
