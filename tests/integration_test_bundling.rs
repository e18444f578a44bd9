mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use fanpost_backend::domain::models::{notification::NotificationKind, post::{Post, PostKind}};

async fn post_with_followers(app: &TestApp, fans: &[&str]) -> Post {
    let post = app.create_post("artist-1", PostKind::Generic).await;
    for fan in fans {
        app.follow(fan, &post.id).await;
    }
    post
}

#[tokio::test]
async fn test_fourth_reaction_collapses_into_summary() {
    let app = TestApp::new().await;
    let post = post_with_followers(&app, &["fan-1", "fan-2", "fan-3", "fan-4"]).await;
    app.register_device("artist-1", "artist-phone", "tok-artist").await;

    for fan in ["fan-1", "fan-2", "fan-3"] {
        app.state.interactions.react(fan, &post.id).await.unwrap();
        let summaries = app.process_events().await;
        assert_eq!(summaries[0].notified, 1);
    }

    app.state.interactions.react("fan-4", &post.id).await.unwrap();
    let summaries = app.process_events().await;
    assert_eq!(summaries[0].bundled, 1);

    let inbox = app.state.notification_repo.list_for_user("artist-1", 10).await.unwrap();
    assert_eq!(inbox.len(), 4);

    let summary = inbox.iter().find(|n| n.is_summary).expect("summary row");
    assert_eq!(summary.message, "4 people liked your post");
    assert_eq!(summary.payload.0["count"], 4);
    assert_eq!(summary.post_id.as_deref(), Some(post.id.as_str()));

    let originals: Vec<_> = inbox.iter().filter(|n| !n.is_summary).collect();
    assert_eq!(originals.len(), 3);
    for original in originals {
        assert!(original.is_bundled);
        assert_eq!(original.bundled_into_id.as_deref(), Some(summary.id.as_str()));
    }

    let pushes = app.push.sent_to("tok-artist");
    assert_eq!(pushes.len(), 4);
    assert_eq!(pushes[3].body, "4 people liked your post");
}

/// Moves every notification for `user_id` back by `minutes`.
async fn age_inbox(app: &TestApp, user_id: &str, minutes: i64) {
    sqlx::query("UPDATE notifications SET created_at = ? WHERE to_user_id = ?")
        .bind(Utc::now() - Duration::minutes(minutes))
        .bind(user_id)
        .execute(&app.pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reactions_outside_window_do_not_count() {
    let app = TestApp::new().await;
    let post = post_with_followers(&app, &["fan-1", "fan-2", "fan-3", "fan-4"]).await;

    for fan in ["fan-1", "fan-2", "fan-3"] {
        app.state.interactions.react(fan, &post.id).await.unwrap();
    }
    app.process_events().await;
    age_inbox(&app, "artist-1", 20).await;

    app.state.interactions.react("fan-4", &post.id).await.unwrap();
    let summaries = app.process_events().await;
    assert_eq!(summaries[0].bundled, 0);
    assert_eq!(summaries[0].stored_only, 1);

    let inbox = app.state.notification_repo.list_for_user("artist-1", 10).await.unwrap();
    assert_eq!(inbox.len(), 4);
    assert!(inbox.iter().all(|n| !n.is_summary && !n.is_bundled));
}

#[tokio::test]
async fn test_new_burst_after_window_gets_second_summary() {
    let app = TestApp::new().await;
    let fans = ["fan-1", "fan-2", "fan-3", "fan-4", "fan-5", "fan-6", "fan-7", "fan-8"];
    let post = post_with_followers(&app, &fans).await;

    for fan in &fans[..4] {
        app.state.interactions.react(fan, &post.id).await.unwrap();
        app.process_events().await;
    }
    age_inbox(&app, "artist-1", 20).await;

    for fan in &fans[4..7] {
        app.state.interactions.react(fan, &post.id).await.unwrap();
        let summaries = app.process_events().await;
        assert_eq!(summaries[0].bundled, 0);
    }
    app.state.interactions.react("fan-8", &post.id).await.unwrap();
    let summaries = app.process_events().await;
    assert_eq!(summaries[0].bundled, 1);

    let inbox = app.state.notification_repo.list_for_user("artist-1", 20).await.unwrap();
    let summary_rows: Vec<_> = inbox.iter().filter(|n| n.is_summary).collect();
    assert_eq!(summary_rows.len(), 2);

    let fresh = summary_rows.iter().max_by_key(|n| n.created_at).expect("fresh summary");
    assert_eq!(fresh.message, "4 people liked your post");
    let bundled_into_fresh = inbox
        .iter()
        .filter(|n| n.bundled_into_id.as_deref() == Some(fresh.id.as_str()))
        .count();
    assert_eq!(bundled_into_fresh, 3);
}

#[tokio::test]
async fn test_below_threshold_stays_individual() {
    let app = TestApp::new().await;
    let post = post_with_followers(&app, &["fan-1", "fan-2", "fan-3"]).await;

    for fan in ["fan-1", "fan-2", "fan-3"] {
        app.state.interactions.react(fan, &post.id).await.unwrap();
    }
    app.process_events().await;

    let inbox = app.state.notification_repo.list_for_user("artist-1", 10).await.unwrap();
    assert_eq!(inbox.len(), 3);
    assert!(inbox.iter().all(|n| !n.is_summary && !n.is_bundled));
}

#[tokio::test]
async fn test_one_summary_per_window() {
    let app = TestApp::new().await;
    let fans = ["fan-1", "fan-2", "fan-3", "fan-4", "fan-5", "fan-6"];
    let post = post_with_followers(&app, &fans).await;

    for fan in fans {
        app.state.interactions.react(fan, &post.id).await.unwrap();
        app.process_events().await;
    }

    let inbox = app.state.notification_repo.list_for_user("artist-1", 20).await.unwrap();
    let summaries: Vec<_> = inbox.iter().filter(|n| n.is_summary).collect();
    assert_eq!(summaries.len(), 1);

    // Activity after the summary is delivered individually again.
    let after: Vec<_> = inbox.iter().filter(|n| !n.is_summary && !n.is_bundled).collect();
    assert_eq!(after.len(), 2);
}

#[tokio::test]
async fn test_summary_covers_every_interaction_kind() {
    let app = TestApp::new().await;
    let post = post_with_followers(&app, &["fan-1", "fan-2", "fan-3", "fan-4", "fan-5", "fan-6"]).await;

    app.state.interactions.comment("fan-5", &post.id, "nice").await.unwrap();
    app.state.interactions.comment("fan-6", &post.id, "wow").await.unwrap();
    for fan in ["fan-1", "fan-2", "fan-3"] {
        app.state.interactions.react(fan, &post.id).await.unwrap();
    }
    app.process_events().await;

    app.state.interactions.react("fan-4", &post.id).await.unwrap();
    app.process_events().await;

    let inbox = app.state.notification_repo.list_for_user("artist-1", 20).await.unwrap();
    let summary = inbox.iter().find(|n| n.is_summary).expect("summary row");
    assert_eq!(summary.kind, NotificationKind::Reaction);
    assert_eq!(summary.message, "4 people liked your post, 2 people commented on your post");
    assert_eq!(summary.payload.0["kinds"]["COMMENT"], 2);
    assert_eq!(summary.payload.0["kinds"]["REACTION"], 4);

    assert!(inbox.iter().filter(|n| !n.is_summary).all(|n| n.is_bundled));
}

#[tokio::test]
async fn test_messages_are_never_bundled() {
    let app = TestApp::new().await;

    for i in 0..5 {
        app.state.interactions
            .send_message("fan-1", "artist-1", "conv-1", &format!("message {}", i))
            .await
            .unwrap();
    }
    app.process_events().await;

    let inbox = app.state.notification_repo.list_for_user("artist-1", 20).await.unwrap();
    assert_eq!(inbox.len(), 5);
    assert!(inbox.iter().all(|n| !n.is_summary && !n.is_bundled));
}

#[tokio::test]
async fn test_summary_is_per_recipient_and_post() {
    let app = TestApp::new().await;
    let first = post_with_followers(&app, &["fan-1", "fan-2", "fan-3", "fan-4"]).await;
    let second = app.create_post("artist-1", PostKind::Generic).await;

    for fan in ["fan-1", "fan-2", "fan-3"] {
        app.state.interactions.react(fan, &first.id).await.unwrap();
    }
    app.process_events().await;

    // Activity on a different post does not count toward the first post's burst.
    app.state.interactions.react("fan-4", &second.id).await.unwrap();
    app.process_events().await;

    let inbox = app.state.notification_repo.list_for_user("artist-1", 20).await.unwrap();
    assert_eq!(inbox.len(), 4);
    assert!(inbox.iter().all(|n| !n.is_summary));
}
