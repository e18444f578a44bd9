use std::collections::HashSet;
use std::sync::Arc;
use serde_json::json;
use crate::domain::{
    events::DomainEvent,
    models::notification::NotificationKind,
    services::{
        dispatcher::{DispatchRequest, DispatchSummary, NotificationDispatcher},
        fans::FanEnumeration,
    },
};
use crate::error::AppError;

const PREVIEW_CHARS: usize = 120;

/// Subscriber side of the event bus: resolves each event's audience and hands
/// it to the dispatcher.
pub struct NotificationPipeline {
    fans: Arc<FanEnumeration>,
    dispatcher: NotificationDispatcher,
}

impl NotificationPipeline {
    pub fn new(fans: Arc<FanEnumeration>, dispatcher: NotificationDispatcher) -> Self {
        Self { fans, dispatcher }
    }

    pub async fn handle(&self, event: &DomainEvent) -> Result<DispatchSummary, AppError> {
        let request = self.build_request(event).await?;
        Ok(self.dispatcher.dispatch(request).await)
    }

    async fn build_request(&self, event: &DomainEvent) -> Result<DispatchRequest, AppError> {
        let request = match event {
            DomainEvent::PostReacted { event_id, actor_id, post_id } => {
                let owner = self.fans.get_post_owner_id(post_id).await?;
                DispatchRequest {
                    event_id: event_id.clone(),
                    kind: NotificationKind::Reaction,
                    from_user_id: actor_id.clone(),
                    post_id: Some(post_id.clone()),
                    conversation_id: None,
                    title: "New reaction".to_string(),
                    message: "A fan liked your post".to_string(),
                    payload: json!({ "post_id": post_id }),
                    recipients: HashSet::from([owner]),
                }
            }
            DomainEvent::PostCommented { event_id, actor_id, post_id, comment_id, text } => {
                let owner = self.fans.get_post_owner_id(post_id).await?;
                let mut recipients = self.fans.fans_with_access(post_id, Some(actor_id)).await?;
                recipients.insert(owner);
                DispatchRequest {
                    event_id: event_id.clone(),
                    kind: NotificationKind::Comment,
                    from_user_id: actor_id.clone(),
                    post_id: Some(post_id.clone()),
                    conversation_id: None,
                    title: "New comment".to_string(),
                    message: preview(text),
                    payload: json!({ "post_id": post_id, "comment_id": comment_id }),
                    recipients,
                }
            }
            DomainEvent::InviteCreated { event_id, actor_id, post_id, invite_id, invitee_id } => DispatchRequest {
                event_id: event_id.clone(),
                kind: NotificationKind::Invite,
                from_user_id: actor_id.clone(),
                post_id: Some(post_id.clone()),
                conversation_id: None,
                title: "You're invited".to_string(),
                message: "An artist invited you to a private post".to_string(),
                payload: json!({ "post_id": post_id, "invite_id": invite_id }),
                recipients: HashSet::from([invitee_id.clone()]),
            },
            DomainEvent::InviteAccepted { event_id, actor_id, post_id, invite_id } => {
                let owner = self.fans.get_post_owner_id(post_id).await?;
                DispatchRequest {
                    event_id: event_id.clone(),
                    kind: NotificationKind::Invite,
                    from_user_id: actor_id.clone(),
                    post_id: Some(post_id.clone()),
                    conversation_id: None,
                    title: "Invite accepted".to_string(),
                    message: "A fan accepted your invite".to_string(),
                    payload: json!({ "post_id": post_id, "invite_id": invite_id, "status": "ACCEPTED" }),
                    recipients: HashSet::from([owner]),
                }
            }
            DomainEvent::MessageSent { event_id, actor_id, recipient_id, conversation_id, text } => DispatchRequest {
                event_id: event_id.clone(),
                kind: NotificationKind::Message,
                from_user_id: actor_id.clone(),
                post_id: None,
                conversation_id: Some(conversation_id.clone()),
                title: "New message".to_string(),
                message: preview(text),
                payload: json!({ "conversation_id": conversation_id }),
                recipients: HashSet::from([recipient_id.clone()]),
            },
        };
        Ok(request)
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut.trim_end())
}
