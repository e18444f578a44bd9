use std::sync::Arc;
use tokio::sync::Notify;
use crate::domain::ports::{
    DeviceRepository, EventPublisher, IdentityProvider, InviteRepository,
    NotificationRepository, OutboxRepository, PostRepository, PushService,
};
use crate::domain::services::{
    access::AccessResolver,
    bundler::NotificationBundler,
    dispatcher::NotificationDispatcher,
    fans::FanEnumeration,
    interactions::InteractionService,
    invites::InviteLifecycle,
    pipeline::NotificationPipeline,
};
use crate::config::Config;

pub struct Repositories {
    pub post_repo: Arc<dyn PostRepository>,
    pub invite_repo: Arc<dyn InviteRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub device_repo: Arc<dyn DeviceRepository>,
    pub outbox_repo: Arc<dyn OutboxRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub post_repo: Arc<dyn PostRepository>,
    pub invite_repo: Arc<dyn InviteRepository>,
    pub notification_repo: Arc<dyn NotificationRepository>,
    pub device_repo: Arc<dyn DeviceRepository>,
    pub outbox_repo: Arc<dyn OutboxRepository>,
    pub identity: Arc<dyn IdentityProvider>,
    pub events: Arc<dyn EventPublisher>,
    /// Woken whenever an event is published.
    pub event_signal: Arc<Notify>,
    pub access: Arc<AccessResolver>,
    pub invites: Arc<InviteLifecycle>,
    pub fans: Arc<FanEnumeration>,
    pub interactions: Arc<InteractionService>,
    pub pipeline: Arc<NotificationPipeline>,
}

impl AppState {
    pub fn new(
        config: Config,
        repos: Repositories,
        push_service: Arc<dyn PushService>,
        identity: Arc<dyn IdentityProvider>,
        events: Arc<dyn EventPublisher>,
        event_signal: Arc<Notify>,
    ) -> Self {
        let access = Arc::new(AccessResolver::new(repos.post_repo.clone(), repos.invite_repo.clone()));
        let invites = Arc::new(InviteLifecycle::new(repos.post_repo.clone(), repos.invite_repo.clone(), events.clone()));
        let fans = Arc::new(FanEnumeration::new(repos.post_repo.clone(), repos.invite_repo.clone()));
        let interactions = Arc::new(InteractionService::new(access.clone(), repos.post_repo.clone(), events.clone()));

        let bundler = Arc::new(NotificationBundler::new(
            repos.notification_repo.clone(),
            config.bundle_window_minutes,
            config.bundle_threshold,
        ));
        let dispatcher = NotificationDispatcher::new(
            repos.notification_repo.clone(),
            repos.device_repo.clone(),
            push_service,
            bundler,
        );
        let pipeline = Arc::new(NotificationPipeline::new(fans.clone(), dispatcher));

        Self {
            config,
            post_repo: repos.post_repo,
            invite_repo: repos.invite_repo,
            notification_repo: repos.notification_repo,
            device_repo: repos.device_repo,
            outbox_repo: repos.outbox_repo,
            identity,
            events,
            event_signal,
            access,
            invites,
            fans,
            interactions,
            pipeline,
        }
    }
}
