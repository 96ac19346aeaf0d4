//! Classifies incoming message events and drives the dispatcher

use crate::config::RelayConfig;
use crate::error::Result;
use crate::logging::log_error;
use crate::metadata::UserInfo;
use crate::relay::codec::{Directive, OriginTag};
use crate::relay::dispatcher::{RelayDispatcher, Trigger};
use crate::relay::log_cache::LogCache;
use crate::relay::registry::{WorkspaceHandle, Workspaces};
use crate::slack::{ChannelType, MessageSubtype, MessageTs, RelayEvent, ThreadTs};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument;
use uuid::Uuid;

/// Slack's own system user
pub const SLACKBOT_USER: &str = "USLACKBOT";

/// Which subscription an event arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Hub,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    New,
    Edited,
    Deleted,
    Directive(Directive),
    /// A copy the relay itself posted into the hub
    Echo(OriginTag),
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub kind: EventKind,
    /// Hub thread to answer before handling `kind`
    pub reply_to: Option<ThreadTs>,
}

impl Route {
    fn terminal(kind: EventKind) -> Self {
        Self {
            kind,
            reply_to: None,
        }
    }
}

/// Decide what an event is. The first matching rule wins:
/// self-authored, echo, edit, delete, then (hub only) thread reply, directive, new.
pub fn classify(event: &RelayEvent, side: Side, bot_name: &str) -> Route {
    let self_authored = event.user.as_ref().is_some_and(|u| u.as_str() == SLACKBOT_USER)
        || event.username.as_deref() == Some(bot_name);
    if self_authored {
        return Route::terminal(EventKind::Ignored);
    }

    if let Some(tag) = event.username.as_deref().and_then(OriginTag::decode) {
        return Route::terminal(EventKind::Echo(tag));
    }

    match (&event.subtype, side) {
        (Some(MessageSubtype::Changed), Side::Source) => {
            return Route::terminal(EventKind::Edited);
        }
        (Some(MessageSubtype::Deleted), Side::Source) => {
            return Route::terminal(EventKind::Deleted);
        }
        (Some(MessageSubtype::Changed | MessageSubtype::Deleted), Side::Hub) => {
            return Route::terminal(EventKind::Ignored);
        }
        _ => {}
    }

    match side {
        Side::Source => Route::terminal(EventKind::New),
        Side::Hub => {
            if event.text.trim().is_empty() {
                return Route::terminal(EventKind::Ignored);
            }
            let kind = match Directive::parse(&event.text) {
                Directive::None => EventKind::New,
                directive => EventKind::Directive(directive),
            };
            Route {
                kind,
                reply_to: event.thread_ts.clone(),
            }
        }
    }
}

pub struct EventRouter {
    workspaces: Arc<Workspaces>,
    log_cache: Arc<LogCache>,
    dispatcher: RelayDispatcher,
    relay: RelayConfig,
    /// Last timestamp handled per source workspace
    last_seen: DashMap<String, MessageTs>,
}

impl EventRouter {
    pub fn new(workspaces: Arc<Workspaces>, log_cache: Arc<LogCache>, relay: &RelayConfig) -> Self {
        let dispatcher = RelayDispatcher::new(
            workspaces.hub().api.clone(),
            log_cache.clone(),
            relay.bot_name.clone(),
        );

        Self {
            workspaces,
            log_cache,
            dispatcher,
            relay: relay.clone(),
            last_seen: DashMap::new(),
        }
    }

    /// Drain one source workspace's events in arrival order
    pub async fn consume_source(
        self: Arc<Self>,
        workspace: String,
        mut rx: mpsc::Receiver<RelayEvent>,
    ) {
        tracing::info!(workspace = %workspace, "Source event loop started");
        while let Some(event) = rx.recv().await {
            if let Err(e) = self.handle_source_event(&workspace, event).await {
                log_error("source_event", &e);
            }
        }
        tracing::info!(workspace = %workspace, "Source event loop ended");
    }

    /// Drain hub events in arrival order
    pub async fn consume_hub(self: Arc<Self>, mut rx: mpsc::Receiver<RelayEvent>) {
        tracing::info!("Hub event loop started");
        while let Some(event) = rx.recv().await {
            if let Err(e) = self.handle_hub_event(event).await {
                log_error("hub_event", &e);
            }
        }
        tracing::info!("Hub event loop ended");
    }

    /// Mirror a source workspace event into its hub channel
    pub async fn handle_source_event(
        &self,
        workspace: &str,
        event: RelayEvent,
    ) -> Result<EventKind> {
        let source = self.workspaces.source(workspace)?;

        if let Some(ts) = &event.ts {
            if self.is_duplicate(&source.name, ts) {
                tracing::debug!(workspace = %source.name, ts = %ts, "Duplicate event, skipping");
                return Ok(EventKind::Ignored);
            }
        }

        let span = tracing::info_span!(
            "source_event",
            event_id = %Uuid::new_v4(),
            workspace = %source.name,
            channel = ?event.channel.as_ref().map(|c| c.as_str()),
            ts = ?event.ts.as_ref().map(|t| t.as_str()),
        );

        self.route_source(source, event).instrument(span).await
    }

    async fn route_source(&self, source: &WorkspaceHandle, event: RelayEvent) -> Result<EventKind> {
        let route = classify(&event, Side::Source, &self.relay.bot_name);
        let hub_channel = self.relay.hub_channel_name(&source.name);

        tracing::debug!(kind = ?route.kind, "Classified source event");

        match &route.kind {
            EventKind::New => {
                let Some(ts) = &event.ts else {
                    return Ok(EventKind::Ignored);
                };
                let tag = self.origin_tag(source, &event).await;
                self.dispatcher
                    .relay_new(
                        &source.name,
                        &hub_channel,
                        &tag,
                        ts,
                        &event.text,
                        event.subtype.as_ref(),
                    )
                    .await?;
            }
            EventKind::Edited => {
                let Some(edited) = &event.edited else {
                    tracing::warn!("Edit event without edited message");
                    return Ok(EventKind::Ignored);
                };
                let tag = self.origin_tag(source, &event).await;
                self.dispatcher
                    .relay_edited(&source.name, &hub_channel, &tag, edited)
                    .await?;
            }
            EventKind::Deleted => {
                let Some(deleted_ts) = &event.deleted_ts else {
                    tracing::warn!("Delete event without deleted timestamp");
                    return Ok(EventKind::Ignored);
                };
                let tag = self.origin_tag(source, &event).await;
                self.dispatcher
                    .relay_deleted(&source.name, &hub_channel, &tag, deleted_ts)
                    .await?;
            }
            EventKind::Echo(tag) => self.record_echo(source, &event, tag),
            EventKind::Directive(_) | EventKind::Ignored => {
                tracing::debug!("Nothing to relay");
            }
        }

        Ok(route.kind)
    }

    /// Act on a message typed (or echoed) in a hub channel
    pub async fn handle_hub_event(&self, event: RelayEvent) -> Result<EventKind> {
        let hub = self.workspaces.hub();

        let Some(channel) = event.channel.clone() else {
            return Ok(EventKind::Ignored);
        };
        let Some(info) = hub.metadata.get_channel_info(channel.as_str()).await else {
            return Ok(EventKind::Ignored);
        };
        let Some(workspace) = info.name.strip_prefix(&self.relay.channel_prefix) else {
            tracing::trace!(channel = %info.name, "Not a relay channel");
            return Ok(EventKind::Ignored);
        };
        if info.channel_type == ChannelType::DirectMessage
            || event.channel_type == Some(ChannelType::DirectMessage)
        {
            return Ok(EventKind::Ignored);
        }

        let source = self.workspaces.source(workspace)?;

        let span = tracing::info_span!(
            "hub_event",
            event_id = %Uuid::new_v4(),
            workspace = %source.name,
            hub_channel = %info.name,
            ts = ?event.ts.as_ref().map(|t| t.as_str()),
        );

        self.route_hub(source, &info.name, event)
            .instrument(span)
            .await
    }

    async fn route_hub(
        &self,
        source: &WorkspaceHandle,
        hub_channel: &str,
        event: RelayEvent,
    ) -> Result<EventKind> {
        let route = classify(&event, Side::Hub, &self.relay.bot_name);

        tracing::debug!(
            kind = ?route.kind,
            in_thread = route.reply_to.is_some(),
            "Classified hub event"
        );

        match &route.kind {
            EventKind::Ignored => return Ok(route.kind),
            EventKind::Echo(tag) => {
                self.record_echo(source, &event, tag);
                return Ok(route.kind);
            }
            _ => {}
        }

        let (Some(channel), Some(ts)) = (&event.channel, &event.ts) else {
            return Ok(EventKind::Ignored);
        };

        if let Some(thread_ts) = &route.reply_to {
            self.dispatcher
                .relay_reply(source, channel, thread_ts, &event.text)
                .await?;
        }

        match &route.kind {
            EventKind::Directive(directive) => {
                let trigger = Trigger {
                    channel: channel.clone(),
                    ts: ts.clone(),
                };
                let outcome = self
                    .dispatcher
                    .dispatch_directive(source, hub_channel, &trigger, directive)
                    .await?;
                tracing::debug!(outcome = ?outcome, "Directive handled");
            }
            _ => {
                tracing::debug!("Ordinary hub message, nothing to relay");
            }
        }

        Ok(route.kind)
    }

    fn record_echo(&self, source: &WorkspaceHandle, event: &RelayEvent, tag: &OriginTag) {
        let Some(ts) = &event.ts else {
            return;
        };
        self.log_cache
            .put(&source.name, ts, tag.channel_ref(), event.text.clone());
        tracing::debug!(origin = %tag, ts = %ts, "Recorded relay echo");
    }

    fn is_duplicate(&self, workspace: &str, ts: &MessageTs) -> bool {
        self.last_seen
            .insert(workspace.to_string(), ts.clone())
            .is_some_and(|previous| previous == *ts)
    }

    /// Build the display name for a relayed copy of `event`
    async fn origin_tag(&self, source: &WorkspaceHandle, event: &RelayEvent) -> OriginTag {
        let channel = match &event.channel {
            Some(id) => source.metadata.get_channel_info(id.as_str()).await,
            None => None,
        };
        let author = match &event.user {
            Some(id) => source.metadata.get_user_info(id.as_str()).await,
            None => None,
        };

        let channel_type = event
            .channel_type
            .or(channel.as_ref().map(|c| c.channel_type))
            .unwrap_or(ChannelType::PublicChannel);

        let fallback = event
            .channel
            .as_ref()
            .map(|c| c.as_str().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let channel_name = match channel_type {
            ChannelType::DirectMessage => {
                let counterpart_id = channel.as_ref().and_then(|c| c.counterpart.as_deref());
                let counterpart = match counterpart_id {
                    Some(id) => source.metadata.get_user_info(id).await,
                    None => None,
                };
                counterpart.as_ref().map(addressable_name)
            }
            _ => channel.map(|c| c.name),
        }
        .unwrap_or(fallback);

        let readable_name = author
            .as_ref()
            .map(|u| u.best_name().to_string())
            .unwrap_or_else(|| channel_name.clone());

        OriginTag::new(readable_name, channel_type, channel_name)
    }
}

/// Name that survives the origin-tag grammar and resolves back to the user
fn addressable_name(user: &UserInfo) -> String {
    match user.display_name.as_deref() {
        Some(name) if !name.chars().any(char::is_whitespace) => name.to_string(),
        _ => user.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::testing::{FakeApi, public};
    use crate::slack::{ChannelId, EditedMessage, PostIdentity, UserId};
    use std::time::Duration;

    fn relay_config() -> RelayConfig {
        RelayConfig {
            channel_prefix: "aggr-".to_string(),
            bot_name: "aguri".to_string(),
            cache_capacity: 100,
            cache_ttl: Duration::from_secs(60),
            cache_sweep_interval: Duration::from_secs(60),
        }
    }

    fn message(channel: &str, ts: &str, text: &str) -> RelayEvent {
        RelayEvent {
            channel: Some(ChannelId::new(channel)),
            ts: Some(MessageTs::new(ts)),
            text: text.to_string(),
            ..Default::default()
        }
    }

    struct Harness {
        hub: Arc<FakeApi>,
        source: Arc<FakeApi>,
        cache: Arc<LogCache>,
        router: EventRouter,
    }

    fn harness(hub: FakeApi, source: FakeApi) -> Harness {
        let hub = Arc::new(
            hub.with_channel_info("CHUB", "aggr-acme", ChannelType::PublicChannel)
                .with_channel_info("CRANDOM", "random", ChannelType::PublicChannel),
        );
        let source = Arc::new(source.with_channel_info("CENG", "eng", ChannelType::PublicChannel));
        let workspaces = Arc::new(Workspaces::new(
            WorkspaceHandle::new("hub", hub.clone()),
            [WorkspaceHandle::new("acme", source.clone())],
        ));
        let cache = Arc::new(LogCache::new(100, Duration::from_secs(60)));
        let router = EventRouter::new(workspaces, cache.clone(), &relay_config());
        Harness {
            hub,
            source,
            cache,
            router,
        }
    }

    #[test]
    fn test_classify_order() {
        let mut event = message("C1", "1.0", "eng#hi");
        event.username = Some("bob@c:eng".to_string());
        event.subtype = Some(MessageSubtype::Changed);
        assert!(matches!(
            classify(&event, Side::Hub, "aguri").kind,
            EventKind::Echo(_)
        ));

        event.username = Some("aguri".to_string());
        assert_eq!(classify(&event, Side::Hub, "aguri").kind, EventKind::Ignored);

        let mut edit = message("C1", "1.0", "");
        edit.subtype = Some(MessageSubtype::Changed);
        assert_eq!(classify(&edit, Side::Source, "aguri").kind, EventKind::Edited);
        edit.subtype = Some(MessageSubtype::Deleted);
        assert_eq!(classify(&edit, Side::Source, "aguri").kind, EventKind::Deleted);
        assert_eq!(classify(&edit, Side::Hub, "aguri").kind, EventKind::Ignored);
    }

    #[test]
    fn test_classify_slackbot_ignored() {
        let mut event = message("C1", "1.0", "reminder");
        event.user = Some(UserId::new(SLACKBOT_USER));
        assert_eq!(classify(&event, Side::Source, "aguri").kind, EventKind::Ignored);
    }

    #[test]
    fn test_classify_threaded_directive_keeps_reply() {
        let mut event = message("C1", "2.0", "eng#hi");
        event.thread_ts = Some(ThreadTs::new("1.0"));

        let route = classify(&event, Side::Hub, "aguri");
        assert_eq!(route.reply_to, Some(ThreadTs::new("1.0")));
        assert!(matches!(route.kind, EventKind::Directive(Directive::Channel { .. })));
    }

    #[test]
    fn test_classify_source_never_parses_directives() {
        let event = message("C1", "2.0", "eng#hi");
        let route = classify(&event, Side::Source, "aguri");
        assert_eq!(route.kind, EventKind::New);
        assert_eq!(route.reply_to, None);
    }

    #[tokio::test]
    async fn test_new_edit_delete_end_to_end() {
        let h = harness(FakeApi::new(), FakeApi::new());

        let kind = h
            .router
            .handle_source_event("acme", message("CENG", "100.1", "hello"))
            .await
            .unwrap();
        assert_eq!(kind, EventKind::New);

        let mut edit = message("CENG", "100.2", "");
        edit.subtype = Some(MessageSubtype::Changed);
        edit.edited = Some(EditedMessage {
            ts: MessageTs::new("100.1"),
            text: "hi".to_string(),
        });
        h.router.handle_source_event("acme", edit).await.unwrap();

        let mut delete = message("CENG", "100.3", "");
        delete.subtype = Some(MessageSubtype::Deleted);
        delete.deleted_ts = Some(MessageTs::new("100.1"));
        h.router.handle_source_event("acme", delete).await.unwrap();

        let posts = h.hub.posts();
        assert_eq!(posts.len(), 3);
        for post in &posts {
            assert_eq!(post.destination, "#aggr-acme");
            assert_eq!(post.identity, PostIdentity::Named("eng@c:eng".to_string()));
        }
        assert_eq!(posts[0].text, "hello");
        assert_eq!(posts[1].text, "Edited from: hello\nEdited to: hi");
        assert_eq!(posts[2].text, "Original Text: hi");
    }

    #[tokio::test]
    async fn test_author_name_used_in_tag() {
        let h = harness(FakeApi::new(), FakeApi::new().with_user("U1", "alice"));
        let mut event = message("CENG", "100.1", "hello");
        event.user = Some(UserId::new("U1"));

        h.router.handle_source_event("acme", event).await.unwrap();

        assert_eq!(
            h.hub.posts()[0].identity,
            PostIdentity::Named("alice@c:eng".to_string())
        );
    }

    #[tokio::test]
    async fn test_direct_message_tag_names_the_other_party() {
        let h = harness(
            FakeApi::new(),
            FakeApi::new()
                .with_user("U0", "me")
                .with_user("U1", "bob")
                .with_dm("DBOB", "U1"),
        );
        let mut event = message("DBOB", "100.1", "psst");
        event.user = Some(UserId::new("U0"));
        event.channel_type = Some(ChannelType::DirectMessage);

        h.router.handle_source_event("acme", event).await.unwrap();

        assert_eq!(
            h.hub.posts()[0].identity,
            PostIdentity::Named("me@d:bob".to_string())
        );
    }

    #[tokio::test]
    async fn test_reply_to_direct_message_reaches_the_other_party() {
        let h = harness(
            FakeApi::new(),
            FakeApi::new()
                .with_user("U0", "me")
                .with_user("U1", "bob")
                .with_dm("DBOB", "U1"),
        );
        let mut event = message("DBOB", "100.1", "psst");
        event.user = Some(UserId::new("U0"));
        event.channel_type = Some(ChannelType::DirectMessage);
        h.router.handle_source_event("acme", event).await.unwrap();

        let mut echo = message("CHUB", "500.1", "psst");
        echo.username = Some("me@d:bob".to_string());
        h.router.handle_hub_event(echo).await.unwrap();

        let mut reply = message("CHUB", "500.2", "got it");
        reply.thread_ts = Some(ThreadTs::new("500.1"));
        h.router.handle_hub_event(reply).await.unwrap();

        let posts = h.source.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].destination, "U1");
        assert_eq!(posts[0].text, "got it");
    }

    #[tokio::test]
    async fn test_duplicate_timestamp_skipped() {
        let h = harness(FakeApi::new(), FakeApi::new());

        h.router
            .handle_source_event("acme", message("CENG", "100.1", "hello"))
            .await
            .unwrap();
        let kind = h
            .router
            .handle_source_event("acme", message("CENG", "100.1", "hello"))
            .await
            .unwrap();

        assert_eq!(kind, EventKind::Ignored);
        assert_eq!(h.hub.posts().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_workspace_is_error() {
        let h = harness(FakeApi::new(), FakeApi::new());
        assert!(
            h.router
                .handle_source_event("globex", message("CENG", "1.0", "x"))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_hub_echo_is_recorded() {
        let h = harness(FakeApi::new(), FakeApi::new());
        let mut echo = message("CHUB", "500.1", "hello");
        echo.username = Some("alice@c:eng".to_string());
        echo.subtype = Some(MessageSubtype::Other("bot_message".to_string()));

        let kind = h.router.handle_hub_event(echo).await.unwrap();

        assert!(matches!(kind, EventKind::Echo(_)));
        let entry = h.cache.get("acme", &MessageTs::new("500.1")).unwrap();
        assert_eq!(entry.body, "hello");
        assert!(h.source.posts().is_empty());
    }

    #[tokio::test]
    async fn test_hub_channel_directive_end_to_end() {
        let h = harness(
            FakeApi::new(),
            FakeApi::new().with_page(vec![public("eng"), public("random")]),
        );

        let kind = h
            .router
            .handle_hub_event(message("CHUB", "600.1", "eng#status update"))
            .await
            .unwrap();

        assert!(matches!(kind, EventKind::Directive(_)));
        let posts = h.source.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].destination, "#eng");
        assert_eq!(posts[0].text, "status update");
        assert_eq!(posts[0].identity, PostIdentity::AsUser);
        assert_eq!(
            h.hub.deletions(),
            vec![(ChannelId::new("CHUB"), MessageTs::new("600.1"))]
        );
    }

    #[tokio::test]
    async fn test_hub_thread_reply_after_echo() {
        let h = harness(FakeApi::new(), FakeApi::new());
        let mut echo = message("CHUB", "500.1", "hello");
        echo.username = Some("alice@c:eng".to_string());
        h.router.handle_hub_event(echo).await.unwrap();

        let mut reply = message("CHUB", "500.2", "thanks!");
        reply.thread_ts = Some(ThreadTs::new("500.1"));
        let kind = h.router.handle_hub_event(reply).await.unwrap();

        assert_eq!(kind, EventKind::New);
        let posts = h.source.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].destination, "#eng");
        assert_eq!(posts[0].text, "thanks!");
        assert!(h.hub.deletions().is_empty());
    }

    #[tokio::test]
    async fn test_threaded_directive_replies_then_dispatches() {
        let h = harness(
            FakeApi::new(),
            FakeApi::new().with_page(vec![public("eng"), public("random")]),
        );
        let mut echo = message("CHUB", "500.1", "hello");
        echo.username = Some("alice@g:secret".to_string());
        h.router.handle_hub_event(echo).await.unwrap();

        let mut event = message("CHUB", "500.2", "eng#status update");
        event.thread_ts = Some(ThreadTs::new("500.1"));
        let kind = h.router.handle_hub_event(event).await.unwrap();

        assert!(matches!(kind, EventKind::Directive(_)));
        let posts = h.source.posts();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].destination, "secret");
        assert_eq!(posts[0].text, "eng#status update");
        assert_eq!(posts[1].destination, "#eng");
        assert_eq!(posts[1].text, "status update");
        assert_eq!(
            h.hub.deletions(),
            vec![(ChannelId::new("CHUB"), MessageTs::new("500.2"))]
        );
    }

    #[tokio::test]
    async fn test_failed_reply_stops_directive() {
        let h = harness(FakeApi::new(), FakeApi::new().with_page(vec![public("eng")]));

        let mut event = message("CHUB", "500.2", "eng#status update");
        event.thread_ts = Some(ThreadTs::new("400.1"));
        let result = h.router.handle_hub_event(event).await;

        assert!(result.is_err());
        assert!(h.source.posts().is_empty());
        assert!(h.hub.deletions().is_empty());
    }

    #[tokio::test]
    async fn test_hub_thread_reply_with_evicted_root() {
        let h = harness(
            FakeApi::new().with_history("CHUB", "400.1", Some("bob@g:secret"), "old root"),
            FakeApi::new(),
        );
        let mut reply = message("CHUB", "500.2", "late answer");
        reply.thread_ts = Some(ThreadTs::new("400.1"));

        h.router.handle_hub_event(reply).await.unwrap();

        assert_eq!(h.source.posts()[0].destination, "secret");
    }

    #[tokio::test]
    async fn test_non_relay_hub_channel_ignored() {
        let h = harness(FakeApi::new(), FakeApi::new());

        let kind = h
            .router
            .handle_hub_event(message("CRANDOM", "1.0", "eng#hi"))
            .await
            .unwrap();

        assert_eq!(kind, EventKind::Ignored);
        assert!(h.source.posts().is_empty());
    }

    #[tokio::test]
    async fn test_plain_hub_message_does_nothing() {
        let h = harness(FakeApi::new(), FakeApi::new());

        let kind = h
            .router
            .handle_hub_event(message("CHUB", "1.0", "good morning"))
            .await
            .unwrap();

        assert_eq!(kind, EventKind::New);
        assert!(h.source.posts().is_empty());
        assert!(h.hub.posts().is_empty());
    }

    #[tokio::test]
    async fn test_consume_source_processes_in_order() {
        let h = harness(FakeApi::new(), FakeApi::new());
        let router = Arc::new(h.router);
        let (tx, rx) = mpsc::channel(8);

        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            tx.send(message("CENG", &format!("{}.0", i + 1), text))
                .await
                .unwrap();
        }
        drop(tx);
        router.consume_source("acme".to_string(), rx).await;

        let texts: Vec<_> = h.hub.posts().into_iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }
}
