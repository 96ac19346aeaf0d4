use crate::error::{RelayError, Result};
use crate::slack::{
    ChannelId, ChannelType, EditedMessage, MessageSubtype, MessageTs, RelayEvent, SlackClient,
    ThreadTs, UserId,
};
use slack_morphism::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
struct ListenerState {
    workspace: String,
    tx: mpsc::Sender<RelayEvent>,
}

/// Socket Mode subscription for one workspace, feeding message events into a queue
pub struct EventListener {
    slack_client: Arc<SlackClient>,
}

impl EventListener {
    pub fn new(slack_client: Arc<SlackClient>) -> Self {
        Self { slack_client }
    }

    /// Connect and forward every message event to `tx` until the socket closes
    pub async fn start(self, tx: mpsc::Sender<RelayEvent>) -> Result<()> {
        let workspace = self.slack_client.workspace().to_string();

        let listener_environment = Arc::new(
            SlackClientEventsListenerEnvironment::new(self.slack_client.get_client())
                .with_error_handler(Self::error_handler)
                .with_user_state(ListenerState {
                    workspace: workspace.clone(),
                    tx,
                }),
        );

        let callbacks =
            SlackSocketModeListenerCallbacks::new().with_push_events(Self::handle_push_event);

        let socket_mode_listener = SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment,
            callbacks,
        );

        tracing::info!(workspace = %workspace, "Connecting via Socket Mode");

        socket_mode_listener
            .listen_for(self.slack_client.get_app_token())
            .await
            .map_err(|e| RelayError::SlackApi(e.to_string()))?;

        tracing::info!(workspace = %workspace, "Connected, listening for messages");

        socket_mode_listener.serve().await;

        tracing::info!(workspace = %workspace, "Socket Mode listener stopped");
        Ok(())
    }

    async fn handle_push_event(
        event: SlackPushEventCallback,
        _client: Arc<SlackHyperClient>,
        user_state: SlackClientEventsUserState,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let SlackEventCallbackBody::Message(message) = event.event else {
            tracing::debug!("Ignoring non-message event");
            return Ok(());
        };

        let state: ListenerState = {
            let storage = user_state.read().await;
            storage
                .get_user_state::<ListenerState>()
                .cloned()
                .ok_or("listener state missing")?
        };

        let relay_event = relay_event_from(message);
        tracing::debug!(
            workspace = %state.workspace,
            channel = ?relay_event.channel,
            subtype = ?relay_event.subtype,
            sent_at = ?relay_event.ts.as_ref().and_then(MessageTs::to_datetime),
            "Message event received"
        );

        // Ack fast; the consumer handles events one at a time in arrival order
        if state.tx.send(relay_event).await.is_err() {
            tracing::warn!(workspace = %state.workspace, "Event queue closed, dropping event");
        }

        Ok(())
    }

    fn error_handler(
        err: Box<dyn std::error::Error + Send + Sync>,
        _client: Arc<SlackHyperClient>,
        _states: SlackClientEventsUserState,
    ) -> HttpStatusCode {
        tracing::error!(
            error = %err,
            error_kind = std::any::type_name_of_val(&*err),
            "Slack event error"
        );
        HttpStatusCode::OK
    }
}

fn relay_event_from(message: SlackMessageEvent) -> RelayEvent {
    let subtype = message
        .subtype
        .as_ref()
        .and_then(subtype_name)
        .and_then(|name| MessageSubtype::parse(&name));

    // Edits carry the author and new content on the nested message
    let edited_user = message
        .message
        .as_ref()
        .and_then(|m| m.sender.user.as_ref())
        .map(|u| UserId::new(u.to_string()));
    let edited = message.message.as_ref().map(|m| EditedMessage {
        ts: MessageTs::new(m.ts.to_string()),
        text: m
            .content
            .as_ref()
            .and_then(|c| c.text.clone())
            .unwrap_or_default(),
    });

    RelayEvent {
        channel: message
            .origin
            .channel
            .as_ref()
            .map(|c| ChannelId::new(c.to_string())),
        channel_type: message
            .origin
            .channel_type
            .as_ref()
            .and_then(|t| ChannelType::from_event_kind(&t.0)),
        user: message
            .sender
            .user
            .as_ref()
            .map(|u| UserId::new(u.to_string()))
            .or(edited_user),
        username: message.sender.username.clone(),
        text: message
            .content
            .as_ref()
            .and_then(|c| c.text.clone())
            .unwrap_or_default(),
        ts: Some(MessageTs::new(message.origin.ts.to_string())),
        thread_ts: message
            .origin
            .thread_ts
            .as_ref()
            .map(|t| ThreadTs::new(t.to_string())),
        subtype,
        edited,
        deleted_ts: message
            .deleted_ts
            .as_ref()
            .map(|t| MessageTs::new(t.to_string())),
    }
}

/// Wire name of a subtype, e.g. `message_changed`
fn subtype_name(subtype: &SlackMessageEventType) -> Option<String> {
    serde_json::to_value(subtype)
        .ok()?
        .as_str()
        .map(str::to_string)
}
