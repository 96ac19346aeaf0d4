//! Performs the cross-workspace posts once an address is known

use crate::error::Result;
use crate::logging::Timer;
use crate::relay::codec::{Directive, OriginTag};
use crate::relay::log_cache::{ChannelRef, LogCache};
use crate::relay::registry::WorkspaceHandle;
use crate::relay::resolver::{ChannelResolver, Resolution};
use crate::slack::{
    ChannelId, ChannelType, ChatApi, EditedMessage, MessageSubtype, MessageTs, PostIdentity,
    ThreadTs,
};
use std::sync::Arc;

/// What happened to a directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveOutcome {
    /// Posted to the source workspace and the hub command removed
    Delivered { destination: String },
    /// No destination matched; a diagnostic was posted to the hub
    NotFound,
    /// Several channels matched; a diagnostic listing them was posted to the hub
    Ambiguous(Vec<String>),
    Skipped,
}

/// The hub-side message that carried a directive
#[derive(Debug, Clone)]
pub struct Trigger {
    pub channel: ChannelId,
    pub ts: MessageTs,
}

pub struct RelayDispatcher {
    hub: Arc<dyn ChatApi>,
    log_cache: Arc<LogCache>,
    resolver: ChannelResolver,
    bot_name: String,
}

impl RelayDispatcher {
    pub fn new(
        hub: Arc<dyn ChatApi>,
        log_cache: Arc<LogCache>,
        bot_name: impl Into<String>,
    ) -> Self {
        Self {
            hub,
            resolver: ChannelResolver::new(log_cache.clone()),
            log_cache,
            bot_name: bot_name.into(),
        }
    }

    /// Copy a new source message into the hub channel
    pub async fn relay_new(
        &self,
        workspace: &str,
        hub_channel: &str,
        tag: &OriginTag,
        ts: &MessageTs,
        text: &str,
        subtype: Option<&MessageSubtype>,
    ) -> Result<MessageTs> {
        let body = match subtype {
            Some(MessageSubtype::Other(name)) => format_subtype(name, text),
            _ => text.to_string(),
        };

        let posted = self.post_to_hub(hub_channel, &body, tag).await?;
        self.log_cache.put(workspace, ts, tag.channel_ref(), text);

        tracing::info!(
            workspace = %workspace,
            hub_channel = %hub_channel,
            origin = %tag,
            ts = %ts,
            "Relayed new message"
        );
        Ok(posted)
    }

    /// Show an edit as before/after text in the hub
    pub async fn relay_edited(
        &self,
        workspace: &str,
        hub_channel: &str,
        tag: &OriginTag,
        edited: &EditedMessage,
    ) -> Result<MessageTs> {
        let previous = self.log_cache.get(workspace, &edited.ts);
        if previous.is_none() {
            tracing::debug!(workspace = %workspace, ts = %edited.ts, "Edited message not in cache");
        }

        let text = format_edited(previous.as_ref().map(|e| e.body.as_str()), &edited.text);
        let posted = self.post_to_hub(hub_channel, &text, tag).await?;

        let channel = previous.map(|e| e.channel).unwrap_or_else(|| tag.channel_ref());
        self.log_cache
            .put(workspace, &edited.ts, channel, edited.text.clone());

        tracing::info!(workspace = %workspace, ts = %edited.ts, "Relayed edit");
        Ok(posted)
    }

    /// Show the text a deleted message used to have
    pub async fn relay_deleted(
        &self,
        workspace: &str,
        hub_channel: &str,
        tag: &OriginTag,
        deleted_ts: &MessageTs,
    ) -> Result<MessageTs> {
        let previous = self.log_cache.get(workspace, deleted_ts);
        let text = format_deleted(previous.as_ref().map(|e| e.body.as_str()));
        let posted = self.post_to_hub(hub_channel, &text, tag).await?;

        tracing::info!(
            workspace = %workspace,
            ts = %deleted_ts,
            known = previous.is_some(),
            "Relayed deletion"
        );
        Ok(posted)
    }

    /// Post a hub thread reply back into the source conversation of the thread root
    pub async fn relay_reply(
        &self,
        source: &WorkspaceHandle,
        hub_channel: &ChannelId,
        thread_ts: &ThreadTs,
        text: &str,
    ) -> Result<MessageTs> {
        let _timer = Timer::new("relay_reply");

        let root = self
            .resolver
            .thread_root(self.hub.as_ref(), &source.name, hub_channel, thread_ts)
            .await?;
        let destination = self
            .resolver
            .destination_for(source.api.as_ref(), &root.channel)
            .await?;

        let posted = source
            .api
            .post_message(&destination, text, &PostIdentity::AsUser)
            .await?;
        self.log_cache.put(&source.name, &posted, root.channel, text);

        tracing::info!(
            workspace = %source.name,
            destination = %destination,
            thread_ts = %thread_ts.as_str(),
            "Relayed thread reply"
        );
        Ok(posted)
    }

    /// Carry out a `name#body` or `name@body` command typed in the hub
    pub async fn dispatch_directive(
        &self,
        source: &WorkspaceHandle,
        hub_channel: &str,
        trigger: &Trigger,
        directive: &Directive,
    ) -> Result<DirectiveOutcome> {
        let _timer = Timer::new("dispatch_directive");

        match directive {
            Directive::Channel { target, body } => {
                match self
                    .resolver
                    .resolve_channel(source.api.as_ref(), target)
                    .await?
                {
                    Resolution::Found(channel) => {
                        let channel_type = if channel.is_channel && !channel.is_private {
                            ChannelType::PublicChannel
                        } else {
                            ChannelType::PrivateGroup
                        };
                        let channel_ref = ChannelRef::Tagged {
                            channel_type,
                            name: channel.name.clone(),
                        };
                        self.deliver(source, trigger, &channel.destination(), channel_ref, body)
                            .await
                    }
                    Resolution::NoMatch => {
                        self.post_diagnostic(hub_channel, &format!("Not found channel: {}", target))
                            .await?;
                        Ok(DirectiveOutcome::NotFound)
                    }
                    Resolution::Ambiguous(candidates) => {
                        let names: Vec<String> =
                            candidates.iter().map(|c| c.destination()).collect();
                        self.post_diagnostic(
                            hub_channel,
                            &format!("Found multiple candidacies: {}", names.join(", ")),
                        )
                        .await?;
                        Ok(DirectiveOutcome::Ambiguous(names))
                    }
                }
            }
            Directive::Im { target, body } => {
                match self.resolver.resolve_user(source.api.as_ref(), target).await? {
                    Some(user) => {
                        let channel_ref = ChannelRef::Tagged {
                            channel_type: ChannelType::DirectMessage,
                            name: target.clone(),
                        };
                        self.deliver(source, trigger, user.as_str(), channel_ref, body)
                            .await
                    }
                    None => {
                        self.post_diagnostic(
                            hub_channel,
                            &format!("Not found username: {}", target),
                        )
                        .await?;
                        Ok(DirectiveOutcome::NotFound)
                    }
                }
            }
            Directive::None => Ok(DirectiveOutcome::Skipped),
        }
    }

    /// Post as the relaying user, then make the hub command disappear
    async fn deliver(
        &self,
        source: &WorkspaceHandle,
        trigger: &Trigger,
        destination: &str,
        channel_ref: ChannelRef,
        body: &str,
    ) -> Result<DirectiveOutcome> {
        let posted = source
            .api
            .post_message(destination, body, &PostIdentity::AsUser)
            .await?;

        self.log_cache.put(&source.name, &posted, channel_ref, body);
        self.hub.delete_message(&trigger.channel, &trigger.ts).await?;

        tracing::info!(
            workspace = %source.name,
            destination = %destination,
            "Delivered directive"
        );
        Ok(DirectiveOutcome::Delivered {
            destination: destination.to_string(),
        })
    }

    async fn post_to_hub(
        &self,
        hub_channel: &str,
        text: &str,
        tag: &OriginTag,
    ) -> Result<MessageTs> {
        self.hub
            .post_message(
                &format!("#{}", hub_channel),
                text,
                &PostIdentity::Named(tag.encode()),
            )
            .await
    }

    async fn post_diagnostic(&self, hub_channel: &str, text: &str) -> Result<()> {
        tracing::warn!(hub_channel = %hub_channel, message = %text, "Directive not delivered");
        self.hub
            .post_message(
                &format!("#{}", hub_channel),
                text,
                &PostIdentity::Named(self.bot_name.clone()),
            )
            .await?;
        Ok(())
    }
}

fn is_single_line(text: &str) -> bool {
    text.lines().count() == 1
}

/// `label: body` for one-line bodies, `label:\nbody` otherwise
fn labelled(label: &str, body: &str) -> String {
    if is_single_line(body) {
        format!("{}: {}", label, body)
    } else {
        format!("{}:\n{}", label, body)
    }
}

pub fn format_subtype(subtype: &str, text: &str) -> String {
    format!("SubType: {}\n{}", subtype, text)
}

pub fn format_edited(old: Option<&str>, new: &str) -> String {
    let from = match old {
        Some(body) => labelled("Edited from", body),
        None => "Edited from: (unknown)".to_string(),
    };
    format!("{}\n{}", from, labelled("Edited to", new))
}

pub fn format_deleted(old: Option<&str>) -> String {
    match old {
        Some(body) => labelled("Original Text", body),
        None => "Deleted unknown message".to_string(),
    }
}
