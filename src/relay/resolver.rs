//! Turns readable names back into post destinations

use crate::error::{RelayError, Result};
use crate::logging::Timer;
use crate::relay::codec::OriginTag;
use crate::relay::log_cache::{ChannelRef, LogCache, LogEntry};
use crate::slack::{ChannelId, ChannelSummary, ChannelType, ChatApi, MessageTs, ThreadTs, UserId};
use std::sync::Arc;

/// Outcome of a channel-prefix lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ChannelSummary),
    NoMatch,
    /// Every channel whose name starts with the prefix, in listing order
    Ambiguous(Vec<ChannelSummary>),
}

pub struct ChannelResolver {
    log_cache: Arc<LogCache>,
}

impl ChannelResolver {
    pub fn new(log_cache: Arc<LogCache>) -> Self {
        Self { log_cache }
    }

    /// Concatenate every page of the channel listing
    pub async fn list_all_channels(api: &dyn ChatApi) -> Result<Vec<ChannelSummary>> {
        let _timer = Timer::new("list_all_channels");

        let mut page = api.list_channels(None).await?;
        let mut channels = std::mem::take(&mut page.channels);

        while let Some(cursor) = page.next_cursor.take() {
            page = api.list_channels(Some(&cursor)).await?;
            channels.append(&mut page.channels);
        }

        tracing::debug!(count = channels.len(), "Listed channels");
        Ok(channels)
    }

    /// Find the single channel whose name starts with `prefix` (case-sensitive)
    pub async fn resolve_channel(&self, api: &dyn ChatApi, prefix: &str) -> Result<Resolution> {
        let mut candidates: Vec<ChannelSummary> = Self::list_all_channels(api)
            .await?
            .into_iter()
            .filter(|c| c.name.starts_with(prefix))
            .collect();

        tracing::debug!(
            prefix = %prefix,
            candidates = candidates.len(),
            "Resolved channel prefix"
        );

        Ok(match candidates.len() {
            0 => Resolution::NoMatch,
            1 => Resolution::Found(candidates.remove(0)),
            _ => Resolution::Ambiguous(candidates),
        })
    }

    /// Exact display-name match over the full user list
    pub async fn resolve_user(&self, api: &dyn ChatApi, name: &str) -> Result<Option<UserId>> {
        let users = api.list_users().await?;

        let found = users
            .iter()
            .find(|u| u.display_name.as_deref() == Some(name))
            .map(|u| UserId::new(u.id.clone()));

        tracing::debug!(name = %name, found = found.is_some(), "Resolved user");
        Ok(found)
    }

    /// User behind the channel name of a `d` origin tag: display name, else handle
    async fn resolve_tagged_user(&self, api: &dyn ChatApi, name: &str) -> Result<Option<UserId>> {
        if let Some(id) = self.resolve_user(api, name).await? {
            return Ok(Some(id));
        }

        let found = api
            .list_users()
            .await?
            .into_iter()
            .find(|u| u.name == name)
            .map(|u| UserId::new(u.id));

        tracing::debug!(name = %name, found = found.is_some(), "Resolved user by handle");
        Ok(found)
    }

    /// Log entry for the hub message a thread hangs off.
    ///
    /// Falls back to reading the root from hub history when the cache no longer
    /// has it, and caches the reconstructed entry.
    pub async fn thread_root(
        &self,
        hub: &dyn ChatApi,
        workspace: &str,
        hub_channel: &ChannelId,
        thread_ts: &ThreadTs,
    ) -> Result<LogEntry> {
        let root_ts = MessageTs::from(thread_ts.clone());

        if let Some(entry) = self.log_cache.get(workspace, &root_ts) {
            tracing::debug!(workspace = %workspace, ts = %root_ts, "Thread root cache hit");
            return Ok(entry);
        }

        tracing::info!(
            workspace = %workspace,
            ts = %root_ts,
            "Thread root not cached, reading hub history"
        );

        let message = hub.fetch_message_at(hub_channel, &root_ts).await?;
        let username = message.username.unwrap_or_default();
        let tag = OriginTag::decode(&username).ok_or(RelayError::OriginTag(username))?;

        self.log_cache
            .put(workspace, &root_ts, tag.channel_ref(), message.text.clone());

        Ok(LogEntry {
            workspace: workspace.to_string(),
            timestamp: root_ts,
            channel: tag.channel_ref(),
            body: message.text,
        })
    }

    /// Destination string that `api.post_message` accepts for `channel`
    pub async fn destination_for(&self, api: &dyn ChatApi, channel: &ChannelRef) -> Result<String> {
        match channel {
            ChannelRef::Tagged {
                channel_type: ChannelType::PublicChannel,
                name,
            } => Ok(format!("#{}", name)),
            ChannelRef::Tagged {
                channel_type: ChannelType::PrivateGroup,
                name,
            } => Ok(name.clone()),
            ChannelRef::Tagged {
                channel_type: ChannelType::DirectMessage,
                name,
            } => self
                .resolve_tagged_user(api, name)
                .await?
                .map(|id| id.0)
                .ok_or_else(|| RelayError::NotFound(format!("user {}", name))),
            ChannelRef::Id(id) => Ok(id.as_str().to_string()),
        }
    }
}
