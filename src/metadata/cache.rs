//! Metadata cache for lazy-loading channel and user information

use crate::error::Result;
use crate::metadata::types::{ChannelInfo, UserInfo};
use crate::slack::ChatApi;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache statistics for monitoring
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub channel_hits: u64,
    pub channel_misses: u64,
    pub user_hits: u64,
    pub user_misses: u64,
    pub api_calls: u64,
    pub api_errors: u64,
}

/// Per-workspace metadata cache with lazy-loading from the Web API
///
/// Only fetches data on-demand when a channel or user shows up in an event.
pub struct MetadataCache {
    api: Arc<dyn ChatApi>,

    /// Channel metadata cache (lazy-populated)
    channels: DashMap<String, ChannelInfo>,

    /// User metadata cache (lazy-populated)
    users: DashMap<String, UserInfo>,

    /// Cache TTL (how long before refresh)
    ttl: Duration,

    stats: RwLock<CacheStats>,
}

impl MetadataCache {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self::with_ttl(api, Duration::from_secs(3600))
    }

    pub fn with_ttl(api: Arc<dyn ChatApi>, ttl: Duration) -> Self {
        Self {
            api,
            channels: DashMap::new(),
            users: DashMap::new(),
            ttl,
            stats: RwLock::new(CacheStats::default()),
        }
    }

    /// Get channel info (fetch if not cached or stale)
    pub async fn get_channel_info(&self, channel_id: &str) -> Option<ChannelInfo> {
        if let Some(info) = self.channels.get(channel_id) {
            if !info.is_stale(self.ttl) {
                self.stats.write().await.channel_hits += 1;
                tracing::trace!(
                    channel_id = %channel_id,
                    channel = %info.name,
                    "Channel cache hit"
                );
                return Some(info.clone());
            }
        }

        self.stats.write().await.channel_misses += 1;
        tracing::debug!(
            channel_id = %channel_id,
            "Channel cache miss, fetching from Slack API"
        );

        match self.fetch_channel_info(channel_id).await {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(
                    channel_id = %channel_id,
                    error = %e,
                    "Failed to fetch channel info"
                );
                None
            }
        }
    }

    /// Get user info (fetch if not cached or stale)
    pub async fn get_user_info(&self, user_id: &str) -> Option<UserInfo> {
        if let Some(info) = self.users.get(user_id) {
            if !info.is_stale(self.ttl) {
                self.stats.write().await.user_hits += 1;
                tracing::trace!(
                    user_id = %user_id,
                    user = %info.name,
                    "User cache hit"
                );
                return Some(info.clone());
            }
        }

        self.stats.write().await.user_misses += 1;
        tracing::debug!(
            user_id = %user_id,
            "User cache miss, fetching from Slack API"
        );

        match self.fetch_user_info(user_id).await {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Failed to fetch user info"
                );
                None
            }
        }
    }

    async fn fetch_channel_info(&self, channel_id: &str) -> Result<ChannelInfo> {
        self.stats.write().await.api_calls += 1;

        match self.api.get_channel_info(channel_id).await {
            Ok(info) => {
                self.channels.insert(channel_id.to_string(), info.clone());
                Ok(info)
            }
            Err(e) => {
                self.stats.write().await.api_errors += 1;
                Err(e)
            }
        }
    }

    async fn fetch_user_info(&self, user_id: &str) -> Result<UserInfo> {
        self.stats.write().await.api_calls += 1;

        match self.api.get_user_info(user_id).await {
            Ok(info) => {
                self.users.insert(user_id.to_string(), info.clone());
                Ok(info)
            }
            Err(e) => {
                self.stats.write().await.api_errors += 1;
                Err(e)
            }
        }
    }

    pub async fn get_stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    pub fn cache_sizes(&self) -> (usize, usize) {
        (self.channels.len(), self.users.len())
    }

    /// Clear stale entries (for periodic cleanup) and report cache health
    pub async fn cleanup_stale(&self, workspace: &str) {
        let ttl = self.ttl;
        let initial = self.channels.len() + self.users.len();

        self.channels.retain(|_, info| !info.is_stale(ttl));
        self.users.retain(|_, info| !info.is_stale(ttl));

        let (channels, users) = self.cache_sizes();
        let removed = initial.saturating_sub(channels + users);
        let stats = self.get_stats().await;

        tracing::debug!(
            workspace = %workspace,
            removed = removed,
            channels = channels,
            users = users,
            channel_hits = stats.channel_hits,
            channel_misses = stats.channel_misses,
            user_hits = stats.user_hits,
            user_misses = stats.user_misses,
            api_calls = stats.api_calls,
            api_errors = stats.api_errors,
            "Metadata cache sweep"
        );
    }
}
