//! Metadata types for channel and user lookups

use crate::slack::ChannelType;
use std::time::{Duration, Instant};

/// Channel metadata information
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    /// Channel ID (e.g., C09NU1KFXHT)
    pub id: String,

    /// Channel name without # (e.g., "engineering"); the ID for DMs
    pub name: String,

    pub channel_type: ChannelType,

    /// For DMs, the user on the other side of the conversation
    pub counterpart: Option<String>,

    /// When this info was last fetched
    pub fetched_at: Instant,
}

impl ChannelInfo {
    /// Check if this cache entry is stale (older than TTL)
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() > ttl
    }
}

/// User metadata information
#[derive(Debug, Clone)]
pub struct UserInfo {
    /// User ID (e.g., U09JDBT2MCM)
    pub id: String,

    /// Username/handle (e.g., "john.doe")
    pub name: String,

    /// Real name (e.g., "John Doe")
    pub real_name: Option<String>,

    /// Display name (what shows in Slack)
    pub display_name: Option<String>,

    /// When this info was last fetched
    pub fetched_at: Instant,
}

impl UserInfo {
    /// Check if this cache entry is stale
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() > ttl
    }

    /// Get best available name for display
    pub fn best_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.real_name.as_deref())
            .unwrap_or(&self.name)
    }
}
