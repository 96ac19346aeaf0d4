//! Ephemeral record of what has been relayed, keyed by `(workspace, timestamp)`
//!
//! Slack timestamps are unique per channel only; two channels of one workspace
//! posting in the same microsecond share a slot here.

use crate::slack::{ChannelId, ChannelType, MessageTs};
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Where a relayed message lives on the source side
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// Readable name recovered from an origin tag
    Tagged {
        channel_type: ChannelType,
        name: String,
    },
    /// Opaque channel id, when no readable name is known
    Id(ChannelId),
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRef::Tagged { channel_type, name } => {
                write!(f, "{}:{}", channel_type.code(), name)
            }
            ChannelRef::Id(id) => write!(f, "{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub workspace: String,
    pub timestamp: MessageTs,
    pub channel: ChannelRef,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LogKey {
    workspace: String,
    timestamp: String,
}

impl LogKey {
    fn new(workspace: &str, timestamp: &MessageTs) -> Self {
        Self {
            workspace: workspace.to_string(),
            timestamp: timestamp.as_str().to_string(),
        }
    }
}

struct Slot {
    entry: LogEntry,
    stored_at: Instant,
    seq: u64,
}

/// Bounded, thread-safe log cache shared by every workspace stream
pub struct LogCache {
    entries: DashMap<LogKey, Slot>,
    capacity: usize,
    ttl: Duration,
    next_seq: AtomicU64,
}

impl LogCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        tracing::info!(
            capacity = capacity,
            ttl_secs = ttl.as_secs(),
            "Creating relay log cache"
        );

        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            ttl,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Store an entry, replacing whatever occupied the slot
    pub fn put(
        &self,
        workspace: &str,
        timestamp: &MessageTs,
        channel: ChannelRef,
        body: impl Into<String>,
    ) {
        let entry = LogEntry {
            workspace: workspace.to_string(),
            timestamp: timestamp.clone(),
            channel,
            body: body.into(),
        };

        tracing::trace!(
            workspace = %workspace,
            ts = %timestamp,
            channel = %entry.channel,
            "Log cache put"
        );

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            LogKey::new(workspace, timestamp),
            Slot {
                entry,
                stored_at: Instant::now(),
                seq,
            },
        );

        if self.entries.len() > self.capacity {
            self.evict_oldest();
        }
    }

    /// Look up an entry; expired entries read as absent
    pub fn get(&self, workspace: &str, timestamp: &MessageTs) -> Option<LogEntry> {
        let slot = self.entries.get(&LogKey::new(workspace, timestamp))?;
        if slot.stored_at.elapsed() > self.ttl {
            return None;
        }
        Some(slot.entry.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries older than the TTL, returning how many were removed
    pub fn evict_expired(&self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.stored_at.elapsed() <= ttl);
        let removed = before.saturating_sub(self.entries.len());

        if removed > 0 {
            tracing::debug!(
                removed_count = removed,
                remaining = self.entries.len(),
                "Evicted expired log entries"
            );
        }
        removed
    }

    /// Trim to 90% of capacity, oldest insertions first
    fn evict_oldest(&self) {
        let target = self.capacity - self.capacity / 10;
        let mut by_age: Vec<(u64, LogKey)> = self
            .entries
            .iter()
            .map(|item| (item.value().seq, item.key().clone()))
            .collect();

        let excess = by_age.len().saturating_sub(target);
        if excess == 0 {
            return;
        }

        by_age.sort_unstable_by_key(|(seq, _)| *seq);
        for (_, key) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }

        tracing::debug!(
            removed_count = excess,
            capacity = self.capacity,
            "Log cache over capacity, evicted oldest entries"
        );
    }
}
