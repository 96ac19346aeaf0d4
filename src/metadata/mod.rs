//! Metadata management for channel and user lookups
//!
//! Lazy-loading TTL cache per workspace, used to turn the ids carried by
//! events into the readable names that appear in origin tags.

mod cache;
mod types;

pub use cache::{CacheStats, MetadataCache};
pub use types::{ChannelInfo, UserInfo};
