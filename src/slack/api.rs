//! Narrow view of the chat platform consumed by the relay core

use crate::error::Result;
use crate::metadata::{ChannelInfo, UserInfo};
use crate::slack::{ChannelId, ChannelPage, HistoryMessage, MessageTs, PostIdentity};
use async_trait::async_trait;

/// Web API calls made against one workspace.
///
/// Implemented by [`crate::slack::SlackClient`]; tests substitute an in-memory fake.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Post `text` to a channel name (`#eng`), channel id or user id
    async fn post_message(
        &self,
        destination: &str,
        text: &str,
        identity: &PostIdentity,
    ) -> Result<MessageTs>;

    async fn delete_message(&self, channel: &ChannelId, ts: &MessageTs) -> Result<()>;

    /// One page of public and private, non-archived channels
    async fn list_channels(&self, cursor: Option<&str>) -> Result<ChannelPage>;

    async fn list_users(&self) -> Result<Vec<UserInfo>>;

    /// The single message at exactly `ts` in `channel`
    async fn fetch_message_at(&self, channel: &ChannelId, ts: &MessageTs)
    -> Result<HistoryMessage>;

    async fn get_channel_info(&self, channel_id: &str) -> Result<ChannelInfo>;

    async fn get_user_info(&self, user_id: &str) -> Result<UserInfo>;
}
