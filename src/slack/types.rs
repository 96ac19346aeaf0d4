use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadTs(pub String);

impl ThreadTs {
    pub fn new(ts: impl Into<String>) -> Self {
        Self(ts.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Slack message timestamp, e.g. `1761520471.000200`. Unique only within a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageTs(pub String);

impl MessageTs {
    pub fn new(ts: impl Into<String>) -> Self {
        Self(ts.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wall-clock time encoded in the seconds part, if it parses
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let secs = self.0.split('.').next()?.parse::<i64>().ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

impl fmt::Display for MessageTs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ThreadTs> for MessageTs {
    fn from(ts: ThreadTs) -> Self {
        Self(ts.0)
    }
}

/// Conversation kind as carried in an origin tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    /// `c`
    PublicChannel,
    /// `d`
    DirectMessage,
    /// `g`
    PrivateGroup,
}

impl ChannelType {
    pub fn code(self) -> char {
        match self {
            ChannelType::PublicChannel => 'c',
            ChannelType::DirectMessage => 'd',
            ChannelType::PrivateGroup => 'g',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'c' => Some(ChannelType::PublicChannel),
            'd' => Some(ChannelType::DirectMessage),
            'g' => Some(ChannelType::PrivateGroup),
            _ => None,
        }
    }

    /// Map Slack's event `channel_type` field (`channel`, `group`, `im`, `mpim`)
    pub fn from_event_kind(kind: &str) -> Option<Self> {
        match kind {
            "channel" => Some(ChannelType::PublicChannel),
            "group" | "mpim" => Some(ChannelType::PrivateGroup),
            "im" => Some(ChannelType::DirectMessage),
            _ => None,
        }
    }
}

/// Message subtype after classification; plain messages carry `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSubtype {
    Changed,
    Deleted,
    Other(String),
}

impl MessageSubtype {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "" => None,
            "message_changed" => Some(MessageSubtype::Changed),
            "message_deleted" => Some(MessageSubtype::Deleted),
            other => Some(MessageSubtype::Other(other.to_string())),
        }
    }
}

/// New content of an edited message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedMessage {
    pub ts: MessageTs,
    pub text: String,
}

/// Platform-neutral message event, as delivered by a workspace subscription
#[derive(Debug, Clone, Default)]
pub struct RelayEvent {
    pub channel: Option<ChannelId>,
    pub channel_type: Option<ChannelType>,
    pub user: Option<UserId>,
    /// Display name override, set on messages posted under a custom username
    pub username: Option<String>,
    pub text: String,
    pub ts: Option<MessageTs>,
    pub thread_ts: Option<ThreadTs>,
    pub subtype: Option<MessageSubtype>,
    pub edited: Option<EditedMessage>,
    pub deleted_ts: Option<MessageTs>,
}

/// Who a post appears to come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostIdentity {
    /// Post as the token's own user (impersonation of the relaying user)
    AsUser,
    /// Post under a custom display name
    Named(String),
}

/// A channel as returned by a conversation listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub id: ChannelId,
    pub name: String,
    pub is_channel: bool,
    pub is_private: bool,
}

impl ChannelSummary {
    /// Address usable as a post destination: `#name` for public channels, the raw name otherwise
    pub fn destination(&self) -> String {
        if self.is_channel && !self.is_private {
            format!("#{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// One page of a cursor-driven listing
#[derive(Debug, Clone, Default)]
pub struct ChannelPage {
    pub channels: Vec<ChannelSummary>,
    pub next_cursor: Option<String>,
}

/// A single message returned from channel history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryMessage {
    pub ts: MessageTs,
    pub username: Option<String>,
    pub text: String,
}
