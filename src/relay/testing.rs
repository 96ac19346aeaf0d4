//! In-memory `ChatApi` used by unit tests

use crate::error::{RelayError, Result};
use crate::metadata::{ChannelInfo, UserInfo};
use crate::slack::{
    ChannelId, ChannelPage, ChannelSummary, ChannelType, ChatApi, HistoryMessage, MessageTs,
    PostIdentity,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub destination: String,
    pub text: String,
    pub identity: PostIdentity,
    pub ts: MessageTs,
}

#[derive(Default)]
pub struct FakeApi {
    pages: Vec<Vec<ChannelSummary>>,
    users: Vec<UserInfo>,
    channel_infos: HashMap<String, ChannelInfo>,
    history: HashMap<(String, String), HistoryMessage>,
    fail_posts: bool,
    fail_listing: bool,
    fail_deletes: bool,
    posts: Mutex<Vec<Post>>,
    deletions: Mutex<Vec<(ChannelId, MessageTs)>>,
    list_calls: AtomicUsize,
    history_calls: AtomicUsize,
}

pub fn public(name: &str) -> ChannelSummary {
    ChannelSummary {
        id: ChannelId::new(format!("C-{}", name)),
        name: name.to_string(),
        is_channel: true,
        is_private: false,
    }
}

pub fn private(name: &str) -> ChannelSummary {
    ChannelSummary {
        id: ChannelId::new(format!("G-{}", name)),
        name: name.to_string(),
        is_channel: false,
        is_private: true,
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call adds one page to the cursor-driven listing
    pub fn with_page(mut self, channels: Vec<ChannelSummary>) -> Self {
        self.pages.push(channels);
        self
    }

    pub fn with_user(mut self, id: &str, display_name: &str) -> Self {
        self.users.push(UserInfo {
            id: id.to_string(),
            name: id.to_lowercase(),
            real_name: None,
            display_name: Some(display_name.to_string()).filter(|n| !n.is_empty()),
            fetched_at: Instant::now(),
        });
        self
    }

    pub fn with_channel_info(mut self, id: &str, name: &str, channel_type: ChannelType) -> Self {
        self.channel_infos.insert(
            id.to_string(),
            ChannelInfo {
                id: id.to_string(),
                name: name.to_string(),
                channel_type,
                counterpart: None,
                fetched_at: Instant::now(),
            },
        );
        self
    }

    /// A direct message channel whose other member is `counterpart`
    pub fn with_dm(mut self, id: &str, counterpart: &str) -> Self {
        self.channel_infos.insert(
            id.to_string(),
            ChannelInfo {
                id: id.to_string(),
                name: id.to_string(),
                channel_type: ChannelType::DirectMessage,
                counterpart: Some(counterpart.to_string()),
                fetched_at: Instant::now(),
            },
        );
        self
    }

    pub fn with_history(
        mut self,
        channel: &str,
        ts: &str,
        username: Option<&str>,
        text: &str,
    ) -> Self {
        self.history.insert(
            (channel.to_string(), ts.to_string()),
            HistoryMessage {
                ts: MessageTs::new(ts),
                username: username.map(str::to_string),
                text: text.to_string(),
            },
        );
        self
    }

    pub fn failing_posts(mut self) -> Self {
        self.fail_posts = true;
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    pub fn deletions(&self) -> Vec<(ChannelId, MessageTs)> {
        self.deletions.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatApi for FakeApi {
    async fn post_message(
        &self,
        destination: &str,
        text: &str,
        identity: &PostIdentity,
    ) -> Result<MessageTs> {
        if self.fail_posts {
            return Err(RelayError::SlackApi("channel_not_found".to_string()));
        }

        let mut posts = self.posts.lock().unwrap();
        let ts = MessageTs::new(format!("9000.{:06}", posts.len() + 1));
        posts.push(Post {
            destination: destination.to_string(),
            text: text.to_string(),
            identity: identity.clone(),
            ts: ts.clone(),
        });
        Ok(ts)
    }

    async fn delete_message(&self, channel: &ChannelId, ts: &MessageTs) -> Result<()> {
        if self.fail_deletes {
            return Err(RelayError::SlackApi("cant_delete_message".to_string()));
        }
        self.deletions
            .lock()
            .unwrap()
            .push((channel.clone(), ts.clone()));
        Ok(())
    }

    async fn list_channels(&self, cursor: Option<&str>) -> Result<ChannelPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(RelayError::SlackApi("ratelimited".to_string()));
        }

        let index = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| RelayError::SlackApi(format!("invalid_cursor {}", c)))?,
        };

        let channels = self.pages.get(index).cloned().unwrap_or_default();
        let next_cursor = (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1));

        Ok(ChannelPage {
            channels,
            next_cursor,
        })
    }

    async fn list_users(&self) -> Result<Vec<UserInfo>> {
        Ok(self.users.clone())
    }

    async fn fetch_message_at(
        &self,
        channel: &ChannelId,
        ts: &MessageTs,
    ) -> Result<HistoryMessage> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.history
            .get(&(channel.as_str().to_string(), ts.as_str().to_string()))
            .cloned()
            .ok_or_else(|| RelayError::NotFound(format!("{} at {}", channel, ts)))
    }

    async fn get_channel_info(&self, channel_id: &str) -> Result<ChannelInfo> {
        self.channel_infos
            .get(channel_id)
            .cloned()
            .ok_or_else(|| RelayError::SlackApi("channel_not_found".to_string()))
    }

    async fn get_user_info(&self, user_id: &str) -> Result<UserInfo> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| RelayError::SlackApi("user_not_found".to_string()))
    }
}
