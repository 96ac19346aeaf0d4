use crate::config::WorkspaceConfig;
use crate::error::{RelayError, Result};
use crate::metadata::{ChannelInfo, UserInfo};
use crate::slack::{
    ChannelId, ChannelPage, ChannelSummary, ChannelType, ChatApi, HistoryMessage, MessageTs,
    PostIdentity,
};
use async_trait::async_trait;
use slack_morphism::prelude::*;
use std::sync::Arc;
use std::time::Instant;

/// Web API client for one workspace
pub struct SlackClient {
    workspace: String,
    client: Arc<SlackHyperClient>,
    app_token: SlackApiToken,
    bot_token: SlackApiToken,
    /// Acts as the relaying user; the bot token when no user token is configured
    user_token: SlackApiToken,
}

impl SlackClient {
    pub fn new(config: &WorkspaceConfig) -> Result<Self> {
        let connector = SlackClientHyperConnector::new()
            .map_err(|e| RelayError::SlackApi(e.to_string()))?;

        let client = Arc::new(slack_morphism::SlackClient::new(connector));
        let bot_token = SlackApiToken::new(config.bot_token.clone().into());
        let user_token = match &config.user_token {
            Some(token) => SlackApiToken::new(token.clone().into()),
            None => {
                tracing::warn!(
                    workspace = %config.name,
                    "No user token configured, posting as the bot instead"
                );
                bot_token.clone()
            }
        };

        Ok(Self {
            workspace: config.name.clone(),
            client,
            app_token: SlackApiToken::new(config.app_token.clone().into()),
            bot_token,
            user_token,
        })
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn get_client(&self) -> Arc<SlackHyperClient> {
        self.client.clone()
    }

    pub fn get_app_token(&self) -> &SlackApiToken {
        &self.app_token
    }

    /// The member of a DM that is not the relaying user (the relaying user for a self-DM)
    async fn dm_counterpart(&self, channel: &SlackChannelId) -> Result<String> {
        let session = self.client.open_session(&self.user_token);

        let me = session
            .auth_test()
            .await
            .map_err(|e| RelayError::SlackApi(e.to_string()))?
            .user_id;

        let request = SlackApiConversationsMembersRequest::new().with_channel(channel.clone());
        let response = session
            .conversations_members(&request)
            .await
            .map_err(|e| RelayError::SlackApi(e.to_string()))?;

        let counterpart = response
            .members
            .iter()
            .find(|member| **member != me)
            .unwrap_or(&me)
            .to_string();

        tracing::debug!(
            workspace = %self.workspace,
            channel = %channel,
            counterpart = %counterpart,
            "Resolved DM counterpart"
        );
        Ok(counterpart)
    }
}

#[async_trait]
impl ChatApi for SlackClient {
    async fn post_message(
        &self,
        destination: &str,
        text: &str,
        identity: &PostIdentity,
    ) -> Result<MessageTs> {
        let token = match identity {
            PostIdentity::AsUser => &self.user_token,
            PostIdentity::Named(_) => &self.bot_token,
        };
        let session = self.client.open_session(token);

        let mut request = SlackApiChatPostMessageRequest::new(
            destination.into(),
            SlackMessageContent::new().with_text(text.into()),
        );

        match identity {
            PostIdentity::AsUser => request.as_user = Some(true),
            PostIdentity::Named(name) => request.username = Some(name.clone()),
        }

        request.unfurl_links = Some(false);
        request.unfurl_media = Some(false);

        let response = session
            .chat_post_message(&request)
            .await
            .map_err(|e| RelayError::SlackApi(e.to_string()))?;

        tracing::debug!(
            workspace = %self.workspace,
            destination = %destination,
            ts = %response.ts,
            "Message posted"
        );

        Ok(MessageTs::new(response.ts.to_string()))
    }

    async fn delete_message(&self, channel: &ChannelId, ts: &MessageTs) -> Result<()> {
        let session = self.client.open_session(&self.user_token);

        let mut request =
            SlackApiChatDeleteRequest::new(channel.as_str().into(), ts.as_str().into());
        request.as_user = Some(true);

        session
            .chat_delete(&request)
            .await
            .map_err(|e| RelayError::SlackApi(e.to_string()))?;

        Ok(())
    }

    async fn list_channels(&self, cursor: Option<&str>) -> Result<ChannelPage> {
        let session = self.client.open_session(&self.user_token);

        let mut request = SlackApiConversationsListRequest::new()
            .with_types(vec![
                SlackConversationType::Public,
                SlackConversationType::Private,
            ])
            .with_exclude_archived(true);

        if let Some(cursor) = cursor {
            request = request.with_cursor(SlackCursorId(cursor.to_string()));
        }

        let response = session
            .conversations_list(&request)
            .await
            .map_err(|e| RelayError::SlackApi(e.to_string()))?;

        let channels = response
            .channels
            .iter()
            .map(|c| ChannelSummary {
                id: ChannelId::new(c.id.to_string()),
                name: c.name.clone().unwrap_or_default(),
                is_channel: c.flags.is_channel.unwrap_or(false),
                is_private: c.flags.is_private.unwrap_or(false),
            })
            .collect::<Vec<_>>();

        let next_cursor = response
            .response_metadata
            .and_then(|meta| meta.next_cursor)
            .map(|c| c.to_string())
            .filter(|c| !c.is_empty());

        tracing::debug!(
            workspace = %self.workspace,
            count = channels.len(),
            has_more = next_cursor.is_some(),
            "Fetched channel page"
        );

        Ok(ChannelPage {
            channels,
            next_cursor,
        })
    }

    async fn list_users(&self) -> Result<Vec<UserInfo>> {
        let session = self.client.open_session(&self.bot_token);

        let response = session
            .users_list(&SlackApiUsersListRequest::new())
            .await
            .map_err(|e| RelayError::SlackApi(e.to_string()))?;

        Ok(response.members.into_iter().map(user_info_from).collect())
    }

    async fn fetch_message_at(
        &self,
        channel: &ChannelId,
        ts: &MessageTs,
    ) -> Result<HistoryMessage> {
        let session = self.client.open_session(&self.bot_token);

        let request = SlackApiConversationsHistoryRequest::new()
            .with_channel(channel.as_str().into())
            .with_latest(ts.as_str().into())
            .with_oldest(ts.as_str().into())
            .with_inclusive(true)
            .with_limit(1);

        let response = session
            .conversations_history(&request)
            .await
            .map_err(|e| RelayError::SlackApi(e.to_string()))?;

        match response.messages.as_slice() {
            [message] => Ok(HistoryMessage {
                ts: MessageTs::new(message.origin.ts.to_string()),
                username: message.sender.username.clone(),
                text: message.content.text.clone().unwrap_or_default(),
            }),
            other => Err(RelayError::NotFound(format!(
                "history of {} at {} returned {} messages",
                channel,
                ts,
                other.len()
            ))),
        }
    }

    async fn get_channel_info(&self, channel_id: &str) -> Result<ChannelInfo> {
        let session = self.client.open_session(&self.user_token);

        let request = SlackApiConversationsInfoRequest::new(SlackChannelId(channel_id.to_string()));

        let response = session
            .conversations_info(&request)
            .await
            .map_err(|e| RelayError::SlackApi(e.to_string()))?;

        let channel = response.channel;

        let channel_type = if channel.flags.is_im.unwrap_or(false) {
            ChannelType::DirectMessage
        } else if channel.flags.is_private.unwrap_or(false)
            || channel.flags.is_mpim.unwrap_or(false)
        {
            ChannelType::PrivateGroup
        } else {
            ChannelType::PublicChannel
        };

        let counterpart = match channel_type {
            ChannelType::DirectMessage => Some(self.dm_counterpart(&channel.id).await?),
            _ => None,
        };

        Ok(ChannelInfo {
            id: channel.id.to_string(),
            name: channel.name.unwrap_or_else(|| channel_id.to_string()),
            channel_type,
            counterpart,
            fetched_at: Instant::now(),
        })
    }

    async fn get_user_info(&self, user_id: &str) -> Result<UserInfo> {
        let session = self.client.open_session(&self.bot_token);

        let request = SlackApiUsersInfoRequest::new(SlackUserId(user_id.to_string()));

        let response = session
            .users_info(&request)
            .await
            .map_err(|e| RelayError::SlackApi(e.to_string()))?;

        Ok(user_info_from(response.user))
    }
}

fn user_info_from(user: SlackUser) -> UserInfo {
    let id = user.id.to_string();
    UserInfo {
        name: user.name.unwrap_or_else(|| id.clone()),
        id,
        real_name: user.real_name,
        display_name: user
            .profile
            .as_ref()
            .and_then(|p| p.display_name.clone())
            .filter(|n| !n.is_empty()),
        fetched_at: Instant::now(),
    }
}
