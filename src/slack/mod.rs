mod api;
mod client;
mod events;
mod types;

pub use api::ChatApi;
pub use client::SlackClient;
pub use events::EventListener;
pub use types::{
    ChannelId, ChannelPage, ChannelSummary, ChannelType, EditedMessage, HistoryMessage,
    MessageSubtype, MessageTs, PostIdentity, RelayEvent, ThreadTs, UserId,
};
