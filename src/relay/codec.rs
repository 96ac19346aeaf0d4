//! Addressing grammar carried in display names and hub-side message text
//!
//! ```text
//! origin-tag        = readable-name "@" channel-type ":" channel-name
//! channel-type      = "c" / "d" / "g"
//! channel-directive = name "#" body
//! im-directive      = name "@" body
//! ```

use crate::relay::log_cache::ChannelRef;
use crate::slack::ChannelType;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static ORIGIN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)@([cdg]):(\S+)$").unwrap());

/// Display name stamped on every message relayed into the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginTag {
    pub readable_name: String,
    pub channel_type: ChannelType,
    pub channel_name: String,
}

impl OriginTag {
    pub fn new(
        readable_name: impl Into<String>,
        channel_type: ChannelType,
        channel_name: impl Into<String>,
    ) -> Self {
        Self {
            readable_name: readable_name.into(),
            channel_type,
            channel_name: channel_name.into(),
        }
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parse a display name; `None` means it was written by a human, not relayed
    pub fn decode(display_name: &str) -> Option<Self> {
        let caps = ORIGIN_TAG.captures(display_name)?;
        let channel_type = ChannelType::from_code(caps[2].chars().next()?)?;

        Some(Self {
            readable_name: caps[1].to_string(),
            channel_type,
            channel_name: caps[3].to_string(),
        })
    }

    pub fn channel_ref(&self) -> ChannelRef {
        ChannelRef::Tagged {
            channel_type: self.channel_type,
            name: self.channel_name.clone(),
        }
    }
}

impl fmt::Display for OriginTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{}",
            self.readable_name,
            self.channel_type.code(),
            self.channel_name
        )
    }
}

/// Hub-side command recognised in message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `name#body`: post to the channel whose name starts with `target`
    Channel { target: String, body: String },
    /// `name@body`: direct message to the user displayed as `target`
    Im { target: String, body: String },
    None,
}

impl Directive {
    /// Channel form wins over IM form when both could apply.
    pub fn parse(text: &str) -> Self {
        if let Some((target, body)) = split_directive(text, '#') {
            return Directive::Channel {
                target: target.to_string(),
                body: body.to_string(),
            };
        }

        if let Some((target, body)) = split_directive(text, '@') {
            return Directive::Im {
                target: target.to_string(),
                body: body.to_string(),
            };
        }

        Directive::None
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            Directive::Channel { target, .. } | Directive::Im { target, .. } => Some(target),
            Directive::None => None,
        }
    }
}

/// Split at the first `delimiter`. Directives are single lines; the target must
/// be a non-empty run of non-whitespace characters and the body must have visible
/// content.
fn split_directive(text: &str, delimiter: char) -> Option<(&str, &str)> {
    if text.contains('\n') {
        return None;
    }

    let idx = text.find(delimiter)?;
    let target = &text[..idx];
    let body = &text[idx + delimiter.len_utf8()..];

    if target.is_empty() || target.chars().any(char::is_whitespace) {
        return None;
    }
    if body.trim().is_empty() {
        return None;
    }

    Some((target, body))
}
