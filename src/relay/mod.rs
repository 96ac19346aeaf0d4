//! Cross-workspace relay core
//!
//! Source traffic is tagged and posted into per-workspace hub channels; hub
//! replies and directives are routed back using the tag or the log cache.

mod codec;
mod dispatcher;
mod log_cache;
mod registry;
mod resolver;
mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use codec::{Directive, OriginTag};
pub use dispatcher::{
    DirectiveOutcome, RelayDispatcher, Trigger, format_deleted, format_edited, format_subtype,
};
pub use log_cache::{ChannelRef, LogCache, LogEntry};
pub use registry::{WorkspaceHandle, Workspaces};
pub use resolver::{ChannelResolver, Resolution};
pub use router::{EventKind, EventRouter, Route, Side, classify};
