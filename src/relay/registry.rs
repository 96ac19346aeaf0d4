use crate::error::{RelayError, Result};
use crate::metadata::MetadataCache;
use crate::slack::ChatApi;
use std::collections::HashMap;
use std::sync::Arc;

/// API client and metadata for one connected workspace
#[derive(Clone)]
pub struct WorkspaceHandle {
    pub name: String,
    pub api: Arc<dyn ChatApi>,
    pub metadata: Arc<MetadataCache>,
}

impl WorkspaceHandle {
    pub fn new(name: impl Into<String>, api: Arc<dyn ChatApi>) -> Self {
        let metadata = Arc::new(MetadataCache::new(api.clone()));
        Self {
            name: name.into(),
            api,
            metadata,
        }
    }
}

/// The hub plus every source workspace, looked up case-insensitively by name
pub struct Workspaces {
    hub: WorkspaceHandle,
    sources: HashMap<String, WorkspaceHandle>,
}

impl Workspaces {
    pub fn new(hub: WorkspaceHandle, sources: impl IntoIterator<Item = WorkspaceHandle>) -> Self {
        let sources = sources
            .into_iter()
            .map(|handle| (handle.name.to_lowercase(), handle))
            .collect();
        Self { hub, sources }
    }

    pub fn hub(&self) -> &WorkspaceHandle {
        &self.hub
    }

    pub fn source(&self, name: &str) -> Result<&WorkspaceHandle> {
        self.sources
            .get(&name.to_lowercase())
            .ok_or_else(|| RelayError::UnknownWorkspace(name.to_string()))
    }

    pub fn sources(&self) -> impl Iterator<Item = &WorkspaceHandle> {
        self.sources.values()
    }

    /// Drop stale channel/user metadata everywhere
    pub async fn cleanup_metadata(&self) {
        self.hub.metadata.cleanup_stale(&self.hub.name).await;
        for source in self.sources.values() {
            source.metadata.cleanup_stale(&source.name).await;
        }
    }
}
