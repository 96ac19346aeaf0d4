mod settings;

pub use settings::{RelayConfig, Settings, WorkspaceConfig, load_settings};
