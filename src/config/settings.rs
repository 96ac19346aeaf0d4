use crate::error::{RelayError, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub hub: WorkspaceConfig,
    pub workspaces: Vec<WorkspaceConfig>,
    pub relay: RelayConfig,
}

/// Credentials for one Slack workspace
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    pub name: String,
    /// App-level token (xapp-...) for Socket Mode
    pub app_token: String,
    /// Bot token (xoxb-...) for listings and named posts
    pub bot_token: String,
    /// User token (xoxp-...) for posting and deleting as the relaying user
    pub user_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub channel_prefix: String,
    pub bot_name: String,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub cache_sweep_interval: Duration,
}

impl RelayConfig {
    /// Hub channel that mirrors the given source workspace
    pub fn hub_channel_name(&self, workspace: &str) -> String {
        format!("{}{}", self.channel_prefix, workspace.to_lowercase())
    }
}

impl Settings {
    /// Build settings from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let hub = workspace_from_lookup(&lookup, "hub", "HUB")?;

        let names = lookup("RELAY_WORKSPACES")
            .ok_or_else(|| RelayError::Config("RELAY_WORKSPACES not set".to_string()))?;
        let workspaces = names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| workspace_from_lookup(&lookup, name, &env_prefix(name)))
            .collect::<Result<Vec<_>>>()?;

        if workspaces.is_empty() {
            return Err(RelayError::Config(
                "RELAY_WORKSPACES lists no workspaces".to_string(),
            ));
        }

        let relay = RelayConfig {
            channel_prefix: lookup("RELAY_CHANNEL_PREFIX").unwrap_or_else(|| "aggr-".to_string()),
            bot_name: lookup("RELAY_BOT_NAME").unwrap_or_else(|| "aguri".to_string()),
            cache_capacity: parse_or(&lookup, "RELAY_CACHE_CAPACITY", 10_000)?,
            cache_ttl: Duration::from_secs(parse_or(&lookup, "RELAY_CACHE_TTL_SECS", 86_400)?),
            cache_sweep_interval: Duration::from_secs(parse_or(
                &lookup,
                "RELAY_CACHE_SWEEP_SECS",
                600,
            )?),
        };

        Ok(Self {
            hub,
            workspaces,
            relay,
        })
    }
}

pub fn load_settings() -> Result<Settings> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    Settings::from_lookup(|key| std::env::var(key).ok())
}

/// `my-team` -> `MY_TEAM`
fn env_prefix(name: &str) -> String {
    name.to_uppercase().replace('-', "_")
}

fn workspace_from_lookup<F>(lookup: &F, name: &str, prefix: &str) -> Result<WorkspaceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |suffix: &str| {
        let key = format!("{}_{}", prefix, suffix);
        lookup(&key).ok_or_else(|| RelayError::Config(format!("{} not set", key)))
    };

    Ok(WorkspaceConfig {
        name: name.to_string(),
        app_token: required("APP_TOKEN")?,
        bot_token: required("BOT_TOKEN")?,
        user_token: lookup(&format!("{}_USER_TOKEN", prefix)),
    })
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RelayError::Config(format!("Invalid {}", key))),
        None => Ok(default),
    }
}
