//! Upstream provider configuration and webhook path parameters.

use std::time::Duration;

use serde::Deserialize;

/// Default upstream webhook provider.
pub const DEFAULT_UPSTREAM_URL: &str = "https://hooks.slack.com";

/// Settings for the call to the upstream webhook provider.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Provider base URL; hooks are posted to `{base_url}/services/T/B/X`.
    pub base_url: String,
    /// Skip certificate verification for the provider. Off by default.
    pub insecure: bool,
    /// Upper bound for the whole upstream exchange.
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.into(),
            insecure: false,
            timeout: Duration::from_secs(10),
        }
    }
}

impl UpstreamConfig {
    pub fn hook_url(&self, path: &HookPath) -> String {
        format!(
            "{}/services/{}",
            self.base_url.trim_end_matches('/'),
            path.joined()
        )
    }
}

/// The three path segments identifying a webhook (team, bot, token).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HookPath {
    pub team: String,
    pub bot: String,
    pub token: String,
}

impl HookPath {
    pub fn new(team: impl Into<String>, bot: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            bot: bot.into(),
            token: token.into(),
        }
    }

    /// `team/bot/token`.
    pub fn joined(&self) -> String {
        format!("{}/{}/{}", self.team, self.bot, self.token)
    }

    /// Segments must be non-empty and must not smuggle extra path components.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [("team", &self.team), ("bot", &self.bot), ("token", &self.token)] {
            if value.is_empty() {
                return Err(format!("{name} segment is empty"));
            }
            if value.contains(['/', '?', '#']) || value == "." || value == ".." {
                return Err(format!("{name} segment is not a single path component"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_url_joins_segments() {
        let config = UpstreamConfig {
            base_url: "https://hooks.example.com/".into(),
            ..Default::default()
        };
        assert_eq!(
            config.hook_url(&HookPath::new("T", "B", "X")),
            "https://hooks.example.com/services/T/B/X"
        );
    }

    #[test]
    fn upstream_is_verified_by_default() {
        let config = UpstreamConfig::default();
        assert!(!config.insecure);
        assert_eq!(config.base_url, "https://hooks.slack.com");
    }

    #[test]
    fn validate_rejects_smuggled_segments() {
        assert!(HookPath::new("T1", "B2", "xyz").validate().is_ok());
        assert!(HookPath::new("T1", "", "xyz").validate().is_err());
        assert!(HookPath::new("T1", "B2/../x", "xyz").validate().is_err());
        assert!(HookPath::new("..", "B2", "xyz").validate().is_err());
        assert!(HookPath::new("T1", "B2", "x?y=1").validate().is_err());
    }
}
