//! Process Configuration
//!
//! Environment-driven settings for the conversation engine and vendor
//! credentials. Every `from_env` has a `from_lookup` twin taking the variable
//! source as a closure.

use std::collections::HashMap;
use std::time::Duration;

/// Default model when a request names none
pub const DEFAULT_MODEL_ID: &str = "claude-3-5-haiku-20241022";

/// Engine tunables
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Estimated-token budget for older history
    pub token_budget: u32,

    /// Most recent history messages always kept
    pub recent_window: usize,

    /// Model steps before a run is cut off
    pub max_steps: usize,

    /// Deadline for one model call
    pub model_timeout: Duration,

    /// Model used when a request names none
    pub default_model: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            token_budget: 3000,
            recent_window: 5,
            max_steps: 10,
            model_timeout: Duration::from_secs(120),
            default_model: DEFAULT_MODEL_ID.into(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            token_budget: parsed(&lookup, "TOKEN_BUDGET").unwrap_or(defaults.token_budget),
            recent_window: parsed(&lookup, "RECENT_WINDOW").unwrap_or(defaults.recent_window),
            max_steps: parsed(&lookup, "MAX_AGENT_STEPS")
                .filter(|v: &usize| *v > 0)
                .unwrap_or(defaults.max_steps),
            model_timeout: parsed(&lookup, "MODEL_TIMEOUT_SECS")
                .filter(|v: &u64| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.model_timeout),
            default_model: lookup("DEFAULT_MODEL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.default_model),
        }
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

/// Environment variable holding each provider's API key
const CREDENTIAL_VARS: &[(&str, &str)] = &[
    ("anthropic", "ANTHROPIC_API_KEY"),
    ("openai", "OPENAI_API_KEY"),
    ("google", "GOOGLE_API_KEY"),
];

/// Vendor API keys keyed by provider identifier
#[derive(Clone, Default)]
pub struct Credentials {
    keys: HashMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<_> = self.keys.keys().collect();
        providers.sort();
        f.debug_struct("Credentials").field("providers", &providers).finish()
    }
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut creds = Self::new();
        for (provider, var) in CREDENTIAL_VARS {
            if let Some(key) = lookup(var) {
                creds = creds.with(*provider, key);
            }
        }
        creds
    }

    /// Add a key; blank keys count as absent
    pub fn with(mut self, provider: impl Into<String>, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.trim().is_empty() {
            self.keys.insert(provider.into(), key);
        }
        self
    }

    pub fn get(&self, provider: &str) -> Option<&str> {
        self.keys.get(provider).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
    }

    #[test]
    fn test_engine_defaults() {
        let config = EngineConfig::from_lookup(|_| None);
        assert_eq!(config.token_budget, 3000);
        assert_eq!(config.recent_window, 5);
        assert_eq!(config.max_steps, 10);
        assert_eq!(config.model_timeout, Duration::from_secs(120));
        assert_eq!(config.default_model, DEFAULT_MODEL_ID);
    }

    #[test]
    fn test_engine_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("TOKEN_BUDGET", "500"),
            ("RECENT_WINDOW", "2"),
            ("MAX_AGENT_STEPS", "0"),
            ("MODEL_TIMEOUT_SECS", "abc"),
        ]));
        assert_eq!(config.token_budget, 500);
        assert_eq!(config.recent_window, 2);
        assert_eq!(config.max_steps, 10);
        assert_eq!(config.model_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_credentials_skip_blank() {
        let creds = Credentials::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("OPENAI_API_KEY", "  "),
        ]));
        assert_eq!(creds.get("anthropic"), Some("sk-ant"));
        assert_eq!(creds.get("openai"), None);
        assert_eq!(creds.get("google"), None);
        assert!(!format!("{creds:?}").contains("sk-ant"));
    }
}
