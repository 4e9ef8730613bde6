//! Routing policy configuration.

use std::env;
use std::time::Duration;

/// Tunable routing policy with documented defaults.
///
/// Rate-limit backoff and breaker cooldown are deliberately separate knobs:
/// a 429 is legitimate throttling and gets a short, provider-advertised
/// window, while the breaker cooldown guards against genuinely failing
/// providers.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Consecutive failures before a provider's breaker opens.
    pub failure_threshold: u32,
    /// How long an open breaker keeps a provider out of selection.
    pub failure_cooldown: Duration,
    /// Exclusion window applied on a 429 when the provider gives no hint.
    pub rate_limit_backoff: Duration,
    /// Distinct providers tried for a chat request.
    pub chat_attempts: u32,
    /// Distinct providers tried for content generation (costlier upstream).
    pub content_attempts: u32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_cooldown: Duration::from_secs(300),
            rate_limit_backoff: Duration::from_secs(60),
            chat_attempts: 3,
            content_attempts: 2,
        }
    }
}

impl RouterConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `AI_ROUTER_*` environment variables, parsed
    /// leniently (unset or unparsable values keep the default).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_u32("AI_ROUTER_FAILURE_THRESHOLD") {
            cfg.failure_threshold = v;
        }
        if let Some(v) = env_u64("AI_ROUTER_FAILURE_COOLDOWN_SECS") {
            cfg.failure_cooldown = Duration::from_secs(v);
        }
        if let Some(v) = env_u64("AI_ROUTER_RATE_LIMIT_BACKOFF_SECS") {
            cfg.rate_limit_backoff = Duration::from_secs(v);
        }
        cfg
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_failure_cooldown(mut self, cooldown: Duration) -> Self {
        self.failure_cooldown = cooldown;
        self
    }

    pub fn with_rate_limit_backoff(mut self, backoff: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self
    }

    pub fn with_chat_attempts(mut self, attempts: u32) -> Self {
        self.chat_attempts = attempts;
        self
    }

    pub fn with_content_attempts(mut self, attempts: u32) -> Self {
        self.content_attempts = attempts;
        self
    }
}

fn env_u32(key: &str) -> Option<u32> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg = RouterConfig::default();
        assert_eq!(cfg.failure_threshold, 5);
        assert_eq!(cfg.failure_cooldown, Duration::from_secs(300));
        assert_eq!(cfg.rate_limit_backoff, Duration::from_secs(60));
        assert_eq!(cfg.chat_attempts, 3);
        assert_eq!(cfg.content_attempts, 2);
    }

    #[test]
    fn test_config_builder() {
        let cfg = RouterConfig::new()
            .with_failure_threshold(3)
            .with_failure_cooldown(Duration::from_secs(10))
            .with_rate_limit_backoff(Duration::from_secs(5))
            .with_chat_attempts(1)
            .with_content_attempts(1);
        assert_eq!(cfg.failure_threshold, 3);
        assert_eq!(cfg.failure_cooldown, Duration::from_secs(10));
        assert_eq!(cfg.rate_limit_backoff, Duration::from_secs(5));
        assert_eq!(cfg.chat_attempts, 1);
        assert_eq!(cfg.content_attempts, 1);
    }
}
