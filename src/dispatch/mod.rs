//! Retry-with-exclusion dispatch loop.
//!
//! One logical request makes at most N sequential attempts against distinct
//! providers (3 for chat, 2 for content generation), translating the payload
//! and response per provider and feeding every outcome back into the health
//! tracker. Provider-level errors never escape: exhaustion resolves into the
//! category's fallback payload.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::adapters;
use crate::config::RouterConfig;
use crate::fallback::fallback_result;
use crate::health::{Clock, HealthTracker};
use crate::registry::{CredentialStore, ProviderDefinition, ProviderRegistry};
use crate::selection::ProviderSelector;
use crate::transport::Transport;
use crate::types::{Category, RouteResponse};

/// Why one attempt did not produce a result.
enum AttemptFailure {
    /// HTTP 429; the provider sits out for its own window, not the breaker's.
    RateLimited,
    /// Everything else: non-2xx, timeout, transport error, malformed body.
    Failed(String),
}

/// Orchestrates one logical call across providers.
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    tracker: Arc<HealthTracker>,
    selector: ProviderSelector,
    credentials: Arc<dyn CredentialStore>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    config: RouterConfig,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<ProviderRegistry>,
        tracker: Arc<HealthTracker>,
        selector: ProviderSelector,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        config: RouterConfig,
    ) -> Self {
        Self {
            registry,
            tracker,
            selector,
            credentials,
            transport,
            clock,
            config,
        }
    }

    /// Dispatch `message` to the best available provider for `category`.
    ///
    /// Always yields a successful [`RouteResponse`]; when every attempt is
    /// exhausted the response carries the category fallback with
    /// `provider == "fallback"`.
    pub async fn dispatch(&self, category: Category, message: &str) -> RouteResponse {
        let budget = if category == Category::Chat {
            self.config.chat_attempts
        } else {
            self.config.content_attempts
        };

        let mut tried: HashSet<String> = HashSet::new();
        for attempt in 0..budget {
            let name = match self.selector.select(category, &tried) {
                Some(name) => name,
                None => break,
            };
            tried.insert(name.to_string());

            // Registered names always resolve; a miss would be a table bug.
            let provider = match self.registry.get(name) {
                Some(p) => p,
                None => break,
            };

            debug!(provider = name, %category, attempt, "dispatching attempt");
            match self.attempt(provider, category, message).await {
                Ok(result) => {
                    return self.response(category, name.to_string(), result);
                }
                Err(AttemptFailure::RateLimited) => {
                    self.tracker
                        .record_rate_limited(name, self.config.rate_limit_backoff);
                    warn!(provider = name, "provider rate limited, trying next");
                }
                Err(AttemptFailure::Failed(reason)) => {
                    self.tracker.record_failure(name);
                    warn!(provider = name, %reason, "attempt failed, trying next");
                }
            }
        }

        debug!(%category, tried = tried.len(), "attempts exhausted, serving fallback");
        let result = fallback_result(category, message, self.clock.now());
        self.response(category, RouteResponse::FALLBACK_PROVIDER.to_string(), result)
    }

    async fn attempt(
        &self,
        provider: &ProviderDefinition,
        category: Category,
        message: &str,
    ) -> Result<serde_json::Value, AttemptFailure> {
        let url = provider
            .url_for(category)
            .ok_or_else(|| AttemptFailure::Failed("no endpoint for category".to_string()))?;
        let secret = self
            .credentials
            .lookup(provider.credential_key)
            .ok_or_else(|| AttemptFailure::Failed("credential disappeared".to_string()))?;
        let payload = adapters::build_payload(provider, category, message)
            .map_err(|e| AttemptFailure::Failed(e.to_string()))?;
        let headers = adapters::auth_headers(provider, &secret);

        let started = Instant::now();
        let response = self
            .transport
            .post(&url, &headers, &payload, provider.timeout)
            .await
            .map_err(|e| AttemptFailure::Failed(e.to_string()))?;

        if response.status == 429 {
            return Err(AttemptFailure::RateLimited);
        }
        if !response.is_success() {
            let err = crate::Error::Remote {
                status: response.status,
                message: body_excerpt(&response.body),
                retryable: true,
            };
            return Err(AttemptFailure::Failed(err.to_string()));
        }

        let result = adapters::extract_result(provider, category, message, &response.body)
            .map_err(|e| AttemptFailure::Failed(e.to_string()))?;
        self.tracker.record_success(provider.name, started.elapsed());
        Ok(result)
    }

    fn response(
        &self,
        category: Category,
        provider: String,
        result: serde_json::Value,
    ) -> RouteResponse {
        RouteResponse {
            success: true,
            category,
            provider,
            result,
            timestamp: self
                .clock
                .now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or(Duration::ZERO)
                .as_secs(),
        }
    }
}

/// Short, log-safe slice of an upstream error body.
fn body_excerpt(body: &serde_json::Value) -> String {
    body.to_string().chars().take(200).collect()
}
