//! Facade wiring the registry, health tracker, selector and dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use crate::classify::classify;
use crate::config::RouterConfig;
use crate::dispatch::Dispatcher;
use crate::health::{Clock, HealthTracker, SystemClock};
use crate::registry::{CredentialStore, EnvCredentials, ProviderRegistry};
use crate::selection::{ProviderSelector, RandomSource, ThreadRngSource};
use crate::transport::{HttpTransport, Transport};
use crate::types::{Category, ProviderSnapshot, RouteResponse};
use crate::Result;

/// Entry point for classification and dispatch.
///
/// Build one `Router` per process and share it; health records live inside
/// it for the process lifetime and are safe to update from concurrent
/// requests.
pub struct Router {
    tracker: Arc<HealthTracker>,
    dispatcher: Dispatcher,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Classify a raw message into a content-generation category.
    pub fn classify(&self, message: &str) -> Category {
        classify(message)
    }

    /// Classify + dispatch in one step.
    pub async fn process(&self, message: &str) -> RouteResponse {
        let category = self.classify(message);
        self.dispatch(category, message).await
    }

    /// Dispatch a message under an already-known category.
    pub async fn dispatch(&self, category: Category, message: &str) -> RouteResponse {
        self.dispatcher.dispatch(category, message).await
    }

    /// Per-provider health view for observability endpoints.
    pub fn provider_snapshots(&self) -> HashMap<String, ProviderSnapshot> {
        self.tracker.snapshots()
    }
}

/// Builder injecting the router's collaborator seams. Every seam has a
/// production default; tests replace what they need.
pub struct RouterBuilder {
    registry: Option<ProviderRegistry>,
    credentials: Option<Arc<dyn CredentialStore>>,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    random: Option<Arc<dyn RandomSource>>,
    config: Option<RouterConfig>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            credentials: None,
            transport: None,
            clock: None,
            random: None,
            config: None,
        }
    }

    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = Some(random);
        self
    }

    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<Router> {
        let registry = Arc::new(self.registry.unwrap_or_else(ProviderRegistry::builtin));
        let credentials = self
            .credentials
            .unwrap_or_else(|| Arc::new(EnvCredentials));
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);
        let random = self
            .random
            .unwrap_or_else(|| Arc::new(ThreadRngSource) as Arc<dyn RandomSource>);
        let config = self.config.unwrap_or_else(RouterConfig::from_env);
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new()?) as Arc<dyn Transport>,
        };

        let tracker = Arc::new(HealthTracker::new(
            registry.names(),
            Arc::clone(&clock),
            &config,
        ));
        let selector = ProviderSelector::new(
            Arc::clone(&registry),
            Arc::clone(&tracker),
            Arc::clone(&credentials),
            random,
        );
        let dispatcher = Dispatcher::new(
            registry,
            Arc::clone(&tracker),
            selector,
            credentials,
            transport,
            clock,
            config,
        );

        Ok(Router {
            tracker,
            dispatcher,
        })
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticCredentials;

    #[test]
    fn test_builder_defaults_build() {
        let router = Router::builder().build().unwrap();
        assert_eq!(router.provider_snapshots().len(), 7);
    }

    #[test]
    fn test_classify_delegates() {
        let router = Router::builder().build().unwrap();
        assert_eq!(router.classify("draw a picture"), Category::Image);
        assert_eq!(router.classify("hello"), Category::Chat);
    }

    #[tokio::test]
    async fn test_process_without_credentials_serves_fallback() {
        // No provider can resolve a credential, so everything degrades.
        let router = Router::builder()
            .with_credentials(Arc::new(StaticCredentials::new()))
            .build()
            .unwrap();
        let resp = router.process("hello there").await;
        assert!(resp.success);
        assert!(resp.is_fallback());
        assert_eq!(resp.category, Category::Chat);
    }

    #[tokio::test]
    async fn test_snapshots_reflect_initial_state() {
        let router = Router::builder()
            .with_credentials(Arc::new(StaticCredentials::new()))
            .build()
            .unwrap();
        for snap in router.provider_snapshots().values() {
            assert_eq!(snap.success_count, 0);
            assert_eq!(snap.error_count, 0);
            assert_eq!(snap.success_rate, 0.0);
        }
    }
}
