//! Core type definitions shared across the routing modules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Content-generation intent of an inbound message.
///
/// The set is fixed; every message classifies to exactly one category, with
/// [`Category::Chat`] as the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Chat,
    Image,
    Audio,
    Video,
    Game,
    Translation,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Chat,
        Category::Image,
        Category::Audio,
        Category::Video,
        Category::Game,
        Category::Translation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Chat => "chat",
            Category::Image => "image",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Game => "game",
            Category::Translation => "translation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed health of a provider, driven entirely by call outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Healthy,
    Degraded,
    RateLimited,
    Failed,
}

/// Outcome of one logical routed request.
///
/// `success` is always `true` from the caller's perspective: provider-level
/// failures are absorbed into retries and, at worst, a degraded fallback
/// tagged `provider: "fallback"`.
#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub success: bool,
    pub category: Category,
    /// Name of the provider that answered, or `"fallback"`.
    pub provider: String,
    pub result: serde_json::Value,
    /// Unix timestamp (seconds) of when the response was produced.
    pub timestamp: u64,
}

impl RouteResponse {
    /// Sentinel provider name used for degraded responses.
    pub const FALLBACK_PROVIDER: &'static str = "fallback";

    pub fn is_fallback(&self) -> bool {
        self.provider == Self::FALLBACK_PROVIDER
    }
}

/// Point-in-time view of one provider's health record, for observability
/// surfaces (health endpoints, dashboards).
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSnapshot {
    pub status: ProviderStatus,
    pub success_count: u64,
    pub error_count: u64,
    pub mean_response_time_ms: u64,
    /// Unix timestamp (seconds) of the last transition-relevant event.
    pub last_checked_at: u64,
    /// successes / max(1, successes + errors)
    pub success_rate: f64,
}
