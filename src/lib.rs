//! # ai-router-rust
//!
//! Multi-provider routing core for AI content generation.
//!
//! This library classifies a free-form user message into a content-generation
//! category and dispatches it across a bounded set of upstream AI providers,
//! with per-provider health tracking, circuit breaking, weighted failover and
//! deterministic degraded-mode responses when no provider is available.
//!
//! ## Core Philosophy
//!
//! - **Bounded provider set**: providers are declared once at startup; this is
//!   not a service mesh and performs no discovery
//! - **Failure absorption**: provider errors are converted into health updates
//!   and retries, never surfaced raw to the caller
//! - **Deterministic by injection**: the clock, the random source, credentials
//!   and the HTTP transport are all trait seams, so every routing decision can
//!   be reproduced in tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_router_rust::Router;
//!
//! #[tokio::main]
//! async fn main() -> ai_router_rust::Result<()> {
//!     let router = Router::builder().build()?;
//!
//!     // Classify + dispatch in one step.
//!     let response = router.process("draw me a picture of a lighthouse").await;
//!     println!("{} answered: {}", response.provider, response.result);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`classify`] | Priority-ordered keyword intent classification |
//! | [`registry`] | Provider definitions and credential resolution |
//! | [`health`] | Per-provider health records and circuit breaking |
//! | [`selection`] | Health-aware weighted provider selection |
//! | [`adapters`] | Per-provider payload construction and result extraction |
//! | [`dispatch`] | Retry-with-exclusion dispatch loop |
//! | [`transport`] | HTTP transport seam over reqwest |
//! | [`fallback`] | Category-specific degraded responses |
//! | [`router`] | Facade wiring all of the above together |

pub mod adapters;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod fallback;
pub mod health;
pub mod registry;
pub mod router;
pub mod selection;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use classify::classify;
pub use config::RouterConfig;
pub use health::{Clock, HealthTracker, ManualClock, SystemClock};
pub use registry::{CredentialStore, EnvCredentials, ProviderDefinition, ProviderRegistry};
pub use router::{Router, RouterBuilder};
pub use selection::{ProviderSelector, RandomSource, ThreadRngSource};
pub use types::{Category, ProviderSnapshot, ProviderStatus, RouteResponse};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
