//! Provider definitions and credential resolution.
//!
//! Providers are declared once at startup and never mutated. The built-in
//! table covers the known upstream services; tests and embedders can supply
//! their own table via [`ProviderRegistry::with_providers`].

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::time::Duration;

use crate::types::Category;

/// How a provider expects its credential to be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <secret>`
    Bearer,
    /// `Authorization: DeepL-Auth-Key <secret>`
    DeepLAuthKey,
}

/// Payload/response shape family a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    /// OpenAI-compatible: `messages` array for chat, `prompt` for images.
    ChatCompletion,
    /// Inference-style: raw `inputs` payload, `generated_text` replies.
    RawInference,
    /// Translation API: `text` array with a target language.
    Translation,
}

/// Immutable definition of one upstream provider.
#[derive(Debug, Clone)]
pub struct ProviderDefinition {
    /// Unique identifier, also the key into health records.
    pub name: &'static str,
    /// Environment variable holding this provider's secret.
    pub credential_key: &'static str,
    pub base_endpoint: &'static str,
    /// Category -> relative path.
    pub operation_paths: &'static [(Category, &'static str)],
    pub capabilities: &'static [Category],
    /// Lower is preferred; primary ranking key.
    pub priority: u8,
    /// Advisory per-category budget; informs backoff, not enforced here.
    pub rate_limit_per_minute: &'static [(Category, u32)],
    pub timeout: Duration,
    pub max_retries: u32,
    pub auth_scheme: AuthScheme,
    pub adapter: AdapterKind,
    /// Category -> provider-native model identifier.
    pub models: &'static [(Category, &'static str)],
}

impl ProviderDefinition {
    pub fn supports(&self, category: Category) -> bool {
        self.capabilities.contains(&category)
    }

    pub fn path_for(&self, category: Category) -> Option<&'static str> {
        self.operation_paths
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, p)| *p)
    }

    pub fn model_for(&self, category: Category) -> Option<&'static str> {
        self.models
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, m)| *m)
    }

    pub fn rate_limit_for(&self, category: Category) -> Option<u32> {
        self.rate_limit_per_minute
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, n)| *n)
    }

    /// Full URL for a category, if the provider exposes a path for it.
    pub fn url_for(&self, category: Category) -> Option<String> {
        self.path_for(category)
            .map(|path| format!("{}{}", self.base_endpoint, path))
    }
}

static BUILTIN_PROVIDERS: Lazy<Vec<ProviderDefinition>> = Lazy::new(|| {
    vec![
        ProviderDefinition {
            name: "groq",
            credential_key: "GROQ_API_KEY",
            base_endpoint: "https://api.groq.com/openai/v1",
            operation_paths: &[(Category::Chat, "/chat/completions")],
            capabilities: &[Category::Chat],
            priority: 1,
            rate_limit_per_minute: &[(Category::Chat, 100)],
            timeout: Duration::from_secs(30),
            max_retries: 3,
            auth_scheme: AuthScheme::Bearer,
            adapter: AdapterKind::ChatCompletion,
            models: &[(Category::Chat, "llama3-8b-8192")],
        },
        ProviderDefinition {
            name: "openrouter",
            credential_key: "OPENROUTER_API_KEY",
            base_endpoint: "https://openrouter.ai/api/v1",
            operation_paths: &[(Category::Chat, "/chat/completions")],
            capabilities: &[Category::Chat],
            priority: 2,
            rate_limit_per_minute: &[(Category::Chat, 200)],
            timeout: Duration::from_secs(30),
            max_retries: 3,
            auth_scheme: AuthScheme::Bearer,
            adapter: AdapterKind::ChatCompletion,
            models: &[(Category::Chat, "meta-llama/llama-3.1-8b-instruct:free")],
        },
        ProviderDefinition {
            name: "together",
            credential_key: "TOGETHER_API_KEY",
            base_endpoint: "https://api.together.xyz/v1",
            operation_paths: &[
                (Category::Chat, "/chat/completions"),
                (Category::Image, "/images/generations"),
            ],
            capabilities: &[Category::Chat, Category::Image],
            priority: 3,
            rate_limit_per_minute: &[(Category::Chat, 150), (Category::Image, 50)],
            timeout: Duration::from_secs(30),
            max_retries: 3,
            auth_scheme: AuthScheme::Bearer,
            adapter: AdapterKind::ChatCompletion,
            models: &[
                (Category::Chat, "meta-llama/Llama-2-7b-chat-hf"),
                (Category::Image, "stabilityai/stable-diffusion-2-1"),
            ],
        },
        ProviderDefinition {
            name: "fireworks",
            credential_key: "FIREWORKS_API_KEY",
            base_endpoint: "https://api.fireworks.ai/inference/v1",
            operation_paths: &[
                (Category::Chat, "/chat/completions"),
                (Category::Image, "/images/generations"),
            ],
            capabilities: &[Category::Chat, Category::Image],
            priority: 4,
            rate_limit_per_minute: &[(Category::Chat, 100), (Category::Image, 30)],
            timeout: Duration::from_secs(30),
            max_retries: 3,
            auth_scheme: AuthScheme::Bearer,
            adapter: AdapterKind::ChatCompletion,
            models: &[
                (Category::Chat, "accounts/fireworks/models/llama-v2-7b-chat"),
                (Category::Image, "stabilityai/stable-diffusion-2-1"),
            ],
        },
        ProviderDefinition {
            name: "cerebras",
            credential_key: "CEREBRAS_API_KEY",
            base_endpoint: "https://api.cerebras.ai/v1",
            operation_paths: &[(Category::Chat, "/chat/completions")],
            capabilities: &[Category::Chat],
            priority: 5,
            rate_limit_per_minute: &[(Category::Chat, 50)],
            timeout: Duration::from_secs(30),
            max_retries: 3,
            auth_scheme: AuthScheme::Bearer,
            adapter: AdapterKind::ChatCompletion,
            models: &[(Category::Chat, "llama3.1-8b")],
        },
        ProviderDefinition {
            name: "huggingface",
            credential_key: "HUGGINGFACE_API_KEY",
            base_endpoint: "https://api-inference.huggingface.co",
            operation_paths: &[
                (Category::Image, "/models/stabilityai/stable-diffusion-2-1"),
                (Category::Chat, "/models/microsoft/DialoGPT-large"),
            ],
            capabilities: &[Category::Image, Category::Chat],
            priority: 6,
            rate_limit_per_minute: &[(Category::Image, 100), (Category::Chat, 200)],
            timeout: Duration::from_secs(30),
            max_retries: 3,
            auth_scheme: AuthScheme::Bearer,
            adapter: AdapterKind::RawInference,
            models: &[],
        },
        ProviderDefinition {
            name: "deepl",
            credential_key: "DEEPL_API_KEY",
            base_endpoint: "https://api-free.deepl.com/v2",
            operation_paths: &[(Category::Translation, "/translate")],
            capabilities: &[Category::Translation],
            priority: 1,
            rate_limit_per_minute: &[(Category::Translation, 500)],
            timeout: Duration::from_secs(30),
            max_retries: 3,
            auth_scheme: AuthScheme::DeepLAuthKey,
            adapter: AdapterKind::Translation,
            models: &[],
        },
    ]
});

/// Static table of provider definitions.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDefinition>,
}

impl ProviderRegistry {
    /// The built-in provider table.
    pub fn builtin() -> Self {
        Self {
            providers: BUILTIN_PROVIDERS.clone(),
        }
    }

    /// A registry over a caller-supplied provider table.
    pub fn with_providers(providers: Vec<ProviderDefinition>) -> Self {
        Self { providers }
    }

    pub fn get(&self, name: &str) -> Option<&ProviderDefinition> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderDefinition> {
        self.providers.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Credential lookup seam. Absence of a resolvable credential makes a
/// provider ineligible until one appears; never a crash.
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Environment-backed credential store (the production default).
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials;

impl CredentialStore for EnvCredentials {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// Fixed in-memory credential store, for tests and embedders that manage
/// secrets themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    secrets: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(key.into(), value.into());
        self
    }
}

impl CredentialStore for StaticCredentials {
    fn lookup(&self, key: &str) -> Option<String> {
        self.secrets.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_contents() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(registry.len(), 7);
        assert!(registry.get("groq").is_some());
        assert!(registry.get("deepl").is_some());
        assert!(registry.get("nope").is_none());
    }

    #[test]
    fn test_builtin_names_unique() {
        let registry = ProviderRegistry::builtin();
        let mut names = registry.names();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), registry.len());
    }

    #[test]
    fn test_capability_and_paths_agree() {
        // Every declared capability has a path to call.
        let registry = ProviderRegistry::builtin();
        for provider in registry.iter() {
            for cat in provider.capabilities {
                assert!(
                    provider.path_for(*cat).is_some(),
                    "{} lacks a path for {}",
                    provider.name,
                    cat
                );
            }
        }
    }

    #[test]
    fn test_url_composition() {
        let registry = ProviderRegistry::builtin();
        let groq = registry.get("groq").unwrap();
        assert_eq!(
            groq.url_for(Category::Chat).unwrap(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert!(groq.url_for(Category::Image).is_none());
    }

    #[test]
    fn test_model_lookup() {
        let registry = ProviderRegistry::builtin();
        let together = registry.get("together").unwrap();
        assert_eq!(
            together.model_for(Category::Image),
            Some("stabilityai/stable-diffusion-2-1")
        );
        let hf = registry.get("huggingface").unwrap();
        assert_eq!(hf.model_for(Category::Chat), None);
    }

    #[test]
    fn test_rate_limit_lookup() {
        let registry = ProviderRegistry::builtin();
        let together = registry.get("together").unwrap();
        assert_eq!(together.rate_limit_for(Category::Image), Some(50));
        assert_eq!(together.rate_limit_for(Category::Video), None);
    }

    #[test]
    fn test_static_credentials() {
        let store = StaticCredentials::new().with_secret("GROQ_API_KEY", "sk-test");
        assert_eq!(store.lookup("GROQ_API_KEY").as_deref(), Some("sk-test"));
        assert!(store.lookup("OTHER").is_none());
    }

    #[test]
    fn test_env_credentials_empty_is_missing() {
        std::env::set_var("AI_ROUTER_TEST_EMPTY_KEY", "");
        assert!(EnvCredentials.lookup("AI_ROUTER_TEST_EMPTY_KEY").is_none());
        std::env::remove_var("AI_ROUTER_TEST_EMPTY_KEY");
    }
}
