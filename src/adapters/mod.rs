//! Per-provider payload construction and result extraction.
//!
//! Each provider declares an [`AdapterKind`] describing the shape family it
//! speaks; the dispatcher goes through these functions rather than branching
//! on provider names. Unknown combinations fall back to a plain
//! `{"message": ...}` payload with the raw body passed through, so custom
//! provider tables remain usable without code changes.

use serde_json::{json, Value};

use crate::error::{Error, ErrorContext};
use crate::registry::{AdapterKind, AuthScheme, ProviderDefinition};
use crate::types::Category;
use crate::Result;

const CHAT_MAX_TOKENS: u32 = 150;
const CHAT_TEMPERATURE: f64 = 0.7;

/// Build the provider-specific request body for `(provider, category, message)`.
pub fn build_payload(
    provider: &ProviderDefinition,
    category: Category,
    message: &str,
) -> Result<Value> {
    match (provider.adapter, category) {
        (AdapterKind::ChatCompletion, Category::Chat) => {
            let model = require_model(provider, category)?;
            Ok(json!({
                "model": model,
                "messages": [{"role": "user", "content": message}],
                "max_tokens": CHAT_MAX_TOKENS,
                "temperature": CHAT_TEMPERATURE,
            }))
        }
        (AdapterKind::ChatCompletion, Category::Image) => {
            let model = require_model(provider, category)?;
            Ok(json!({
                "model": model,
                "prompt": message,
                "n": 1,
                "size": "512x512",
            }))
        }
        (AdapterKind::RawInference, Category::Chat) => Ok(json!({
            "inputs": message,
            "parameters": {"max_length": CHAT_MAX_TOKENS, "temperature": CHAT_TEMPERATURE},
        })),
        (AdapterKind::RawInference, Category::Image) => Ok(json!({"inputs": message})),
        (AdapterKind::Translation, Category::Translation) => Ok(json!({
            "text": [message],
            "target_lang": "EN",
        })),
        // Generic pass-through for categories served by opaque upstream
        // services (game/audio/video creators take a bare message).
        _ => Ok(json!({"message": message})),
    }
}

/// Extract the caller-facing result from a 2xx response body.
///
/// A body that does not match the provider's declared shape is an error;
/// the dispatcher records it as a provider failure, never a crash.
pub fn extract_result(
    provider: &ProviderDefinition,
    category: Category,
    message: &str,
    body: &Value,
) -> Result<Value> {
    match (provider.adapter, category) {
        (AdapterKind::ChatCompletion, Category::Chat) => {
            let content = body
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .ok_or_else(|| shape_error(provider, "choices[0].message.content"))?;
            Ok(Value::String(content.to_string()))
        }
        (AdapterKind::ChatCompletion, Category::Image) => {
            let url = body
                .pointer("/data/0/url")
                .and_then(Value::as_str)
                .ok_or_else(|| shape_error(provider, "data[0].url"))?;
            Ok(json!({
                "image_data": url,
                "original_prompt": message,
                "enhanced_prompt": "AI-generated image",
                "source": provider.name,
            }))
        }
        (AdapterKind::RawInference, Category::Chat) => {
            let text = body
                .get("generated_text")
                .and_then(Value::as_str)
                .ok_or_else(|| shape_error(provider, "generated_text"))?;
            Ok(Value::String(text.to_string()))
        }
        // The inference endpoint answers with binary image data the core
        // does not decode; hand back a placeholder descriptor.
        (AdapterKind::RawInference, Category::Image) => Ok(json!({
            "image_data": "/api/placeholder/512/512",
            "original_prompt": message,
            "enhanced_prompt": "AI-generated image",
            "source": provider.name,
            "message": "Image generated successfully",
        })),
        (AdapterKind::Translation, Category::Translation) => {
            let text = body
                .pointer("/translations/0/text")
                .and_then(Value::as_str)
                .ok_or_else(|| shape_error(provider, "translations[0].text"))?;
            Ok(Value::String(text.to_string()))
        }
        _ => Ok(body.clone()),
    }
}

/// Request headers carrying the provider's credential.
pub fn auth_headers(provider: &ProviderDefinition, secret: &str) -> Vec<(String, String)> {
    let value = match provider.auth_scheme {
        AuthScheme::Bearer => format!("Bearer {}", secret),
        AuthScheme::DeepLAuthKey => format!("DeepL-Auth-Key {}", secret),
    };
    vec![("Authorization".to_string(), value)]
}

fn require_model(provider: &ProviderDefinition, category: Category) -> Result<&'static str> {
    provider.model_for(category).ok_or_else(|| {
        Error::configuration_with_context(
            format!("no model configured for {} on {}", category, provider.name),
            ErrorContext::new()
                .with_field_path("provider.models")
                .with_source("adapter"),
        )
    })
}

fn shape_error(provider: &ProviderDefinition, expected: &str) -> Error {
    Error::runtime_with_context(
        format!("unexpected response shape from {}", provider.name),
        ErrorContext::new()
            .with_details(format!("missing {}", expected))
            .with_source("adapter"),
    )
}
