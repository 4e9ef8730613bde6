//! Category-specific degraded responses.
//!
//! When every attempt is exhausted the dispatcher resolves to one of these
//! deterministic, locally-generated payloads. Fallback never errors; the
//! failure stays internal and the caller sees a well-formed response tagged
//! `provider: "fallback"`.

use serde_json::{json, Value};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::types::Category;

pub const CHAT_FALLBACK_MESSAGE: &str =
    "I'm currently experiencing connectivity issues. Please try again in a moment.";

const GAME_STUB_HTML: &str = "<html><body><h1>Game generation temporarily unavailable</h1>\
<p>Please try again later.</p></body></html>";

/// Build the degraded payload for a category. `now` stamps the game stub id.
pub fn fallback_result(category: Category, message: &str, now: SystemTime) -> Value {
    match category {
        Category::Chat => Value::String(CHAT_FALLBACK_MESSAGE.to_string()),
        Category::Image => json!({
            "image_data": "/api/placeholder/512/512",
            "original_prompt": message,
            "enhanced_prompt": "Fallback image",
            "source": "fallback",
        }),
        Category::Audio => json!({
            "audio_data": null,
            "duration": "0:00",
            "title": "Audio generation unavailable",
        }),
        Category::Video => json!({
            "video_data": null,
            "duration": "0:00",
            "thumbnail": "/api/placeholder/400/225",
        }),
        Category::Game => json!({
            "id": format!("fallback-{}", unix_seconds(now)),
            "title": "Generated Game",
            "html_content": GAME_STUB_HTML,
            "type": "puzzle",
        }),
        Category::Translation => json!({
            "message": "Translation is temporarily unavailable. Please try again later.",
        }),
    }
}

fn unix_seconds(now: SystemTime) -> u64 {
    now.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_fallback_is_canned_message() {
        let result = fallback_result(Category::Chat, "hello", UNIX_EPOCH);
        assert_eq!(result, Value::String(CHAT_FALLBACK_MESSAGE.to_string()));
    }

    #[test]
    fn test_image_fallback_keeps_prompt() {
        let result = fallback_result(Category::Image, "a lighthouse", UNIX_EPOCH);
        assert_eq!(result["original_prompt"], "a lighthouse");
        assert_eq!(result["source"], "fallback");
        assert_eq!(result["image_data"], "/api/placeholder/512/512");
    }

    #[test]
    fn test_game_stub_is_stamped_from_clock() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let result = fallback_result(Category::Game, "a puzzle", now);
        assert_eq!(result["id"], "fallback-1700000000");
        assert_eq!(result["type"], "puzzle");
        assert!(result["html_content"].as_str().unwrap().contains("<html>"));
    }

    #[test]
    fn test_media_fallbacks_have_null_assets() {
        let audio = fallback_result(Category::Audio, "a song", UNIX_EPOCH);
        assert!(audio["audio_data"].is_null());
        let video = fallback_result(Category::Video, "a clip", UNIX_EPOCH);
        assert!(video["video_data"].is_null());
        assert_eq!(video["thumbnail"], "/api/placeholder/400/225");
    }

    #[test]
    fn test_every_category_has_a_fallback() {
        for cat in Category::ALL {
            let result = fallback_result(cat, "anything", UNIX_EPOCH);
            assert!(!result.is_null());
        }
    }
}
