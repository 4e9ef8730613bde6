//! Intent classification via priority-ordered keyword matching.
//!
//! The classifier is pure and total: every message maps to exactly one
//! [`Category`], with [`Category::Chat`] as the fall-through. Precedence is
//! fixed and significant so overlapping keywords resolve deterministically
//! regardless of their position in the message: image-like keywords win over
//! game keywords, which win over audio, translation and video.

use crate::types::Category;

/// Keyword table, earlier entries have higher priority. Matching is
/// case-insensitive substring containment.
const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Image,
        &["image", "picture", "draw", "art", "visual", "photo"],
    ),
    (
        Category::Game,
        &["game", "play", "puzzle", "rpg", "adventure"],
    ),
    (
        Category::Audio,
        &["music", "audio", "sound", "song", "speech", "voice"],
    ),
    (
        Category::Translation,
        &["translate", "translation", "language"],
    ),
    (
        Category::Video,
        &["video", "movie", "animation", "clip"],
    ),
];

/// Classify a raw user message into a content-generation category.
///
/// The first category in priority order with any matching keyword wins;
/// messages matching nothing classify as [`Category::Chat`].
pub fn classify(message: &str) -> Category {
    let text = message.to_lowercase();
    for (category, keywords) in KEYWORDS {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return *category;
        }
    }
    Category::Chat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_message_defaults_to_chat() {
        assert_eq!(classify("hello, how are you?"), Category::Chat);
        assert_eq!(classify(""), Category::Chat);
    }

    #[test]
    fn test_picture_is_image_never_chat() {
        assert_eq!(classify("picture"), Category::Image);
        assert_eq!(classify("PICTURE"), Category::Image);
        assert_eq!(classify("a picture please"), Category::Image);
    }

    #[test]
    fn test_each_category_has_a_trigger() {
        assert_eq!(classify("draw me something"), Category::Image);
        assert_eq!(classify("make a puzzle"), Category::Game);
        assert_eq!(classify("compose a song"), Category::Audio);
        assert_eq!(classify("translate this for me"), Category::Translation);
        assert_eq!(classify("render an animation"), Category::Video);
    }

    #[test]
    fn test_image_beats_game_regardless_of_position() {
        // Overlapping keywords resolve to the earlier category in the table.
        assert_eq!(classify("a game with a picture"), Category::Image);
        assert_eq!(classify("a picture of a game"), Category::Image);
    }

    #[test]
    fn test_game_beats_audio() {
        assert_eq!(classify("an rpg with music"), Category::Game);
    }

    #[test]
    fn test_audio_beats_video() {
        assert_eq!(classify("a music video"), Category::Audio);
    }

    #[test]
    fn test_substring_matching() {
        // Keyword matching is substring-based, mirroring the routing rules
        // the table was derived from.
        assert_eq!(classify("artisan bread recipe"), Category::Image);
    }

    #[test]
    fn test_total_over_odd_inputs() {
        // Never panics, always yields exactly one category.
        let _ = classify("\u{1F600}\u{0000}");
        let _ = classify(&"x".repeat(10_000));
    }
}
