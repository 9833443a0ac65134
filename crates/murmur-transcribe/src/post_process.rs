//! Deterministic text normalization applied to raw backend output.

use murmur_core::types::PostProcessConfig;

/// Normalize raw transcription text.
///
/// Order is fixed: trim surrounding whitespace, strip one trailing period,
/// append one trailing space, lowercase. Pure function of `(text, config)` —
/// applying it twice with the same config yields the same result.
pub fn post_process(text: &str, config: &PostProcessConfig) -> String {
    let mut text = text.trim().to_string();
    if config.remove_trailing_period && text.ends_with('.') {
        text.pop();
    }
    if config.add_trailing_space {
        text.push(' ');
    }
    if config.remove_capitalization {
        text = text.to_lowercase();
    }
    text
}
