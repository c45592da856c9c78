//! Per-session recognition parameters.

/// Recognition parameters for one session.
///
/// Immutable once the session starts; exactly one instance exists per
/// session and it is snapshotted into the Config message of whichever wire
/// variant the negotiated endpoint speaks.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamConfig {
    /// BCP-47-style language tag, e.g. `ko-KR`.
    pub language: String,
    pub sample_rate_hertz: u32,
    pub word_alignment: bool,
    pub full_text: bool,
    pub skip_empty_text: bool,
    pub use_word_epd: bool,
    pub use_period_epd: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            language: "ko-KR".to_string(),
            sample_rate_hertz: 16_000,
            word_alignment: true,
            full_text: true,
            skip_empty_text: true,
            use_word_epd: false,
            use_period_epd: false,
        }
    }
}

impl StreamConfig {
    /// Default parameters for the given language tag.
    pub fn for_language(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Self::default()
        }
    }

    /// The short-form language code used by the typed-envelope variant.
    pub fn short_language_code(&self) -> String {
        short_language_code(&self.language)
    }
}

/// Maps a full language tag to the short form some endpoints expect.
///
/// Chinese tags keep their region suffix (`zh-CN` stays `zh-CN`); every other
/// tag is reduced to its lower-cased primary subtag, and tags without a
/// suffix pass through lower-cased.
pub fn short_language_code(tag: &str) -> String {
    let trimmed = tag.trim();
    let primary = trimmed.split('-').next().unwrap_or(trimmed);
    if primary.eq_ignore_ascii_case("zh") {
        return trimmed.to_string();
    }
    match trimmed.split_once('-') {
        Some((primary, _)) => primary.to_ascii_lowercase(),
        None => trimmed.to_ascii_lowercase(),
    }
}
