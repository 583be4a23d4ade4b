//! Recognized service languages
//!
//! The service supports a fixed set of ISO two-letter language codes. Any
//! other code is rejected before a request is made. `"all"` is accepted as
//! the service's wildcard.

use crate::error::{Result, TvdbError};

/// The language abbreviations supported by the service.
pub const LANGUAGES: &[&str] = &[
    "cs", "da", "de", "el", "en", "es", "fi", "fr", "he", "hr", "hu", "it", "ja", "ko", "nl",
    "no", "pl", "pt", "ru", "sl", "sv", "tr", "zh",
];

/// True if `code` is a recognized language abbreviation or the wildcard.
pub fn is_recognized(code: &str) -> bool {
    code == "all" || LANGUAGES.contains(&code)
}

/// Validates a language code, failing with [`TvdbError::Value`] naming the
/// offending code. Called before any network activity.
pub fn validate(code: &str) -> Result<()> {
    if is_recognized(code) {
        Ok(())
    } else {
        Err(TvdbError::Value(code.to_string()))
    }
}
