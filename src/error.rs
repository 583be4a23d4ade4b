//! Error types for the TVDB client
//!
//! All failures raised by this crate belong to the single [`TvdbError`]
//! family. Callers can match broadly on the enum or specifically on a
//! variant. Every variant carries a human-readable message naming the
//! offending value.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TvdbError>;

/// All errors raised by the TVDB client.
#[derive(Debug, Error)]
pub enum TvdbError {
    /// The service returned XML that is not well-formed
    #[error("Bad data: {0}")]
    BadData(String),

    /// The transport could not reach the requested URL
    #[error("Unable to connect to {0}")]
    Connection(String),

    /// The service answered with its 404 equivalent for the requested URL
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Access to an unknown or not-yet-hydrated field on an entity
    #[error("{kind} has no attribute '{name}'{detail}")]
    Attribute {
        /// The entity kind the access was made on (Show, Season, Episode, ...)
        kind: &'static str,
        /// The requested field name
        name: String,
        /// Extra detail, e.g. a hint that the field exists but is unhydrated
        detail: String,
    },

    /// Out-of-range index into a Season, Show or search result
    #[error("Index {0} not found")]
    Index(String),

    /// A language code outside the recognized set
    #[error("'{0}' is not a valid language")]
    Value(String),

    /// An invalid or unknown show/episode identifier
    #[error("Invalid id: {0}")]
    Id(String),
}

impl TvdbError {
    /// Builds the attribute error for an entity field miss.
    ///
    /// `known` marks fields that belong to the entity's schema but have not
    /// been hydrated yet; the message then hints at the hydration call
    /// instead of suggesting a typo.
    pub(crate) fn attribute(kind: &'static str, name: &str, known: bool) -> Self {
        let detail = if known {
            " (not loaded yet, hydrate the entity first)".to_string()
        } else {
            String::new()
        };
        TvdbError::Attribute {
            kind,
            name: name.to_string(),
            detail,
        }
    }
}
