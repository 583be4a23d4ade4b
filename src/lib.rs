//! tvdb-api - A client for the TheTVDB XML web service
//!
//! This library wraps the service behind a small typed façade: search for
//! shows by name, fetch shows and episodes by id, hydrate season/episode
//! trees on demand, and browse actors and banners. All network activity is
//! explicit; reading attributes of an already loaded entity never touches
//! the wire.

mod api;
mod attributes;
mod cache;
mod error;
mod language;
mod loader;
mod mapper;
mod xmltree;

// Re-export error types
pub use error::{Result, TvdbError};

// Re-export the façade and its entities
pub use api::{Actor, Banner, Episode, SearchResult, Season, Show, ShowSnapshot, Tvdb};

// Re-export the attribute model
pub use attributes::{AttributeBag, AttributeValue};

// Re-export the transport seam for embedders with their own transport
pub use cache::ResponseCache;
pub use language::LANGUAGES;
pub use loader::{CachedLoader, HttpLoader, Loader};
