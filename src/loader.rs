//! Transport layer
//!
//! The façade never talks to the network directly; it goes through the
//! [`Loader`] trait. The default implementation is a blocking HTTP client
//! wrapped in an on-disk response cache. Tests (and embedders with their
//! own transport) inject a different implementation through the same seam.

use crate::cache::ResponseCache;
use crate::error::{Result, TvdbError};
use tracing::{debug, warn};

/// Capability to fetch a service URL as raw bytes.
///
/// `use_cache=false` forces a fresh fetch; implementations that cache are
/// still allowed to store the fresh response for later.
pub trait Loader: Send + Sync {
    /// Loads the given URL, failing with [`TvdbError::Connection`] when the
    /// URL is unreachable and [`TvdbError::NotFound`] when the service
    /// answers with its 404 equivalent.
    fn load(&self, url: &str, use_cache: bool) -> Result<Vec<u8>>;
}

/// Blocking HTTP loader for the service endpoints.
pub struct HttpLoader {
    client: reqwest::blocking::Client,
}

impl HttpLoader {
    /// Creates a new HTTP loader.
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader for HttpLoader {
    fn load(&self, url: &str, _use_cache: bool) -> Result<Vec<u8>> {
        debug!(url, "loading data");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|_| TvdbError::Connection(url.to_string()))?;

        if response.status() == 404 {
            return Err(TvdbError::NotFound(url.to_string()));
        }

        if !response.status().is_success() {
            return Err(TvdbError::Connection(format!(
                "{} (HTTP {})",
                url,
                response.status().as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|_| TvdbError::Connection(url.to_string()))?;

        Ok(bytes.to_vec())
    }
}

/// A caching wrapper for loaders.
///
/// Wraps another loader and keeps responses in a persistent on-disk cache
/// to avoid redundant requests across runs. Cache read or write failures
/// never fail the request; the wrapped loader is consulted instead.
pub struct CachedLoader<L>
where
    L: Loader,
{
    /// The underlying loader
    inner: L,
    /// Persistent storage for response bodies
    cache: ResponseCache,
}

impl<L> CachedLoader<L>
where
    L: Loader,
{
    /// Creates a new caching loader wrapping the given loader.
    pub fn new(inner: L, cache: ResponseCache) -> Self {
        Self { inner, cache }
    }

    fn cache_key(url: &str) -> String {
        blake3::hash(url.as_bytes()).to_hex().to_string()
    }
}

impl<L> Loader for CachedLoader<L>
where
    L: Loader,
{
    fn load(&self, url: &str, use_cache: bool) -> Result<Vec<u8>> {
        let key = Self::cache_key(url);

        if use_cache {
            match self.cache.load(&key) {
                Ok(Some(body)) => {
                    debug!(url, "cache hit");
                    return Ok(body.into_bytes());
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(url, %err, "cache read failed, fetching from server");
                }
            }
        } else {
            debug!(url, "ignoring cached data");
        }

        let bytes = self.inner.load(url, use_cache)?;

        let body = String::from_utf8_lossy(&bytes);
        if let Err(err) = self.cache.store(&key, url, &body) {
            warn!(url, %err, "cache write failed");
        }

        Ok(bytes)
    }
}
