//! Extension trait for [`CacheStore`] with typed convenience methods.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{CacheError, CacheStore};

/// Typed convenience methods for [`CacheStore`].
///
/// Implemented as default methods on an extension trait so that
/// [`CacheStore`] stays object-safe and implementors only handle raw bytes.
///
/// # Example
///
/// ```
/// use folio_cache::{CacheStoreExt, NullCache};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct PageData { title: String }
///
/// let cache = NullCache;
/// cache.set_json("page", &PageData { title: "Hello".into() }).unwrap();
/// let data: Option<PageData> = cache.get_json("page");
/// assert!(data.is_none());
/// ```
pub trait CacheStoreExt: CacheStore {
    /// Retrieve a JSON-deserialized value from the cache.
    ///
    /// Returns `None` on cache miss, expiry, or deserialization failure.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Store a value as JSON in the cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Serialization`] if the value cannot be encoded, or
    /// the store's write error.
    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.set(key, &bytes)
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}
