//! Cache-aside layer for rendered documents.
//!
//! Documents are stored under a key built from the resource path, the
//! safe-for-work scope and the output format, so the same resource never
//! serves a document rendered for another scope or format. Concurrent misses
//! for one key each compute and write; the last write wins.

pub mod backend;
pub mod memory;
pub mod redis;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

pub use backend::{BackendError, CacheBackend};
pub use memory::MemoryBackend;
pub use redis::RedisBackend;

use crate::Result;
use crate::config::CacheSettings;
use crate::error::FaError;
use crate::format::ResponseFormat;

/// Which of the two configured lifetimes an entry gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    Short,
    Long,
}

impl TtlClass {
    /// Feeds are polled by readers and change slowly; everything else is short.
    pub fn for_format(format: ResponseFormat) -> Self {
        match format {
            ResponseFormat::Rss => Self::Long,
            ResponseFormat::Json | ResponseFormat::Xml => Self::Short,
        }
    }
}

/// `{resource}.{sfw|nsfw}.{format}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(resource: &str, safe_for_work: bool, format: ResponseFormat) -> Self {
        Self(format!(
            "{resource}.{}.{}",
            scope_tag(safe_for_work),
            format.extension()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn scope_tag(safe_for_work: bool) -> &'static str {
    if safe_for_work { "sfw" } else { "nsfw" }
}

const TOO_LARGE_MESSAGE: &str = "The page returned from FA was too large to fit in the cache";

fn classify_backend_error(err: BackendError) -> FaError {
    match err {
        BackendError::OutOfMemory(msg) => {
            warn!(error = %msg, "Cache store refused a write");
            FaError::cache(TOO_LARGE_MESSAGE)
        }
        BackendError::Unavailable(msg) => {
            FaError::cache(format!("Error accessing Redis Cache: {msg}"))
        }
    }
}

/// Document cache over a [`CacheBackend`].
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
    short_ttl: Duration,
    long_ttl: Duration,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>, settings: &CacheSettings) -> Self {
        Self {
            backend,
            short_ttl: settings.short_ttl,
            long_ttl: settings.long_ttl,
        }
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub fn ttl(&self, class: TtlClass) -> Duration {
        match class {
            TtlClass::Short => self.short_ttl,
            TtlClass::Long => self.long_ttl,
        }
    }

    /// Return the cached document for `key`, or compute, store and return it.
    ///
    /// A compute failure is returned as-is and nothing is written. Store
    /// failures on either read or write become `Cache` errors.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &CacheKey,
        ttl: TtlClass,
        compute: F,
    ) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if let Some(document) = self
            .backend
            .get(key.as_str())
            .await
            .map_err(classify_backend_error)?
        {
            debug!(key = %key, "Cache hit");
            return Ok(document);
        }

        debug!(key = %key, "Cache miss");
        let document = compute().await?;

        self.backend
            .set(key.as_str(), &document, Some(self.ttl(ttl)))
            .await
            .map_err(classify_backend_error)?;

        Ok(document)
    }

    /// Drop one entry.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.backend
            .delete(key)
            .await
            .map_err(|e| classify_backend_error(e).into())
    }

    pub async fn ping(&self) -> Result<()> {
        self.backend
            .ping()
            .await
            .map_err(|e| classify_backend_error(e).into())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::ErrorKind;

    fn cache_with(backend: Arc<dyn CacheBackend>) -> Cache {
        Cache::new(backend, &CacheSettings::default())
    }

    struct FailingBackend(fn() -> BackendError);

    #[async_trait]
    impl CacheBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn get(&self, _key: &str) -> std::result::Result<Option<String>, BackendError> {
            Ok(None)
        }

        async fn set(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Option<Duration>,
        ) -> std::result::Result<(), BackendError> {
            Err((self.0)())
        }

        async fn delete(&self, _key: &str) -> std::result::Result<(), BackendError> {
            Err((self.0)())
        }

        async fn ping(&self) -> std::result::Result<(), BackendError> {
            Err((self.0)())
        }
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(
            CacheKey::new("/user/fender/gallery:1", true, ResponseFormat::Json).as_str(),
            "/user/fender/gallery:1.sfw.json"
        );
        assert_eq!(
            CacheKey::new("/user/fender/gallery:1", false, ResponseFormat::Rss).as_str(),
            "/user/fender/gallery:1.nsfw.rss"
        );
    }

    #[test]
    fn test_ttl_class() {
        assert_eq!(TtlClass::for_format(ResponseFormat::Rss), TtlClass::Long);
        assert_eq!(TtlClass::for_format(ResponseFormat::Json), TtlClass::Short);
        assert_eq!(TtlClass::for_format(ResponseFormat::Xml), TtlClass::Short);

        let cache = cache_with(Arc::new(MemoryBackend::new(4)));
        assert_eq!(cache.ttl(TtlClass::Short), Duration::from_secs(30));
        assert_eq!(cache.ttl(TtlClass::Long), Duration::from_secs(86_400));
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = cache_with(Arc::new(MemoryBackend::new(4)));
        let key = CacheKey::new("/search:q", false, ResponseFormat::Json);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let document = cache
                .get_or_compute(&key, TtlClass::Short, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("[]".to_string())
                })
                .await
                .unwrap();
            assert_eq!(document, "[]");
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = cache_with(Arc::new(MemoryBackend::new(4)));
        let key = CacheKey::new("/search:q", false, ResponseFormat::Json);
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let compute = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("[]".to_string())
        };

        cache.get_or_compute(&key, TtlClass::Short, compute).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        cache.get_or_compute(&key, TtlClass::Short, compute).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_entry_outlives_short_ttl() {
        let cache = cache_with(Arc::new(MemoryBackend::new(4)));
        let key = CacheKey::new("/user/fender/gallery:1", false, ResponseFormat::Rss);
        let ttl = TtlClass::for_format(ResponseFormat::Rss);
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let compute = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok("<rss/>".to_string())
        };

        cache.get_or_compute(&key, ttl, compute).await.unwrap();
        tokio::time::advance(cache.ttl(TtlClass::Short) + Duration::from_secs(1)).await;
        cache.get_or_compute(&key, ttl, compute).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        tokio::time::advance(cache.ttl(TtlClass::Long)).await;
        cache.get_or_compute(&key, ttl, compute).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_compute_failure_is_not_cached() {
        let backend = Arc::new(MemoryBackend::new(4));
        let cache = cache_with(backend.clone());
        let key = CacheKey::new("/user/x/gallery:1", false, ResponseFormat::Json);

        let err = cache
            .get_or_compute(&key, TtlClass::Short, || async {
                Err(FaError::new(ErrorKind::System, "This user cannot be found.").into())
            })
            .await
            .unwrap_err();
        assert_eq!(err.as_fa().unwrap().kind, ErrorKind::System);
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_memory_is_reported_as_too_large() {
        let cache = cache_with(Arc::new(FailingBackend(|| {
            BackendError::OutOfMemory("OOM command not allowed".to_string())
        })));
        let key = CacheKey::new("/search:q", false, ResponseFormat::Json);

        let err = cache
            .get_or_compute(&key, TtlClass::Short, || async { Ok("big".to_string()) })
            .await
            .unwrap_err();
        let fa = err.as_fa().unwrap();
        assert_eq!(fa.kind, ErrorKind::Cache);
        assert_eq!(fa.message, TOO_LARGE_MESSAGE);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_detail() {
        let cache = cache_with(Arc::new(FailingBackend(|| {
            BackendError::Unavailable("connection refused".to_string())
        })));

        let err = cache.ping().await.unwrap_err();
        let fa = err.as_fa().unwrap();
        assert_eq!(fa.kind, ErrorKind::Cache);
        assert_eq!(fa.message, "Error accessing Redis Cache: connection refused");
    }

    #[tokio::test]
    async fn test_remove() {
        let backend = Arc::new(MemoryBackend::new(4));
        let cache = cache_with(backend.clone());
        let key = CacheKey::new("/search:q", true, ResponseFormat::Xml);
        cache
            .get_or_compute(&key, TtlClass::Short, || async { Ok("<r/>".to_string()) })
            .await
            .unwrap();

        cache.remove(key.as_str()).await.unwrap();
        assert!(backend.is_empty());
    }
}
