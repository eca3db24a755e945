//! Blob store seam for killswitch sources.
//!
//! A poller only needs one operation from its backend: fetch the raw bytes
//! at a locator. S3, Azure Blob, GCS, or an HTTP endpoint can be plugged in
//! by implementing [`BlobStore`]; [`FileStore`] and [`BlobStoreFn`] cover the
//! local filesystem and ad-hoc closures.

use crate::{KillswitchError, KillswitchResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::io::ErrorKind;
use std::sync::Arc;

/// Generic blob store.
///
/// Implementations should return [`KillswitchError::NotFound`] when the
/// object does not exist so file-style sources can treat absence as
/// "nothing disabled".
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the raw bytes stored at `locator`.
    async fn get_blob_data(&self, locator: &str) -> KillswitchResult<Bytes>;
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn get_blob_data(&self, locator: &str) -> KillswitchResult<Bytes> {
        (**self).get_blob_data(locator).await
    }
}

/// Local filesystem store; the locator is a file path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    /// Create a file store.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BlobStore for FileStore {
    async fn get_blob_data(&self, locator: &str) -> KillswitchResult<Bytes> {
        match tokio::fs::read(locator).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(KillswitchError::NotFound(locator.to_string()))
            }
            Err(e) => Err(KillswitchError::Io(e)),
        }
    }
}

/// Adapts an async closure into a [`BlobStore`].
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use tripwire_killswitch::{BlobStore, BlobStoreFn};
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = BlobStoreFn::new(|_locator: String| async move {
///     Ok(Bytes::from_static(b"checkout-v2\n"))
/// });
///
/// let data = store.get_blob_data("s3://flags/killswitch").await.unwrap();
/// assert_eq!(&data[..], b"checkout-v2\n");
/// # }
/// ```
pub struct BlobStoreFn<F> {
    fetch: F,
}

impl<F> BlobStoreFn<F> {
    /// Wrap a closure.
    pub fn new(fetch: F) -> Self {
        Self { fetch }
    }
}

#[async_trait]
impl<F, Fut> BlobStore for BlobStoreFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = KillswitchResult<Bytes>> + Send,
{
    async fn get_blob_data(&self, locator: &str) -> KillswitchResult<Bytes> {
        (self.fetch)(locator.to_string()).await
    }
}
