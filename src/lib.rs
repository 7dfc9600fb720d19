pub mod accumulate;
pub mod config;
pub mod evaluate;
pub mod extract;
pub mod fetch;
pub mod rotation;
pub mod runner;
pub mod schedule;
pub mod store;

mod error;
mod utils;

pub use config::{AccumulatorKind, Config};
pub use error::{BlobIoError, CapacityError};
pub use runner::{JobRunner, RunReport};
pub use utils::{get_now, parse_utc_offset};

#[async_trait::async_trait]
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CapacityError>;
}

/// Runs an untrusted snippet and returns its `data` value as JSON text.
///
/// Implementations must not give the snippet any way to reach the host:
/// no file, network or process access from inside the evaluated scope.
#[async_trait::async_trait]
pub trait ScriptEvaluator {
    async fn evaluate(&self, snippet: &str) -> Result<String, CapacityError>;
}

pub trait Accumulator {
    fn append(&self, existing: &str, timestamp: &str, value: &str)
        -> Result<String, CapacityError>;
}

/// Whole-object text storage, one object per name.
#[async_trait::async_trait]
pub trait BlobStore {
    /// `None` when the object does not exist.
    async fn read(&self, name: &str) -> Result<Option<String>, BlobIoError>;
    async fn write(&self, name: &str, text: &str) -> Result<(), BlobIoError>;

    async fn exists(&self, name: &str) -> Result<bool, BlobIoError> {
        Ok(self.read(name).await?.is_some())
    }

    /// Creates `name` with empty text unless it already exists. Returns
    /// whether it was created.
    async fn create_if_missing(&self, name: &str) -> Result<bool, BlobIoError> {
        if self.exists(name).await? {
            return Ok(false);
        }
        self.write(name, "").await?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl<T> BlobStore for &T
where
    T: BlobStore + Sync + ?Sized,
{
    async fn read(&self, name: &str) -> Result<Option<String>, BlobIoError> {
        (**self).read(name).await
    }

    async fn write(&self, name: &str, text: &str) -> Result<(), BlobIoError> {
        (**self).write(name, text).await
    }

    async fn exists(&self, name: &str) -> Result<bool, BlobIoError> {
        (**self).exists(name).await
    }
}
