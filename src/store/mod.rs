mod azure;
mod sqlite;

pub use azure::AzureBlobStore;
pub use sqlite::SqliteBlobStore;

use crate::{BlobIoError, BlobStore, CapacityError, Config};
use tracing::info;

/// Where the capacity documents live, parsed from `BlobConnectionString`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobConnection {
    /// `sqlite:<path>` or `sqlite://<path>`
    Sqlite { path: String },
    /// Azure Storage connection string carrying a SAS token.
    Azure { endpoint: String, sas: String },
}

impl BlobConnection {
    pub fn parse(s: &str) -> Result<BlobConnection, CapacityError> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("sqlite://").or_else(|| s.strip_prefix("sqlite:")) {
            if path.is_empty() {
                return Err(invalid("sqlite connection has no path"));
            }
            return Ok(BlobConnection::Sqlite {
                path: path.to_string(),
            });
        }

        let mut endpoint = None;
        let mut sas = None;
        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = part.split_once('=') else {
                return Err(invalid(&format!("expected key=value, got `{}`", part)));
            };
            match key.trim() {
                "BlobEndpoint" => endpoint = Some(value.trim().trim_end_matches('/').to_string()),
                "SharedAccessSignature" => {
                    sas = Some(value.trim().trim_start_matches('?').to_string())
                }
                _ => {}
            }
        }

        match (endpoint, sas) {
            (Some(endpoint), Some(sas)) if !endpoint.is_empty() && !sas.is_empty() => {
                Ok(BlobConnection::Azure { endpoint, sas })
            }
            _ => Err(invalid(
                "expected `sqlite:<path>` or BlobEndpoint and SharedAccessSignature entries",
            )),
        }
    }
}

fn invalid(reason: &str) -> CapacityError {
    CapacityError::ConfigInvalid {
        key: "BlobConnectionString",
        reason: reason.to_string(),
    }
}

pub enum Backend {
    Sqlite(SqliteBlobStore),
    Azure(AzureBlobStore),
}

impl Backend {
    pub async fn connect(config: &Config) -> Result<Backend, CapacityError> {
        match BlobConnection::parse(&config.blob_connection_string)? {
            BlobConnection::Sqlite { path } => {
                info!("Using sqlite blob store at {}", path);
                let store = SqliteBlobStore::new(&path, &config.blob_container_name).await?;
                Ok(Backend::Sqlite(store))
            }
            BlobConnection::Azure { endpoint, sas } => {
                info!("Using blob container {}/{}", endpoint, config.blob_container_name);
                let store = AzureBlobStore::new(
                    endpoint,
                    config.blob_container_name.clone(),
                    sas,
                    config.blob_timeout,
                )?;
                Ok(Backend::Azure(store))
            }
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for Backend {
    async fn read(&self, name: &str) -> Result<Option<String>, BlobIoError> {
        match self {
            Backend::Sqlite(s) => s.read(name).await,
            Backend::Azure(s) => s.read(name).await,
        }
    }

    async fn write(&self, name: &str, text: &str) -> Result<(), BlobIoError> {
        match self {
            Backend::Sqlite(s) => s.write(name, text).await,
            Backend::Azure(s) => s.write(name, text).await,
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, BlobIoError> {
        match self {
            Backend::Sqlite(s) => s.exists(name).await,
            Backend::Azure(s) => s.exists(name).await,
        }
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryBlobStore;
