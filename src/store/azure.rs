use crate::{BlobIoError, BlobStore};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode, Url};
use std::time::Duration;
use tracing::debug;

const API_VERSION: &str = "2020-10-02";

/// Block blobs in one container, addressed with a SAS token.
///
/// Writes replace the whole blob. No ETag or lease is taken, so overlapping
/// invocations can lose an append.
pub struct AzureBlobStore {
    endpoint: Url,
    container: String,
    sas: String,
    client: Client,
}

impl AzureBlobStore {
    pub fn new(
        endpoint: String,
        container: String,
        sas: String,
        timeout: Duration,
    ) -> Result<AzureBlobStore, BlobIoError> {
        let endpoint = match Url::parse(&endpoint) {
            Ok(url) if !url.cannot_be_a_base() => url,
            _ => return Err(BlobIoError::InvalidEndpoint(endpoint)),
        };
        let client = Client::builder().timeout(timeout).build()?;
        Ok(AzureBlobStore {
            endpoint,
            container,
            sas,
            client,
        })
    }

    fn blob_url(&self, name: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&self.container).push(name);
        }
        url.set_query(Some(&self.sas));
        url
    }
}

fn unexpected(name: &str, status: StatusCode) -> BlobIoError {
    BlobIoError::Status {
        name: name.to_string(),
        status: status.as_u16(),
    }
}

#[async_trait::async_trait]
impl BlobStore for AzureBlobStore {
    async fn read(&self, name: &str) -> Result<Option<String>, BlobIoError> {
        let res = self
            .client
            .get(self.blob_url(name))
            .header("x-ms-version", API_VERSION)
            .send()
            .await?;
        match res.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(res.text().await?)),
            s => Err(unexpected(name, s)),
        }
    }

    async fn write(&self, name: &str, text: &str) -> Result<(), BlobIoError> {
        debug!("PUT {} ({} bytes)", name, text.len());
        let res = self
            .client
            .put(self.blob_url(name))
            .header("x-ms-version", API_VERSION)
            .header("x-ms-blob-type", "BlockBlob")
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .body(text.to_string())
            .send()
            .await?;
        match res.status() {
            s if s.is_success() => Ok(()),
            s => Err(unexpected(name, s)),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, BlobIoError> {
        let res = self
            .client
            .head(self.blob_url(name))
            .header("x-ms-version", API_VERSION)
            .send()
            .await?;
        match res.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(unexpected(name, s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store(endpoint: &str) -> AzureBlobStore {
        AzureBlobStore::new(
            endpoint.to_string(),
            "capacity".to_string(),
            "sv=2020-10-02&sig=abc%3D".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn builds_blob_urls() {
        let s = store("https://acct.blob.core.windows.net");
        assert_eq!(
            s.blob_url("10-18-2026.json").as_str(),
            "https://acct.blob.core.windows.net/capacity/10-18-2026.json?sv=2020-10-02&sig=abc%3D"
        );
    }

    #[test]
    fn rejects_bad_endpoint() {
        let res = AzureBlobStore::new(
            "not a url".to_string(),
            "capacity".to_string(),
            "sig=x".to_string(),
            Duration::from_secs(5),
        );
        assert!(matches!(res, Err(BlobIoError::InvalidEndpoint(_))));
    }

    #[test]
    fn keeps_endpoint_path() {
        let s = store("http://127.0.0.1:10000/devstoreaccount1");
        assert_eq!(
            s.blob_url("data.json").as_str(),
            "http://127.0.0.1:10000/devstoreaccount1/capacity/data.json?sv=2020-10-02&sig=abc%3D"
        );
    }
}
