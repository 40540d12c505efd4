//! Code archive download over plain HTTP.

use futures::future::{BoxFuture, FutureExt};

use super::{redact_location, ContentFetcher};
use crate::error::FetchError;

/// `ContentFetcher` backed by a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpContentFetcher {
    client: reqwest::Client,
}

impl HttpContentFetcher {
    pub fn new() -> Self {
        HttpContentFetcher {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        HttpContentFetcher { client }
    }

    async fn download(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        log::debug!("[Fetch] GET {}", redact_location(location));

        // Presigned URLs carry credentials; keep them out of error messages.
        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                location: redact_location(location),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Request(e.without_url()))?;

        log::debug!("[Fetch] Downloaded {} bytes", body.len());
        Ok(body.to_vec())
    }
}

impl ContentFetcher for HttpContentFetcher {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        self.download(location).boxed()
    }
}
