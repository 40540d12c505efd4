//! Remote provider seams.
//!
//! `FunctionApi` is the function-management API (versions, aliases, code) and
//! `ContentFetcher` downloads code archives from the provider-issued location.
//! Both return boxed futures so the pipelines can hold them as trait objects.

pub mod aws;
pub mod http;

use futures::future::BoxFuture;

use crate::error::{FetchError, ProviderError};
use crate::models::{AliasName, FunctionCode, FunctionName, LiveCode, Version};

pub use aws::AwsLambdaProvider;
pub use http::HttpContentFetcher;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Function-management operations used by the publisher and the executor.
pub trait FunctionApi: Send + Sync {
    /// Hash of the live code alongside the most recent published version.
    fn live_code<'a>(&'a self, function: &'a FunctionName) -> BoxFuture<'a, ProviderResult<LiveCode>>;

    /// Snapshot the current code as a new immutable version.
    fn publish_version<'a>(
        &'a self,
        function: &'a FunctionName,
    ) -> BoxFuture<'a, ProviderResult<Version>>;

    /// Repoint an existing alias. Fails with `ProviderError::NotFound` if it is missing.
    fn update_alias<'a>(
        &'a self,
        function: &'a FunctionName,
        alias: &'a AliasName,
        target: &'a Version,
    ) -> BoxFuture<'a, ProviderResult<()>>;

    /// Create an alias. Fails with `ProviderError::Conflict` if it already exists.
    fn create_alias<'a>(
        &'a self,
        function: &'a FunctionName,
        alias: &'a AliasName,
        target: &'a Version,
    ) -> BoxFuture<'a, ProviderResult<()>>;

    /// Read the function record addressed by `qualifier`.
    fn get_function<'a>(
        &'a self,
        function: &'a FunctionName,
        qualifier: &'a AliasName,
    ) -> BoxFuture<'a, ProviderResult<FunctionCode>>;

    /// Replace the live (unqualified) code of the function.
    fn update_function_code<'a>(
        &'a self,
        function: &'a FunctionName,
        zip_file: Vec<u8>,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}

/// Unauthenticated download of a code archive.
pub trait ContentFetcher: Send + Sync {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

/// Strip the query string (presigned credentials) from a code location for logs.
pub fn redact_location(location: &str) -> String {
    match reqwest::Url::parse(location) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => location
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}
