//! AWS Lambda implementation of `FunctionApi`.

use aws_sdk_lambda::config::{BehaviorVersion, Region};
use aws_sdk_lambda::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::Client;
use futures::future::{BoxFuture, FutureExt};

use super::{FunctionApi, ProviderResult};
use crate::config::ProviderSettings;
use crate::error::ProviderError;
use crate::models::{AliasName, FunctionCode, FunctionName, LiveCode, Version, VersionSnapshot};

/// Unpublished live code slot; never a valid alias target.
const LATEST_QUALIFIER: &str = "$LATEST";

#[derive(Debug, Clone)]
pub struct AwsLambdaProvider {
    client: Client,
}

impl AwsLambdaProvider {
    /// Build a client for `region`, honoring the endpoint and profile overrides.
    pub async fn connect(settings: &ProviderSettings, region: &str) -> Self {
        let mut config_builder = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()));

        if let Some(endpoint_url) = &settings.endpoint_url {
            log::info!("[Provider] Using Lambda endpoint override {}", endpoint_url);
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        if let Some(profile) = &settings.profile {
            config_builder = config_builder.profile_name(profile);
        }

        let sdk_config = config_builder.load().await;
        AwsLambdaProvider {
            client: Client::new(&sdk_config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        AwsLambdaProvider { client }
    }

    async fn live(&self, function: &FunctionName) -> ProviderResult<LiveCode> {
        let mut marker: Option<String> = None;
        let mut live_sha256: Option<String> = None;
        let mut latest: Option<(u64, String)> = None;

        loop {
            let page = self
                .client
                .list_versions_by_function()
                .function_name(function.as_str())
                .set_marker(marker.take())
                .send()
                .await
                .map_err(classify)?;

            for config in page.versions() {
                let sha256 = config.code_sha256().unwrap_or_default().to_string();
                match config.version() {
                    Some(LATEST_QUALIFIER) => live_sha256 = Some(sha256),
                    Some(version) => {
                        if let Ok(number) = version.parse::<u64>() {
                            if latest.as_ref().map_or(true, |(current, _)| number > *current) {
                                latest = Some((number, sha256));
                            }
                        }
                    }
                    None => {}
                }
            }

            match page.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        let code_sha256 = match live_sha256 {
            Some(sha256) => sha256,
            None => {
                let config = self
                    .client
                    .get_function_configuration()
                    .function_name(function.as_str())
                    .qualifier(LATEST_QUALIFIER)
                    .send()
                    .await
                    .map_err(classify)?;
                config.code_sha256().unwrap_or_default().to_string()
            }
        };

        Ok(LiveCode {
            code_sha256,
            latest_published: latest.map(|(number, code_sha256)| VersionSnapshot {
                version: Version::new(number.to_string()),
                code_sha256,
            }),
        })
    }

    async fn publish(&self, function: &FunctionName) -> ProviderResult<Version> {
        let output = self
            .client
            .publish_version()
            .function_name(function.as_str())
            .send()
            .await
            .map_err(classify)?;

        match output.version() {
            Some(version) if version != LATEST_QUALIFIER => Ok(Version::new(version)),
            _ => Err(ProviderError::Rejected(format!(
                "PublishVersion for {} returned no version",
                function
            ))),
        }
    }

    async fn update_alias_target(
        &self,
        function: &FunctionName,
        alias: &AliasName,
        target: &Version,
    ) -> ProviderResult<()> {
        self.client
            .update_alias()
            .function_name(function.as_str())
            .name(alias.as_str())
            .function_version(target.as_str())
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn create_alias_target(
        &self,
        function: &FunctionName,
        alias: &AliasName,
        target: &Version,
    ) -> ProviderResult<()> {
        self.client
            .create_alias()
            .function_name(function.as_str())
            .name(alias.as_str())
            .function_version(target.as_str())
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn qualified_function(
        &self,
        function: &FunctionName,
        qualifier: &AliasName,
    ) -> ProviderResult<FunctionCode> {
        let output = self
            .client
            .get_function()
            .function_name(function.as_str())
            .qualifier(qualifier.as_str())
            .send()
            .await
            .map_err(classify)?;

        let configuration = output.configuration();
        Ok(FunctionCode {
            version: configuration
                .and_then(|c| c.version())
                .map(Version::new),
            location: output
                .code()
                .and_then(|code| code.location())
                .map(str::to_string),
            code_size: configuration
                .map(|c| c.code_size())
                .and_then(|size| u64::try_from(size).ok())
                .unwrap_or_default(),
        })
    }

    async fn upload_code(&self, function: &FunctionName, zip_file: Vec<u8>) -> ProviderResult<()> {
        self.client
            .update_function_code()
            .function_name(function.as_str())
            .zip_file(Blob::new(zip_file))
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }
}

impl FunctionApi for AwsLambdaProvider {
    fn live_code<'a>(&'a self, function: &'a FunctionName) -> BoxFuture<'a, ProviderResult<LiveCode>> {
        self.live(function).boxed()
    }

    fn publish_version<'a>(
        &'a self,
        function: &'a FunctionName,
    ) -> BoxFuture<'a, ProviderResult<Version>> {
        self.publish(function).boxed()
    }

    fn update_alias<'a>(
        &'a self,
        function: &'a FunctionName,
        alias: &'a AliasName,
        target: &'a Version,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        self.update_alias_target(function, alias, target).boxed()
    }

    fn create_alias<'a>(
        &'a self,
        function: &'a FunctionName,
        alias: &'a AliasName,
        target: &'a Version,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        self.create_alias_target(function, alias, target).boxed()
    }

    fn get_function<'a>(
        &'a self,
        function: &'a FunctionName,
        qualifier: &'a AliasName,
    ) -> BoxFuture<'a, ProviderResult<FunctionCode>> {
        self.qualified_function(function, qualifier).boxed()
    }

    fn update_function_code<'a>(
        &'a self,
        function: &'a FunctionName,
        zip_file: Vec<u8>,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        self.upload_code(function, zip_file).boxed()
    }
}

/// Map an SDK failure onto a `ProviderError` kind.
fn classify<E, R>(err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();

    if matches!(
        err,
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_)
    ) {
        return ProviderError::Transport(message);
    }

    classify_code(err.code(), message)
}

/// Map a Lambda error code onto a `ProviderError` kind.
pub fn classify_code(code: Option<&str>, message: String) -> ProviderError {
    match code {
        Some("ResourceNotFoundException") => ProviderError::NotFound(message),
        Some("ResourceConflictException") => ProviderError::Conflict(message),
        Some("AccessDeniedException") | Some("AccessDenied") => {
            ProviderError::AccessDenied(message)
        }
        Some("RequestTooLargeException")
        | Some("CodeStorageExceededException")
        | Some("InvalidParameterValueException")
        | Some("InvalidZipFileException") => ProviderError::Payload(message),
        Some("TooManyRequestsException") | Some("ServiceException") => {
            ProviderError::Transport(message)
        }
        _ => ProviderError::Rejected(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_code() {
        assert!(classify_code(Some("ResourceNotFoundException"), String::new()).is_not_found());
        assert_eq!(
            classify_code(Some("ResourceConflictException"), "exists".to_string()),
            ProviderError::Conflict("exists".to_string())
        );
        assert!(classify_code(Some("AccessDeniedException"), String::new()).is_access_denied());
        assert!(matches!(
            classify_code(Some("RequestTooLargeException"), String::new()),
            ProviderError::Payload(_)
        ));
        assert!(matches!(
            classify_code(None, String::new()),
            ProviderError::Rejected(_)
        ));
    }
}
