//! AWS Lambda backend for `FunctionPublisher` and `AliasMover`.
//!
//! Built from an explicit [`LambdaClientConfig`] rather than ambient process
//! credentials, so each deploy owns its own client.

use async_trait::async_trait;
use aws_sdk_lambda as lambda;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::operation::update_alias::UpdateAliasError;
use aws_sdk_lambda::operation::update_function_code::UpdateFunctionCodeError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LambdaError;
use crate::service_traits::*;

/// Region and static key pair used to reach the Lambda API.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaClientConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl std::fmt::Debug for LambdaClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LambdaClientConfig")
            .field("access_key_id", &"<redacted>")
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Function service backed by the AWS Lambda API.
#[derive(Debug, Clone)]
pub struct AwsLambdaService {
    client: lambda::Client,
}

impl AwsLambdaService {
    /// Build a client from static credentials.
    ///
    /// SDK-level retries are disabled: a failed call surfaces once and the
    /// caller decides whether to re-run the deploy.
    pub fn new(config: &LambdaClientConfig) -> Self {
        let credentials = lambda::config::Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "lambdeploy",
        );

        let sdk_config = lambda::Config::builder()
            .behavior_version_latest()
            .region(lambda::config::Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(lambda::config::retry::RetryConfig::disabled())
            .build();

        Self {
            client: lambda::Client::from_conf(sdk_config),
        }
    }
}

#[async_trait]
impl FunctionPublisher for AwsLambdaService {
    async fn publish(
        &self,
        function: &FunctionId,
        archive: Vec<u8>,
    ) -> LambdaResult<PublishedVersion> {
        debug!(function = %function, bytes = archive.len(), "UpdateFunctionCode");

        let output = self
            .client
            .update_function_code()
            .function_name(function.as_str())
            .publish(true)
            .zip_file(lambda::primitives::Blob::new(archive))
            .send()
            .await
            .map_err(|err| {
                let detail = DisplayErrorContext(&err).to_string();
                match err.as_service_error() {
                    Some(UpdateFunctionCodeError::ResourceNotFoundException(_)) => {
                        LambdaError::FunctionNotFound {
                            function: function.to_string(),
                        }
                    }
                    Some(UpdateFunctionCodeError::CodeStorageExceededException(_)) => {
                        LambdaError::CodeStorageExceeded(detail)
                    }
                    Some(UpdateFunctionCodeError::TooManyRequestsException(_)) => {
                        LambdaError::Throttled(detail)
                    }
                    _ => LambdaError::Service(detail),
                }
            })?;

        let version = output.version().ok_or(LambdaError::MissingField {
            operation: "UpdateFunctionCode",
            field: "Version",
        })?;

        let mut published = PublishedVersion::new(version);
        if let Some(sha) = output.code_sha256() {
            published = published.with_code_sha256(sha);
        }
        Ok(published)
    }
}

#[async_trait]
impl AliasMover for AwsLambdaService {
    async fn move_alias(
        &self,
        function: &FunctionId,
        alias: &str,
        version: &PublishedVersion,
    ) -> LambdaResult<AliasBinding> {
        debug!(function = %function, alias = %alias, version = %version, "UpdateAlias");

        let output = self
            .client
            .update_alias()
            .function_name(function.as_str())
            .name(alias)
            .function_version(version.as_str())
            .send()
            .await
            .map_err(|err| {
                let detail = DisplayErrorContext(&err).to_string();
                match err.as_service_error() {
                    Some(UpdateAliasError::ResourceNotFoundException(_)) => {
                        LambdaError::ResourceNotFound {
                            function: function.to_string(),
                            detail,
                        }
                    }
                    Some(UpdateAliasError::TooManyRequestsException(_)) => {
                        LambdaError::Throttled(detail)
                    }
                    _ => LambdaError::Service(detail),
                }
            })?;

        let echoed = output.function_version().ok_or(LambdaError::MissingField {
            operation: "UpdateAlias",
            field: "FunctionVersion",
        })?;

        Ok(AliasBinding {
            function: function.clone(),
            alias: output.name().unwrap_or(alias).to_string(),
            version: echoed.to_string(),
            alias_arn: output.alias_arn().map(ToString::to_string),
            bound_at: Utc::now(),
        })
    }
}
