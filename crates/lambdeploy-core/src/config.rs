//! Static deploy configuration and its resolution into a deploy context.
//!
//! Two JSON files live in the config directory:
//! - `deployConfig.json`: functions, their zip contents and environments
//! - `deployCredentials.json`: region and key pair for the Lambda API
//!
//! Lookups reject both zero and multiple matches, so an ambiguous config
//! never picks an arbitrary entry.

use std::path::{Component, Path};

use lambdeploy_lambda::LambdaClientConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{DeployError, DeployExecutionContext, DeployManifest, DeployRequest, Result};

/// File name of the deploy config inside the config directory.
pub const DEPLOY_CONFIG_FILE: &str = "deployConfig.json";

/// File name of the credentials file inside the config directory.
pub const CREDENTIALS_FILE: &str = "deployCredentials.json";

/// Top-level deploy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    pub lambda_functions: Vec<FunctionConfig>,
}

/// Packaging rules and environments for one logical function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConfig {
    pub function_name: String,
    /// Files and directories, relative to the project root, to zip
    pub zip_contents: DeployManifest,
    pub environments: Vec<EnvironmentConfig>,
}

/// Per-environment deploy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    pub env_name: String,
    /// Defaults to `env_name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_env_value: Option<String>,
    /// Alias repointed after each publish
    pub live_alias_name: String,
}

impl EnvironmentConfig {
    /// The value written as `NODE_ENV`.
    pub fn node_env(&self) -> &str {
        self.node_env_value.as_deref().unwrap_or(&self.env_name)
    }
}

impl DeployConfig {
    /// Parse a config document. Does not validate.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DeployError::Configuration(format!("malformed deploy config: {}", e)))
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DeployError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_json(&raw)?;
        config.validate()?;
        debug!(path = %path.display(), functions = config.lambda_functions.len(), "Loaded deploy config");
        Ok(config)
    }

    /// Structural checks that do not depend on the request.
    ///
    /// Duplicate function or environment names are not rejected here; they
    /// only fail when a request actually resolves to them.
    pub fn validate(&self) -> Result<()> {
        for function in &self.lambda_functions {
            if function.function_name.is_empty() {
                return Err(DeployError::Configuration(
                    "lambda function with empty functionName".to_string(),
                ));
            }
            for entry in function.zip_contents.iter() {
                let escapes = Path::new(entry).components().any(|c| {
                    matches!(
                        c,
                        Component::ParentDir | Component::RootDir | Component::Prefix(_)
                    )
                });
                if escapes {
                    return Err(DeployError::Configuration(format!(
                        "lambda function {} has zipContents entry {:?} outside the project root",
                        function.function_name, entry
                    )));
                }
            }
            for env in &function.environments {
                if env.live_alias_name.is_empty() {
                    return Err(DeployError::Configuration(format!(
                        "lambda function {} environment {} has an empty liveAliasName",
                        function.function_name, env.env_name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsFile {
    aws_credentials: LambdaClientConfig,
}

/// Read the credentials file.
///
/// Error messages name the file only, never its contents.
pub fn load_credentials(path: &Path) -> Result<LambdaClientConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        DeployError::Configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    let file: CredentialsFile = serde_json::from_str(&raw).map_err(|e| {
        DeployError::Configuration(format!(
            "malformed credentials file {} (line {}, column {})",
            path.display(),
            e.line(),
            e.column()
        ))
    })?;
    Ok(file.aws_credentials)
}

/// Resolves a deploy request against static config.
#[derive(Debug, Clone, Copy)]
pub struct ConfigResolver<'a> {
    config: &'a DeployConfig,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(config: &'a DeployConfig) -> Self {
        Self { config }
    }

    /// The single function entry named `function_name`.
    pub fn find_function(&self, function_name: &str) -> Result<&'a FunctionConfig> {
        let matches: Vec<&FunctionConfig> = self
            .config
            .lambda_functions
            .iter()
            .filter(|f| f.function_name == function_name)
            .collect();
        match matches.as_slice() {
            [single] => Ok(*single),
            [] => Err(DeployError::Configuration(format!(
                "no lambda functions with name {}",
                function_name
            ))),
            _ => Err(DeployError::Configuration(format!(
                "multiple lambda functions with name {}",
                function_name
            ))),
        }
    }

    /// The single environment named `env_name` under `function`.
    pub fn find_environment(
        &self,
        function: &'a FunctionConfig,
        env_name: &str,
    ) -> Result<&'a EnvironmentConfig> {
        let matches: Vec<&EnvironmentConfig> = function
            .environments
            .iter()
            .filter(|e| e.env_name == env_name)
            .collect();
        match matches.as_slice() {
            [single] => Ok(*single),
            [] => Err(DeployError::Configuration(format!(
                "lambda function {} has no environment named {}",
                function.function_name, env_name
            ))),
            _ => Err(DeployError::Configuration(format!(
                "lambda function {} has multiple environments named {}",
                function.function_name, env_name
            ))),
        }
    }

    /// Build the execution context for one deploy.
    pub fn resolve(
        &self,
        request: &DeployRequest,
        project_root: &Path,
    ) -> Result<DeployExecutionContext> {
        let function = self.find_function(&request.function_name)?;
        let environment = self.find_environment(function, &request.env_name)?;

        Ok(DeployExecutionContext {
            function_name: function.function_name.clone(),
            env_name: environment.env_name.clone(),
            node_env_value: environment.node_env().to_string(),
            alias_name: environment.live_alias_name.clone(),
            commit_hash: request.commit_hash.clone(),
            project_root: project_root.to_path_buf(),
            manifest: function.zip_contents.clone(),
        })
    }
}
