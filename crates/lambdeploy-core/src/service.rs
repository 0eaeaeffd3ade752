//! Entry points used by the CLI.

use std::path::PathBuf;
use std::sync::Arc;

use lambdeploy_lambda::{AliasMover, FunctionPublisher, PublishedVersion};
use tracing::info;

use crate::archive::{archive_digest, ArchiveBuilder};
use crate::config::{ConfigResolver, DeployConfig};
use crate::deploy::DeployOrchestrator;
use crate::domain::{DeployError, DeployExecutionContext, DeployRequest, DeployResult, Result};
use crate::obs;

/// A built archive that was not published.
#[derive(Debug, Clone)]
pub struct PackagedArchive {
    pub context: DeployExecutionContext,
    pub bytes: Vec<u8>,
    /// SHA-256 hex of `bytes`
    pub digest: String,
}

/// Binds static config and backends, then serves requests against them.
pub struct DeployService {
    config: DeployConfig,
    project_root: PathBuf,
    archiver: Arc<dyn ArchiveBuilder>,
    publisher: Arc<dyn FunctionPublisher>,
    alias_mover: Arc<dyn AliasMover>,
}

impl DeployService {
    pub fn new(
        config: DeployConfig,
        project_root: impl Into<PathBuf>,
        archiver: Arc<dyn ArchiveBuilder>,
        publisher: Arc<dyn FunctionPublisher>,
        alias_mover: Arc<dyn AliasMover>,
    ) -> Self {
        Self {
            config,
            project_root: project_root.into(),
            archiver,
            publisher,
            alias_mover,
        }
    }

    fn resolve(&self, request: &DeployRequest) -> Result<DeployExecutionContext> {
        ConfigResolver::new(&self.config).resolve(request, &self.project_root)
    }

    /// Archive, publish and go live.
    pub async fn deploy(&self, request: &DeployRequest) -> Result<DeployResult> {
        info!(
            function = %request.function_name,
            env_name = %request.env_name,
            commit_hash = %request.commit_hash,
            "Deploy requested"
        );
        let context = self.resolve(request)?;

        let result = DeployOrchestrator::new(
            context,
            Arc::clone(&self.archiver),
            Arc::clone(&self.publisher),
            Arc::clone(&self.alias_mover),
        )
        .deploy()
        .await?;

        info!(
            function = %result.function_name,
            alias = %result.alias_name,
            function_version = %result.function_version,
            "Deploy completed"
        );
        Ok(result)
    }

    /// Build the archive a deploy would publish, without publishing it.
    pub async fn package(&self, request: &DeployRequest) -> Result<PackagedArchive> {
        let context = self.resolve(request)?;
        let bytes = self
            .archiver
            .build(&context.project_root, &context.manifest, &context.node_env_value)
            .await?;
        let digest = archive_digest(&bytes);
        obs::emit_archive_built(bytes.len(), &digest);

        Ok(PackagedArchive {
            context,
            bytes,
            digest,
        })
    }

    /// Point the configured alias at an already-published version.
    ///
    /// Used to finish a deploy that stopped with `AliasUpdateFailed`.
    pub async fn repair_alias(&self, request: &DeployRequest, version: &str) -> Result<DeployResult> {
        let context = self.resolve(request)?;
        let function = context.function_id();
        let version = PublishedVersion::new(version);

        let binding = self
            .alias_mover
            .move_alias(&function, &context.alias_name, &version)
            .await
            .map_err(|source| DeployError::AliasUpdateFailed {
                function: function.clone(),
                alias: context.alias_name.clone(),
                version: version.as_str().to_string(),
                source,
            })?;
        obs::emit_alias_moved(function.as_str(), &binding.alias, &binding.version);

        Ok(DeployResult {
            function_name: function.to_string(),
            alias_name: context.alias_name,
            function_version: binding.version,
        })
    }
}
