//! The publish-then-alias deploy protocol.
//!
//! One [`DeployOrchestrator`] runs one deploy: build the archive, publish it
//! as a new immutable version, then repoint the alias at that version. Each
//! step starts only after the previous one succeeded.

use std::sync::Arc;

use lambdeploy_lambda::{AliasMover, FunctionId, FunctionPublisher};
use tracing::Instrument;
use uuid::Uuid;

use crate::archive::{archive_digest, ArchiveBuilder};
use crate::domain::{DeployError, DeployExecutionContext, DeployResult, DeployStage, Result};
use crate::obs;

/// Drives a single deploy through its stages.
///
/// [`deploy`](Self::deploy) consumes the orchestrator, so a context can
/// never be deployed twice through the same instance.
pub struct DeployOrchestrator {
    context: DeployExecutionContext,
    archiver: Arc<dyn ArchiveBuilder>,
    publisher: Arc<dyn FunctionPublisher>,
    alias_mover: Arc<dyn AliasMover>,
    deploy_id: Uuid,
    stage: DeployStage,
}

impl DeployOrchestrator {
    pub fn new(
        context: DeployExecutionContext,
        archiver: Arc<dyn ArchiveBuilder>,
        publisher: Arc<dyn FunctionPublisher>,
        alias_mover: Arc<dyn AliasMover>,
    ) -> Self {
        Self {
            context,
            archiver,
            publisher,
            alias_mover,
            deploy_id: Uuid::new_v4(),
            stage: DeployStage::Idle,
        }
    }

    /// Correlation id carried on every log line of this deploy.
    pub fn deploy_id(&self) -> Uuid {
        self.deploy_id
    }

    pub fn stage(&self) -> DeployStage {
        self.stage
    }

    pub fn context(&self) -> &DeployExecutionContext {
        &self.context
    }

    /// Run the deploy to completion.
    ///
    /// On success the alias points at the new version and the result carries
    /// the version the alias service reported. On failure nothing after the
    /// failing stage was attempted.
    pub async fn deploy(mut self) -> Result<DeployResult> {
        let function = self.context.function_id();
        let span = obs::deploy_span(&self.deploy_id.to_string(), function.as_str());

        async move {
            obs::emit_deploy_started(
                function.as_str(),
                &self.context.env_name,
                &self.context.alias_name,
                self.context.commit_hash.as_str(),
            );

            match self.run_stages(&function).await {
                Ok(result) => {
                    self.advance(DeployStage::Completed);
                    Ok(result)
                }
                Err(err) => {
                    let failed_at = self.stage;
                    self.advance(DeployStage::Failed);
                    obs::emit_deploy_failed(failed_at, &err);
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_stages(&mut self, function: &FunctionId) -> Result<DeployResult> {
        self.advance(DeployStage::Archiving);
        let archive = self
            .archiver
            .build(
                &self.context.project_root,
                &self.context.manifest,
                &self.context.node_env_value,
            )
            .await?;
        obs::emit_archive_built(archive.len(), &archive_digest(&archive));

        self.advance(DeployStage::Publishing);
        let version = self
            .publisher
            .publish(function, archive)
            .await
            .map_err(|source| DeployError::PublishFailed {
                function: function.clone(),
                source,
            })?;
        obs::emit_version_published(function.as_str(), version.as_str());

        self.advance(DeployStage::AliasMoving);
        let alias = &self.context.alias_name;
        let binding = match self.alias_mover.move_alias(function, alias, &version).await {
            Ok(binding) => binding,
            Err(source) => {
                obs::emit_inconsistent_state(function.as_str(), alias, version.as_str());
                return Err(DeployError::AliasUpdateFailed {
                    function: function.clone(),
                    alias: alias.clone(),
                    version: version.as_str().to_string(),
                    source,
                });
            }
        };
        obs::emit_alias_moved(function.as_str(), &binding.alias, &binding.version);

        Ok(DeployResult {
            function_name: function.to_string(),
            alias_name: alias.clone(),
            function_version: binding.version,
        })
    }

    fn advance(&mut self, next: DeployStage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal stage transition {} -> {}",
            self.stage,
            next
        );
        obs::emit_stage_entered(self.stage, next);
        self.stage = next;
    }
}

impl std::fmt::Debug for DeployOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployOrchestrator")
            .field("deploy_id", &self.deploy_id)
            .field("stage", &self.stage)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ZipArchiveBuilder;
    use crate::domain::{CommitHash, DeployManifest};
    use lambdeploy_lambda::fakes::MemoryFunctionService;

    fn context(root: &std::path::Path) -> DeployExecutionContext {
        DeployExecutionContext {
            function_name: "orders".to_string(),
            env_name: "prod".to_string(),
            node_env_value: "production".to_string(),
            alias_name: "LIVE".to_string(),
            commit_hash: CommitHash::try_from("a".repeat(40)).unwrap(),
            project_root: root.to_path_buf(),
            manifest: DeployManifest::from_iter(["index.js"]),
        }
    }

    #[test]
    fn test_new_orchestrator_is_idle() {
        let service = Arc::new(MemoryFunctionService::new());
        let orchestrator = DeployOrchestrator::new(
            context(std::path::Path::new("/srv/app")),
            Arc::new(ZipArchiveBuilder::new()),
            service.clone(),
            service,
        );
        assert_eq!(orchestrator.stage(), DeployStage::Idle);
        assert_eq!(orchestrator.context().alias_name, "LIVE");
    }

    #[tokio::test]
    async fn test_deploy_publishes_then_moves_alias() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.js"), "exports.handler = 1;").unwrap();
        let service = Arc::new(MemoryFunctionService::new().with_alias("orders_prod", "LIVE", "$LATEST"));

        let result = DeployOrchestrator::new(
            context(dir.path()),
            Arc::new(ZipArchiveBuilder::new()),
            service.clone(),
            service.clone(),
        )
        .deploy()
        .await
        .unwrap();

        assert_eq!(result.function_name, "orders_prod");
        assert_eq!(result.alias_name, "LIVE");
        assert_eq!(result.function_version, "1");
        assert_eq!(service.alias_target("orders_prod", "LIVE").as_deref(), Some("1"));
    }

    #[test]
    fn test_debug_omits_services() {
        let service = Arc::new(MemoryFunctionService::new());
        let orchestrator = DeployOrchestrator::new(
            context(std::path::Path::new("/srv/app")),
            Arc::new(ZipArchiveBuilder::new()),
            service.clone(),
            service,
        );
        let rendered = format!("{:?}", orchestrator);
        assert!(rendered.contains("DeployOrchestrator"));
        assert!(rendered.contains("Idle"));
    }
}
