//! Domain-level error taxonomy for lambdeploy.

use lambdeploy_lambda::{FunctionId, LambdaError};

use crate::archive::ArchiveError;
use crate::domain::result::DeployStage;

/// Deploy errors, one variant family per stage of the protocol.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("manifest entry does not exist: {entry}")]
    MissingManifestEntry { entry: String },

    #[error("archive build failed: {0}")]
    Archive(#[source] ArchiveError),

    #[error("publish failed for {function}: {source}")]
    PublishFailed {
        function: FunctionId,
        #[source]
        source: LambdaError,
    },

    /// A new version exists but the alias still points at the old one.
    #[error(
        "version {version} of {function} was published but alias {alias} was not moved to it: {source}"
    )]
    AliasUpdateFailed {
        function: FunctionId,
        alias: String,
        version: String,
        #[source]
        source: LambdaError,
    },
}

impl DeployError {
    /// The deploy stage that failed, or `None` if the deploy never started.
    pub fn stage(&self) -> Option<DeployStage> {
        match self {
            DeployError::InvalidRequest(_) | DeployError::Configuration(_) => None,
            DeployError::MissingManifestEntry { .. } | DeployError::Archive(_) => {
                Some(DeployStage::Archiving)
            }
            DeployError::PublishFailed { .. } => Some(DeployStage::Publishing),
            DeployError::AliasUpdateFailed { .. } => Some(DeployStage::AliasMoving),
        }
    }

    /// True when a published version is left unreferenced by the alias.
    pub fn leaves_unreferenced_version(&self) -> bool {
        matches!(self, DeployError::AliasUpdateFailed { .. })
    }
}

impl From<ArchiveError> for DeployError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::MissingManifestEntry { entry } => {
                DeployError::MissingManifestEntry { entry }
            }
            other => DeployError::Archive(other),
        }
    }
}

/// Result type for lambdeploy domain operations.
pub type Result<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entry_is_lifted_out_of_archive_error() {
        let err: DeployError = ArchiveError::MissingManifestEntry {
            entry: "missing.js".to_string(),
        }
        .into();
        assert!(matches!(err, DeployError::MissingManifestEntry { ref entry } if entry == "missing.js"));
        assert_eq!(err.stage(), Some(DeployStage::Archiving));
    }

    #[test]
    fn test_alias_update_failed_carries_repair_context() {
        let err = DeployError::AliasUpdateFailed {
            function: FunctionId::qualified("orders", "prod"),
            alias: "LIVE".to_string(),
            version: "7".to_string(),
            source: LambdaError::Throttled("rate exceeded".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("orders_prod"));
        assert!(msg.contains("LIVE"));
        assert!(msg.contains('7'));
        assert!(err.leaves_unreferenced_version());
        assert_eq!(err.stage(), Some(DeployStage::AliasMoving));
    }

    #[test]
    fn test_pre_deploy_errors_have_no_stage() {
        assert_eq!(DeployError::InvalidRequest("x".to_string()).stage(), None);
        assert_eq!(DeployError::Configuration("x".to_string()).stage(), None);
    }

    #[test]
    fn test_publish_failed_leaves_no_unreferenced_version() {
        let err = DeployError::PublishFailed {
            function: FunctionId::qualified("orders", "prod"),
            source: LambdaError::CodeStorageExceeded("too big".to_string()),
        };
        assert!(!err.leaves_unreferenced_version());
        assert_eq!(err.stage(), Some(DeployStage::Publishing));
    }
}
