//! Domain models for lambdeploy.
//!
//! Canonical definitions for the values that flow through one deploy:
//! - `DeployRequest`: validated caller input
//! - `DeployExecutionContext`: resolved, immutable parameters for one deploy
//! - `DeployResult`: what a successful deploy reports
//! - `DeployError`: the stage-aware error taxonomy

pub mod context;
pub mod error;
pub mod request;
pub mod result;

// Re-export main types and errors
pub use context::{DeployExecutionContext, DeployManifest};
pub use error::{DeployError, Result};
pub use request::{CommitHash, DeployRequest, COMMIT_HASH_LEN};
pub use result::{DeployResult, DeployStage};
