//! Structured observability hooks for the deploy lifecycle.
//!
//! This module provides:
//! - A deploy-scoped tracing span via [`deploy_span`]
//! - Emission functions for key lifecycle events: start, stage changes,
//!   archive built, version published, alias moved, failure
//!
//! Field names are stable so JSON log output can be queried.

use tracing::{error, info, warn, Span};

use crate::domain::DeployStage;

/// Span tagged with the deploy id and target function.
///
/// Attach it to the deploy future with `tracing::Instrument`.
pub fn deploy_span(deploy_id: &str, function: &str) -> Span {
    tracing::info_span!("lambdeploy.deploy", deploy_id = %deploy_id, function = %function)
}

/// Emit event: deploy started.
pub fn emit_deploy_started(function: &str, env_name: &str, alias: &str, commit_hash: &str) {
    info!(
        event = "deploy.started",
        function = %function,
        env_name = %env_name,
        alias = %alias,
        commit_hash = %commit_hash,
    );
}

/// Emit event: the state machine entered a new stage.
pub fn emit_stage_entered(from: DeployStage, to: DeployStage) {
    info!(event = "deploy.stage", from = %from, to = %to);
}

/// Emit event: archive buffer finished.
pub fn emit_archive_built(bytes: usize, digest: &str) {
    info!(event = "archive.built", bytes = bytes, sha256 = %digest);
}

/// Emit event: a new version was published.
pub fn emit_version_published(function: &str, version: &str) {
    info!(
        event = "version.published",
        function = %function,
        function_version = %version,
        "Successfully published new version of lambda function"
    );
}

/// Emit event: alias now points at a version.
pub fn emit_alias_moved(function: &str, alias: &str, version: &str) {
    info!(
        event = "alias.moved",
        function = %function,
        alias = %alias,
        function_version = %version,
        "Successfully updated alias"
    );
}

/// Emit event: deploy failed at `stage` (warning level).
pub fn emit_deploy_failed(stage: DeployStage, error: &dyn std::fmt::Display) {
    warn!(event = "deploy.failed", stage = %stage, error = %error);
}

/// Emit event: a version was published but the alias still points elsewhere.
///
/// Logged at error level with everything an operator needs to finish the
/// alias move by hand.
pub fn emit_inconsistent_state(function: &str, alias: &str, version: &str) {
    error!(
        event = "deploy.inconsistent",
        function = %function,
        alias = %alias,
        function_version = %version,
        "Published version is not live; move the alias manually"
    );
}
