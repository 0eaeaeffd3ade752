//! Capability trait definitions for the function service
//!
//! These traits define the two network-facing steps of a deploy:
//! - `FunctionPublisher`: upload an archive as a new immutable version
//! - `AliasMover`: repoint a named alias at a version
//!
//! Both traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module; the AWS backend lives in `aws`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LambdaError;

/// Result type for function service operations
pub type LambdaResult<T> = std::result::Result<T, LambdaError>;

// ---------------------------------------------------------------------------
// FunctionId
// ---------------------------------------------------------------------------

/// Fully-qualified function identifier, `<base>_<env>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionId(String);

impl FunctionId {
    /// Join a base function name and environment name with an underscore.
    ///
    /// No other normalization is applied.
    pub fn qualified(base_name: &str, env_name: &str) -> Self {
        FunctionId(format!("{}_{}", base_name, env_name))
    }

    /// Wrap an already-qualified name.
    pub fn new(name: impl Into<String>) -> Self {
        FunctionId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// FunctionPublisher
// ---------------------------------------------------------------------------

/// A published, immutable function version.
///
/// The token is opaque and assigned by the service; it is never reused for
/// the same function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedVersion {
    version: String,
    /// When the publish call returned
    pub published_at: DateTime<Utc>,
    /// Code digest as reported by the service, if any
    pub code_sha256: Option<String>,
}

impl PublishedVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            published_at: Utc::now(),
            code_sha256: None,
        }
    }

    pub fn with_code_sha256(mut self, code_sha256: impl Into<String>) -> Self {
        self.code_sha256 = Some(code_sha256.into());
        self
    }

    /// The raw version token.
    pub fn as_str(&self) -> &str {
        &self.version
    }
}

impl std::fmt::Display for PublishedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.version)
    }
}

/// Uploads a code archive as a new published version.
///
/// Guarantees:
/// - Every successful call yields a new, distinct version token.
/// - Previously published versions stay invocable; nothing is deleted.
/// - No retries. A failed call is reported once, to the caller.
#[async_trait]
pub trait FunctionPublisher: Send + Sync {
    /// Publish `archive` as a new version of `function`.
    ///
    /// The archive buffer is moved in; callers keep no copy.
    async fn publish(
        &self,
        function: &FunctionId,
        archive: Vec<u8>,
    ) -> LambdaResult<PublishedVersion>;
}

// ---------------------------------------------------------------------------
// AliasMover
// ---------------------------------------------------------------------------

/// The state of an alias after a successful move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasBinding {
    /// Function the alias belongs to
    pub function: FunctionId,
    /// Alias name (e.g. "LIVE")
    pub alias: String,
    /// Version the service reports the alias now points at
    pub version: String,
    /// Alias ARN, when the backend reports one
    pub alias_arn: Option<String>,
    /// When the move was acknowledged
    pub bound_at: DateTime<Utc>,
}

/// Repoints a named alias at a published version.
///
/// Semantics:
/// - Atomic from the caller's perspective; last write wins.
/// - Idempotent: repeating a move with the same arguments is not an error.
/// - No history is kept by this layer.
#[async_trait]
pub trait AliasMover: Send + Sync {
    /// Point `alias` on `function` at `version`.
    async fn move_alias(
        &self,
        function: &FunctionId,
        alias: &str,
        version: &PublishedVersion,
    ) -> LambdaResult<AliasBinding>;
}
