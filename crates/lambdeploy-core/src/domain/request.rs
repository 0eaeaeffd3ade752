//! Deploy request validation.
//!
//! Every check here runs before any filesystem or network access.

use serde::{Deserialize, Serialize};

use crate::domain::error::{DeployError, Result};

/// Required length of a commit hash (a full-length git SHA-1).
pub const COMMIT_HASH_LEN: usize = 40;

/// A full-length commit hash.
///
/// Only the length is checked. The hash is carried through the deploy
/// context as request metadata and is not attached to the published version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitHash(String);

impl CommitHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommitHash {
    type Error = DeployError;

    fn try_from(s: String) -> Result<Self> {
        let len = s.chars().count();
        if len != COMMIT_HASH_LEN {
            return Err(DeployError::InvalidRequest(format!(
                "commit hash must be a full length git hash of {} characters, got {}",
                COMMIT_HASH_LEN, len
            )));
        }
        Ok(CommitHash(s))
    }
}

impl From<CommitHash> for String {
    fn from(hash: CommitHash) -> Self {
        hash.0
    }
}

impl std::fmt::Display for CommitHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated request to deploy one function to one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
    pub function_name: String,
    pub env_name: String,
    pub commit_hash: CommitHash,
}

impl DeployRequest {
    pub fn new(
        function_name: impl Into<String>,
        env_name: impl Into<String>,
        commit_hash: impl Into<String>,
    ) -> Result<Self> {
        Self::from_parts(
            Some(function_name.into()),
            Some(env_name.into()),
            Some(commit_hash.into()),
        )
    }

    /// Build a request from optional parts, as a CLI hands them over.
    ///
    /// Checks (in order): function name present, environment name present,
    /// commit hash present and exactly 40 characters.
    pub fn from_parts(
        function_name: Option<String>,
        env_name: Option<String>,
        commit_hash: Option<String>,
    ) -> Result<Self> {
        let function_name = function_name.filter(|s| !s.is_empty()).ok_or_else(|| {
            DeployError::InvalidRequest("option -f / --function required".to_string())
        })?;
        let env_name = env_name.filter(|s| !s.is_empty()).ok_or_else(|| {
            DeployError::InvalidRequest("option -e / --environment required".to_string())
        })?;
        let commit_hash = commit_hash.ok_or_else(|| {
            DeployError::InvalidRequest(format!(
                "option -c / --commit-hash must be a full length git hash of {} characters",
                COMMIT_HASH_LEN
            ))
        })?;

        Ok(Self {
            function_name,
            env_name,
            commit_hash: CommitHash::try_from(commit_hash)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_HASH: &str = "ppXhTRJpPHDOzHraN7A7GXaCoVi6jr1u9OEzqgW3";

    #[test]
    fn test_valid_request() {
        let req = DeployRequest::new("orders", "prod", FULL_HASH).expect("valid");
        assert_eq!(req.function_name, "orders");
        assert_eq!(req.env_name, "prod");
        assert_eq!(req.commit_hash.as_str(), FULL_HASH);
    }

    #[test]
    fn test_short_commit_hash_rejected() {
        let short = &FULL_HASH[..39];
        let err = DeployRequest::new("orders", "prod", short).unwrap_err();
        assert!(matches!(err, DeployError::InvalidRequest(_)));
        assert!(err.to_string().contains("40"));
    }

    #[test]
    fn test_long_commit_hash_rejected() {
        let long = format!("{}a", FULL_HASH);
        assert!(matches!(
            DeployRequest::new("orders", "prod", long),
            Err(DeployError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_missing_parts_rejected() {
        let hash = Some(FULL_HASH.to_string());
        let missing_fn = DeployRequest::from_parts(None, Some("prod".into()), hash.clone());
        assert!(matches!(missing_fn, Err(DeployError::InvalidRequest(ref m)) if m.contains("--function")));

        let empty_env = DeployRequest::from_parts(Some("orders".into()), Some(String::new()), hash);
        assert!(matches!(empty_env, Err(DeployError::InvalidRequest(ref m)) if m.contains("--environment")));

        let missing_hash = DeployRequest::from_parts(Some("orders".into()), Some("prod".into()), None);
        assert!(matches!(missing_hash, Err(DeployError::InvalidRequest(ref m)) if m.contains("--commit-hash")));
    }

    #[test]
    fn test_commit_hash_serde_validates() {
        let ok: CommitHash = serde_json::from_str(&format!("\"{}\"", FULL_HASH)).expect("valid");
        assert_eq!(ok.as_str(), FULL_HASH);
        assert!(serde_json::from_str::<CommitHash>("\"abc\"").is_err());
    }
}
