//! Resolved execution context for a single deploy.

use std::path::PathBuf;

use lambdeploy_lambda::FunctionId;
use serde::{Deserialize, Serialize};

use crate::domain::request::CommitHash;

/// Ordered project-relative paths to include in the deploy archive.
///
/// Each entry names a file or a directory to include recursively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeployManifest(Vec<String>);

impl DeployManifest {
    pub fn new(entries: Vec<String>) -> Self {
        Self(entries)
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for DeployManifest {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The fully-resolved parameters for one deploy.
///
/// Built by the config resolver and then moved into the orchestrator, which
/// owns it until the deploy finishes. Nothing mutates it along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployExecutionContext {
    /// Base function name from config (without environment suffix)
    pub function_name: String,
    /// Environment name; also the function identifier suffix
    pub env_name: String,
    /// Value written to `NODE_ENV` in the synthesized `.env` entry
    pub node_env_value: String,
    /// Alias to repoint after publishing (e.g. "LIVE")
    pub alias_name: String,
    /// Validated request metadata
    pub commit_hash: CommitHash,
    /// Absolute project root that manifest entries are relative to
    pub project_root: PathBuf,
    pub manifest: DeployManifest,
}

impl DeployExecutionContext {
    /// The addressing key on the function service.
    pub fn function_id(&self) -> FunctionId {
        FunctionId::qualified(&self.function_name, &self.env_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_id_composition() {
        let ctx = DeployExecutionContext {
            function_name: "orders".to_string(),
            env_name: "staging".to_string(),
            node_env_value: "staging".to_string(),
            alias_name: "LIVE".to_string(),
            commit_hash: CommitHash::try_from("a".repeat(40)).expect("hash"),
            project_root: PathBuf::from("/srv/orders"),
            manifest: ["index.js", "lib/"].into_iter().collect(),
        };
        assert_eq!(ctx.function_id().as_str(), "orders_staging");
        assert_eq!(ctx.manifest.entries(), ["index.js", "lib/"]);
    }

    #[test]
    fn test_manifest_length() {
        let manifest: DeployManifest = ["index.js", "lib/"].into_iter().collect();
        assert_eq!(manifest.len(), 2);
        assert!(!manifest.is_empty());
        assert!(DeployManifest::default().is_empty());
    }
}
