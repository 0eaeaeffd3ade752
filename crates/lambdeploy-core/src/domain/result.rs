//! Deploy outcome types.

use serde::{Deserialize, Serialize};

/// Lifecycle of one deploy.
///
/// `Idle → Archiving → Publishing → AliasMoving → Completed`, or `Failed`
/// from any of the three working stages. Both terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStage {
    Idle,
    Archiving,
    Publishing,
    AliasMoving,
    Completed,
    Failed,
}

impl DeployStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployStage::Idle => "idle",
            DeployStage::Archiving => "archiving",
            DeployStage::Publishing => "publishing",
            DeployStage::AliasMoving => "alias_moving",
            DeployStage::Completed => "completed",
            DeployStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeployStage::Completed | DeployStage::Failed)
    }

    /// Whether `self → next` is an allowed transition.
    pub fn can_advance_to(&self, next: DeployStage) -> bool {
        use DeployStage::*;
        matches!(
            (self, next),
            (Idle, Archiving)
                | (Archiving, Publishing)
                | (Publishing, AliasMoving)
                | (AliasMoving, Completed)
                | (Archiving, Failed)
                | (Publishing, Failed)
                | (AliasMoving, Failed)
        )
    }
}

impl std::fmt::Display for DeployStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful deploy.
///
/// `function_version` is the version echoed by the alias service, not the
/// publish response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeployResult {
    pub function_name: String,
    pub alias_name: String,
    pub function_version: String,
}
