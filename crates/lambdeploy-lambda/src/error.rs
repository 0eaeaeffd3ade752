//! Error types for lambdeploy-lambda

use thiserror::Error;

/// Errors reported by the function service (publish and alias operations).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LambdaError {
    /// The function does not exist on the service
    #[error("function not found: {function}")]
    FunctionNotFound { function: String },

    /// The alias does not exist for this function
    #[error("alias {alias} not found on function {function}")]
    AliasNotFound { function: String, alias: String },

    /// The requested version was never published for this function
    #[error("version {version} not found on function {function}")]
    VersionNotFound { function: String, version: String },

    /// The service reported a missing resource without saying which one
    #[error("resource not found on function {function}: {detail}")]
    ResourceNotFound { function: String, detail: String },

    /// Code storage limit or archive size limit exceeded
    #[error("code storage exceeded: {0}")]
    CodeStorageExceeded(String),

    /// Request rate limit hit
    #[error("request throttled: {0}")]
    Throttled(String),

    /// Any other service or transport failure
    #[error("function service error: {0}")]
    Service(String),

    /// A successful response lacked a field the caller depends on
    #[error("{operation} response is missing {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}

impl LambdaError {
    /// Whether re-issuing the same call could plausibly succeed.
    ///
    /// Advisory only. Nothing in this crate retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, LambdaError::Throttled(_) | LambdaError::Service(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_names_resource() {
        let err = LambdaError::AliasNotFound {
            function: "orders_prod".to_string(),
            alias: "LIVE".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("orders_prod"));
        assert!(msg.contains("LIVE"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(LambdaError::Throttled("rate".to_string()).is_transient());
        assert!(LambdaError::Service("timeout".to_string()).is_transient());
        assert!(!LambdaError::FunctionNotFound {
            function: "orders_prod".to_string()
        }
        .is_transient());
        assert!(!LambdaError::CodeStorageExceeded("75GB".to_string()).is_transient());
    }
}
