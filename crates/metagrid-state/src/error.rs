//! Error types for the revision store.

use meta_check::CheckError;
use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("deployment already registered: {0}")]
    DeploymentExists(String),

    /// The deployment failed a registration check. Nothing was written.
    #[error("[{code}] {0}", code = .0.code())]
    Rejected(#[from] CheckError),
}

impl StateError {
    /// The check that rejected the deployment, if any.
    pub fn rejection(&self) -> Option<&CheckError> {
        match self {
            StateError::Rejected(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meta_check::KeyProblem;

    #[test]
    fn rejection_display_leads_with_code() {
        let err: StateError = CheckError::BadKeyDefinition {
            service: "Greeter".to_string(),
            method: "greet".to_string(),
            message: "GreetRequest".to_string(),
            problem: KeyProblem::Missing,
        }
        .into();
        assert!(err.to_string().starts_with("[META0002] "), "{err}");
        assert!(err.rejection().is_some());
    }
}
