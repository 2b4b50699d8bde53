//! Error types for registration checks.

use std::fmt;

use meta_core::{ErrorCode, KeyField, RevisionNumber, ServiceKind};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for registration checks.
pub type CheckResult<T> = Result<T, CheckError>;

/// A rejected registration. None of these are retryable: the descriptor
/// has to be fixed and submitted again.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum CheckError {
    #[error("bad descriptor: {reason}")]
    BadDescriptor { reason: String },

    #[error(
        "bad key definition for method '{service}/{method}': input message '{message}' {problem}"
    )]
    BadKeyDefinition {
        service: String,
        method: String,
        message: String,
        problem: KeyProblem,
    },

    #[error(
        "deployment '{deployment}' conflicts with revision {existing} of service '{service}' \
         (proposed revision {revision}): {conflict}"
    )]
    RevisionConflict {
        deployment: String,
        service: String,
        revision: RevisionNumber,
        existing: RevisionNumber,
        conflict: Conflict,
    },
}

impl CheckError {
    pub fn bad_descriptor(reason: impl Into<String>) -> Self {
        CheckError::BadDescriptor {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CheckError::BadDescriptor { .. } => ErrorCode::Meta0001,
            CheckError::BadKeyDefinition { .. } => ErrorCode::Meta0002,
            CheckError::RevisionConflict { .. } => ErrorCode::Meta0006,
        }
    }

    /// The service the error is about, if it concerns a single service.
    pub fn service(&self) -> Option<&str> {
        match self {
            CheckError::BadDescriptor { .. } => None,
            CheckError::BadKeyDefinition { service, .. }
            | CheckError::RevisionConflict { service, .. } => Some(service),
        }
    }
}

/// Why an input message of a keyed service has no usable key.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyProblem {
    #[error("has no field annotated as key")]
    Missing,

    #[error("has more than one key field: {}", .fields.join(", "))]
    Multiple { fields: Vec<String> },

    #[error("has key field '{field}' of type '{ty}', expected 'string'")]
    NotString { field: String, ty: String },
}

/// The attribute of a candidate revision that conflicts with a prior one.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    #[error("service kind changed from {previous} to {proposed}")]
    KindChanged {
        previous: ServiceKind,
        proposed: ServiceKind,
    },

    #[error(
        "key of method '{method}' changed from {} to {}",
        describe_key(.previous),
        describe_key(.proposed)
    )]
    KeyChanged {
        method: String,
        previous: Option<KeyField>,
        proposed: Option<KeyField>,
    },

    #[error("method '{method}' is no longer implemented")]
    MissingMethod { method: String },

    #[error("{direction} message '{message}' of method '{method}' is not backward compatible: {problem}")]
    IncompatibleMessage {
        method: String,
        direction: Direction,
        message: String,
        problem: FieldProblem,
    },
}

fn describe_key(key: &Option<KeyField>) -> String {
    match key {
        Some(k) => format!("'{k}'"),
        None => "no key".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldProblem {
    #[error("field #{number} '{name}' was removed")]
    Removed { number: u32, name: String },

    #[error("field #{number} was renamed from '{previous}' to '{proposed}'")]
    Renamed {
        number: u32,
        previous: String,
        proposed: String,
    },

    #[error("field #{number} '{name}' changed type from '{previous}' to '{proposed}'")]
    TypeChanged {
        number: u32,
        name: String,
        previous: String,
        proposed: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use meta_core::FieldType;

    #[test]
    fn codes_match_variants() {
        assert_eq!(CheckError::bad_descriptor("x").code(), ErrorCode::Meta0001);

        let bad_key = CheckError::BadKeyDefinition {
            service: "Greeter".to_string(),
            method: "greet".to_string(),
            message: "GreetRequest".to_string(),
            problem: KeyProblem::Missing,
        };
        assert_eq!(bad_key.code(), ErrorCode::Meta0002);
        assert_eq!(bad_key.service(), Some("Greeter"));
    }

    #[test]
    fn key_change_message_names_both_keys() {
        let conflict = Conflict::KeyChanged {
            method: "greet".to_string(),
            previous: Some(KeyField {
                number: 1,
                name: "person_id".to_string(),
                ty: FieldType::String,
            }),
            proposed: None,
        };
        let text = conflict.to_string();
        assert!(text.contains("person_id: string (#1)"), "{text}");
        assert!(text.contains("no key"), "{text}");
    }

    #[test]
    fn multiple_keys_are_listed() {
        let problem = KeyProblem::Multiple {
            fields: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(problem.to_string(), "has more than one key field: a, b");
    }

    #[test]
    fn serializes_with_tag() {
        let err = CheckError::bad_descriptor("no services");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"], "bad_descriptor");
        assert_eq!(json["reason"], "no services");
    }
}
