//! Stable error codes reported by registration checks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Malformed deployment descriptor.
    #[serde(rename = "META0001")]
    Meta0001,
    /// Keyed service without a single string key field.
    #[serde(rename = "META0002")]
    Meta0002,
    /// New revision conflicts with an already registered revision.
    #[serde(rename = "META0006")]
    Meta0006,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 3] = [ErrorCode::Meta0001, ErrorCode::Meta0002, ErrorCode::Meta0006];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Meta0001 => "META0001",
            ErrorCode::Meta0002 => "META0002",
            ErrorCode::Meta0006 => "META0006",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ErrorCode::Meta0001 => "bad descriptor",
            ErrorCode::Meta0002 => "bad key definition",
            ErrorCode::Meta0006 => "revision conflict",
        }
    }

    /// Long-form documentation, printed by `meta explain`.
    pub fn help(&self) -> &'static str {
        match self {
            ErrorCode::Meta0001 => META0001_HELP,
            ErrorCode::Meta0002 => META0002_HELP,
            ErrorCode::Meta0006 => META0006_HELP,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.as_str() == normalized)
            .ok_or_else(|| format!("unknown error code: {s}"))
    }
}

const META0001_HELP: &str = "\
The deployment descriptor is malformed and cannot be checked.

Every service, method and message must have a unique, valid name, every
method must reference declared input and output messages, and field
numbers and names must be unique within a message. Fix the descriptor and
register again.";

const META0002_HELP: &str = "\
Bad key definition encountered while registering or updating a service.

When a service is keyed, every method input message must annotate exactly
one field as the key, and that field must be of type string:

    [[messages]]
    name = \"GreetRequest\"

    [[messages.fields]]
    number = 1
    name = \"person_id\"
    type = \"string\"
    key = true

Unkeyed and singleton services do not route by key and are not checked.";

const META0006_HELP: &str = "\
Cannot register the new deployment because it contains a service revision
that conflicts with an already registered revision of the same service.

A new revision must keep the same service kind and the same key field
definition (field number, name and type) as every previous revision. Its
contract must also stay backward compatible: every method of a previous
revision must still be implemented, input fields shared with a previous
revision must keep their name and type, and previous output fields must not
be removed or changed.

To change the kind or key of a service, register it under a new name.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("meta0002".parse::<ErrorCode>().unwrap(), ErrorCode::Meta0002);
        assert_eq!(" META0006 ".parse::<ErrorCode>().unwrap(), ErrorCode::Meta0006);
        assert!("META9999".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn serializes_as_code_string() {
        let json = serde_json::to_string(&ErrorCode::Meta0006).unwrap();
        assert_eq!(json, "\"META0006\"");
    }

    #[test]
    fn every_code_has_help() {
        for code in ErrorCode::ALL {
            assert!(!code.help().is_empty(), "{code} has no help text");
        }
    }
}
