//! Shared types used across metagrid crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a registered deployment.
pub type DeploymentId = String;

/// Monotonic revision number of a service, starting at 1.
pub type RevisionNumber = u32;

// ── Services ──────────────────────────────────────────────────────

/// How invocations of a service are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Invocations are partitioned by a string key taken from the request.
    Keyed,
    /// Invocations carry no key and may run anywhere.
    Unkeyed,
    /// A single instance serves every invocation.
    Singleton,
}

impl ServiceKind {
    pub fn is_keyed(&self) -> bool {
        matches!(self, ServiceKind::Keyed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceKind::Keyed => "keyed",
            ServiceKind::Unkeyed => "unkeyed",
            ServiceKind::Singleton => "singleton",
        }
    }
}

impl FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyed" => Ok(ServiceKind::Keyed),
            "unkeyed" => Ok(ServiceKind::Unkeyed),
            "singleton" => Ok(ServiceKind::Singleton),
            other => Err(format!("unknown service kind: {other} (expected keyed, unkeyed or singleton)")),
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A service as declared in a deployment descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub kind: ServiceKind,
    #[serde(default)]
    pub methods: Vec<Method>,
}

impl ServiceDefinition {
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A method of a service. Input and output reference messages by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub input: String,
    pub output: String,
}

// ── Messages ──────────────────────────────────────────────────────

/// A named message with an ordered list of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageType {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<MessageField>,
}

impl MessageType {
    pub fn field_by_number(&self, number: u32) -> Option<&MessageField> {
        self.fields.iter().find(|f| f.number == number)
    }

    /// Fields carrying the `key` annotation, in declaration order.
    pub fn key_fields(&self) -> impl Iterator<Item = &MessageField> {
        self.fields.iter().filter(|f| f.key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageField {
    pub number: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default, skip_serializing_if = "is_false")]
    pub repeated: bool,
    /// Marks the field carrying the routing key of a keyed service.
    #[serde(default, skip_serializing_if = "is_false")]
    pub key: bool,
}

impl MessageField {
    /// True for a singular `string` field, the only legal key type.
    pub fn is_string_primitive(&self) -> bool {
        self.ty == FieldType::String && !self.repeated
    }

    /// Type as written in a descriptor, including the `repeated` label.
    pub fn type_label(&self) -> String {
        if self.repeated {
            format!("repeated {}", self.ty)
        } else {
            self.ty.to_string()
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Declared type of a message field.
///
/// Serialized as a string: `string`, `int64`, `message:Person`, `enum:Color`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    String,
    Bytes,
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    Message(String),
    Enum(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum FieldTypeError {
    #[error("unknown field type: {0}")]
    Unknown(String),
    #[error("missing type name in {0}")]
    MissingName(String),
}

impl FromStr for FieldType {
    type Err = FieldTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((prefix, name)) = s.split_once(':') {
            let name = name.trim();
            if name.is_empty() {
                return Err(FieldTypeError::MissingName(s.to_string()));
            }
            return match prefix.trim() {
                "message" => Ok(FieldType::Message(name.to_string())),
                "enum" => Ok(FieldType::Enum(name.to_string())),
                _ => Err(FieldTypeError::Unknown(s.to_string())),
            };
        }
        Ok(match s.trim() {
            "string" => FieldType::String,
            "bytes" => FieldType::Bytes,
            "bool" => FieldType::Bool,
            "int32" => FieldType::Int32,
            "int64" => FieldType::Int64,
            "uint32" => FieldType::Uint32,
            "uint64" => FieldType::Uint64,
            "float" => FieldType::Float,
            "double" => FieldType::Double,
            _ => return Err(FieldTypeError::Unknown(s.to_string())),
        })
    }
}

impl TryFrom<String> for FieldType {
    type Error = FieldTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("string"),
            FieldType::Bytes => f.write_str("bytes"),
            FieldType::Bool => f.write_str("bool"),
            FieldType::Int32 => f.write_str("int32"),
            FieldType::Int64 => f.write_str("int64"),
            FieldType::Uint32 => f.write_str("uint32"),
            FieldType::Uint64 => f.write_str("uint64"),
            FieldType::Float => f.write_str("float"),
            FieldType::Double => f.write_str("double"),
            FieldType::Message(name) => write!(f, "message:{name}"),
            FieldType::Enum(name) => write!(f, "enum:{name}"),
        }
    }
}

// ── Revisions ─────────────────────────────────────────────────────

/// The resolved routing key of a method input message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyField {
    pub number: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
}

impl From<&MessageField> for KeyField {
    fn from(field: &MessageField) -> Self {
        KeyField {
            number: field.number,
            name: field.name.clone(),
            ty: field.ty.clone(),
        }
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} (#{})", self.name, self.ty, self.number)
    }
}

/// A method with its input and output messages materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodContract {
    pub name: String,
    pub input: MessageType,
    pub output: MessageType,
    /// Present only for methods of keyed services.
    pub key: Option<KeyField>,
}

/// An immutable, accepted version of a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRevision {
    pub service: String,
    pub revision: RevisionNumber,
    pub deployment_id: DeploymentId,
    pub kind: ServiceKind,
    pub methods: Vec<MethodContract>,
    /// Unix timestamp (seconds) when this revision was registered.
    pub created_at: u64,
}

impl ServiceRevision {
    pub fn method(&self, name: &str) -> Option<&MethodContract> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Build the composite key for the revisions table.
    ///
    /// Revision numbers are zero-padded so keys sort in revision order.
    pub fn table_key(&self) -> String {
        revision_key(&self.service, self.revision)
    }
}

/// Composite key `{service}:{revision:010}` of a stored revision.
pub fn revision_key(service: &str, revision: RevisionNumber) -> String {
    format!("{service}:{revision:010}")
}

/// Persisted record of an accepted deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: DeploymentId,
    pub endpoint: String,
    pub services: Vec<ServiceRef>,
    /// Unix timestamp (seconds) when this deployment was registered.
    pub created_at: u64,
}

/// Reference to one revision registered by a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
    pub name: String,
    pub revision: RevisionNumber,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_parse_primitives() {
        assert_eq!("string".parse::<FieldType>().unwrap(), FieldType::String);
        assert_eq!("uint64".parse::<FieldType>().unwrap(), FieldType::Uint64);
    }

    #[test]
    fn field_type_parse_references() {
        assert_eq!(
            "message:Person".parse::<FieldType>().unwrap(),
            FieldType::Message("Person".to_string())
        );
        assert_eq!(
            "enum:Color".parse::<FieldType>().unwrap(),
            FieldType::Enum("Color".to_string())
        );
        assert_eq!(FieldType::Message("Person".to_string()).to_string(), "message:Person");
    }

    #[test]
    fn field_type_parse_errors() {
        assert!(matches!(
            "varchar".parse::<FieldType>(),
            Err(FieldTypeError::Unknown(_))
        ));
        assert!(matches!(
            "message:".parse::<FieldType>(),
            Err(FieldTypeError::MissingName(_))
        ));
        assert!(matches!(
            "struct:Foo".parse::<FieldType>(),
            Err(FieldTypeError::Unknown(_))
        ));
    }

    #[test]
    fn repeated_string_is_not_string_primitive() {
        let mut field = MessageField {
            number: 1,
            name: "ids".to_string(),
            ty: FieldType::String,
            repeated: true,
            key: true,
        };
        assert!(!field.is_string_primitive());
        assert_eq!(field.type_label(), "repeated string");

        field.repeated = false;
        assert!(field.is_string_primitive());
    }

    #[test]
    fn revision_keys_sort_by_number() {
        assert!(revision_key("Greeter", 2) < revision_key("Greeter", 10));
        assert_eq!(revision_key("Greeter", 7), "Greeter:0000000007");
    }

    #[test]
    fn service_kind_serde_is_snake_case() {
        let json = serde_json::to_string(&ServiceKind::Keyed).unwrap();
        assert_eq!(json, "\"keyed\"");
        let kind: ServiceKind = serde_json::from_str("\"singleton\"").unwrap();
        assert_eq!(kind, ServiceKind::Singleton);
    }

    #[test]
    fn service_kind_from_str() {
        assert_eq!("Keyed".parse::<ServiceKind>().unwrap(), ServiceKind::Keyed);
        assert!("virtual".parse::<ServiceKind>().is_err());
    }
}
