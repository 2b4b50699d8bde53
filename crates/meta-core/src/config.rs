//! deployment.toml descriptor parser.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{FieldType, MessageField, MessageType, Method, ServiceDefinition, ServiceKind};

/// A deployment descriptor: the services an endpoint exposes and the
/// messages their methods exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentDescriptor {
    pub deployment: DeploymentInfo,
    #[serde(default)]
    pub services: Vec<ServiceDefinition>,
    #[serde(default)]
    pub messages: Vec<MessageType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentInfo {
    /// Explicit deployment id. Derived from the contents when absent.
    pub id: Option<String>,
    /// Address the deployment serves its services on.
    pub endpoint: String,
    pub description: Option<String>,
}

impl DeploymentDescriptor {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let descriptor: DeploymentDescriptor = toml::from_str(content)?;
        Ok(descriptor)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn service(&self, name: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.name == name)
    }

    /// The explicit id, or `dp_` followed by 20 hex chars of a SHA-256
    /// digest over the canonical JSON form of the endpoint, services and
    /// messages.
    pub fn deployment_id(&self) -> String {
        if let Some(id) = &self.deployment.id {
            return id.clone();
        }
        // Plain data with string keys only, so serialization cannot fail.
        let canonical = serde_json::to_vec(&(&self.deployment.endpoint, &self.services, &self.messages))
            .unwrap_or_default();
        let digest = hex::encode(Sha256::digest(&canonical));
        format!("dp_{}", &digest[..20])
    }

    /// Scaffold a descriptor with one service exposing a single `handle` method.
    pub fn scaffold(service: &str, kind: ServiceKind, endpoint: &str) -> Self {
        let request = format!("{service}Request");
        let response = format!("{service}Response");

        let mut request_fields = Vec::new();
        if kind.is_keyed() {
            request_fields.push(MessageField {
                number: 1,
                name: "key".to_string(),
                ty: FieldType::String,
                repeated: false,
                key: true,
            });
        }
        request_fields.push(MessageField {
            number: request_fields.len() as u32 + 1,
            name: "payload".to_string(),
            ty: FieldType::Bytes,
            repeated: false,
            key: false,
        });

        DeploymentDescriptor {
            deployment: DeploymentInfo {
                id: None,
                endpoint: endpoint.to_string(),
                description: None,
            },
            services: vec![ServiceDefinition {
                name: service.to_string(),
                kind,
                methods: vec![Method {
                    name: "handle".to_string(),
                    input: request.clone(),
                    output: response.clone(),
                }],
            }],
            messages: vec![
                MessageType {
                    name: request,
                    fields: request_fields,
                },
                MessageType {
                    name: response,
                    fields: vec![MessageField {
                        number: 1,
                        name: "result".to_string(),
                        ty: FieldType::Bytes,
                        repeated: false,
                        key: false,
                    }],
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETER: &str = r#"
[deployment]
endpoint = "http://localhost:9080"

[[services]]
name = "Greeter"
kind = "keyed"

[[services.methods]]
name = "greet"
input = "GreetRequest"
output = "GreetResponse"

[[messages]]
name = "GreetRequest"

[[messages.fields]]
number = 1
name = "person_id"
type = "string"
key = true

[[messages.fields]]
number = 2
name = "tags"
type = "string"
repeated = true

[[messages]]
name = "GreetResponse"

[[messages.fields]]
number = 1
name = "greeting"
type = "string"
"#;

    #[test]
    fn test_parse_greeter() {
        let descriptor = DeploymentDescriptor::from_toml_str(GREETER).unwrap();
        let svc = descriptor.service("Greeter").unwrap();
        assert_eq!(svc.kind, ServiceKind::Keyed);
        assert_eq!(svc.method("greet").unwrap().input, "GreetRequest");

        let request = &descriptor.messages[0];
        assert_eq!(request.key_fields().count(), 1);
        assert!(request.fields[1].repeated);
        assert!(!request.fields[1].key);
    }

    #[test]
    fn test_parse_rejects_unknown_field_type() {
        let bad = GREETER.replace("type = \"string\"\nkey = true", "type = \"text\"\nkey = true");
        assert!(DeploymentDescriptor::from_toml_str(&bad).is_err());
    }

    #[test]
    fn test_scaffold_roundtrips_through_toml() {
        let descriptor = DeploymentDescriptor::scaffold("Cart", ServiceKind::Keyed, "http://localhost:9080");
        let toml_str = descriptor.to_toml_string().unwrap();
        assert!(toml_str.contains("Cart"));
        assert!(toml_str.contains("keyed"));

        let parsed = DeploymentDescriptor::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, descriptor);
    }

    #[test]
    fn test_scaffold_unkeyed_has_no_key() {
        let descriptor = DeploymentDescriptor::scaffold("Mailer", ServiceKind::Unkeyed, "http://localhost:9080");
        assert!(descriptor.messages.iter().all(|m| m.key_fields().count() == 0));
    }

    #[test]
    fn test_deployment_id_is_stable_and_content_derived() {
        let a = DeploymentDescriptor::from_toml_str(GREETER).unwrap();
        let b = DeploymentDescriptor::from_toml_str(GREETER).unwrap();
        assert_eq!(a.deployment_id(), b.deployment_id());
        assert!(a.deployment_id().starts_with("dp_"));
        assert_eq!(a.deployment_id().len(), 23);

        let changed = GREETER.replace("9080", "9081");
        let c = DeploymentDescriptor::from_toml_str(&changed).unwrap();
        assert_ne!(a.deployment_id(), c.deployment_id());
    }

    #[test]
    fn test_deployment_id_separates_adjacent_names() {
        let a = DeploymentDescriptor::from_toml_str(GREETER).unwrap();
        let mut b = a.clone();
        b.services[0].methods[0].name = "greetGreet".to_string();
        b.services[0].methods[0].input = "Request".to_string();
        assert_ne!(a.deployment_id(), b.deployment_id());

        let mut c = a.clone();
        c.messages[0].fields[0].name = "person_idstring".to_string();
        c.messages[0].fields[0].ty = FieldType::Message("x".to_string());
        assert_ne!(a.deployment_id(), c.deployment_id());
    }

    #[test]
    fn test_explicit_deployment_id_wins() {
        let with_id = GREETER.replace(
            "[deployment]\n",
            "[deployment]\nid = \"dp_manual\"\n",
        );
        let descriptor = DeploymentDescriptor::from_toml_str(&with_id).unwrap();
        assert_eq!(descriptor.deployment_id(), "dp_manual");
    }
}
