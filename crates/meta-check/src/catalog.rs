//! Message catalog — structural validation of a deployment descriptor.
//!
//! Building a catalog checks every invariant the registration checks rely
//! on: unique names, resolvable method messages, unique field numbers.
//! Later stages only ever look messages up through the catalog.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use meta_core::{DeploymentDescriptor, FieldType, MessageType, Method, ServiceDefinition};
use regex::Regex;

use crate::error::{CheckError, CheckResult};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("identifier pattern"));

/// Messages of a descriptor indexed by name.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    messages: HashMap<String, MessageType>,
}

impl MessageCatalog {
    /// Validate the descriptor and index its messages.
    pub fn build(descriptor: &DeploymentDescriptor) -> CheckResult<Self> {
        if descriptor.deployment.endpoint.trim().is_empty() {
            return Err(CheckError::bad_descriptor("deployment endpoint is empty"));
        }
        if descriptor.services.is_empty() {
            return Err(CheckError::bad_descriptor("deployment declares no services"));
        }

        let mut messages = HashMap::with_capacity(descriptor.messages.len());
        for message in &descriptor.messages {
            check_identifier("message", &message.name)?;
            check_fields(message)?;
            if messages.insert(message.name.clone(), message.clone()).is_some() {
                return Err(CheckError::bad_descriptor(format!(
                    "message '{}' is declared more than once",
                    message.name
                )));
            }
        }

        for message in &descriptor.messages {
            check_references(message, &messages)?;
        }

        let catalog = MessageCatalog { messages };

        let mut services = HashSet::new();
        for service in &descriptor.services {
            check_identifier("service", &service.name)?;
            if !services.insert(service.name.as_str()) {
                return Err(CheckError::bad_descriptor(format!(
                    "service '{}' is declared more than once",
                    service.name
                )));
            }
            catalog.check_methods(service)?;
        }

        Ok(catalog)
    }

    /// Input message of a method. Only fails for methods of services that
    /// were not part of the descriptor the catalog was built from.
    pub fn input_of(&self, service: &str, method: &Method) -> CheckResult<&MessageType> {
        self.resolve(service, method, &method.input)
    }

    pub fn output_of(&self, service: &str, method: &Method) -> CheckResult<&MessageType> {
        self.resolve(service, method, &method.output)
    }

    fn resolve(&self, service: &str, method: &Method, message: &str) -> CheckResult<&MessageType> {
        self.messages.get(message).ok_or_else(|| {
            CheckError::bad_descriptor(format!(
                "method '{service}/{}' references undeclared message '{message}'",
                method.name
            ))
        })
    }

    fn check_methods(&self, service: &ServiceDefinition) -> CheckResult<()> {
        let mut seen = HashSet::new();
        for method in &service.methods {
            check_identifier("method", &method.name)?;
            if !seen.insert(method.name.as_str()) {
                return Err(CheckError::bad_descriptor(format!(
                    "method '{}/{}' is declared more than once",
                    service.name, method.name
                )));
            }
            self.input_of(&service.name, method)?;
            self.output_of(&service.name, method)?;
        }
        Ok(())
    }
}

fn check_identifier(what: &str, name: &str) -> CheckResult<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(CheckError::bad_descriptor(format!("invalid {what} name '{name}'")))
    }
}

/// `message:X` field types must name a message declared in the same descriptor.
fn check_references(message: &MessageType, messages: &HashMap<String, MessageType>) -> CheckResult<()> {
    for field in &message.fields {
        let FieldType::Message(target) = &field.ty else {
            continue;
        };
        if !messages.contains_key(target) {
            return Err(CheckError::bad_descriptor(format!(
                "field '{}.{}' references undeclared message '{target}'",
                message.name, field.name
            )));
        }
    }
    Ok(())
}

fn check_fields(message: &MessageType) -> CheckResult<()> {
    let mut numbers = HashSet::new();
    let mut names = HashSet::new();
    for field in &message.fields {
        check_identifier("field", &field.name)?;
        if field.number == 0 {
            return Err(CheckError::bad_descriptor(format!(
                "field '{}.{}' has number 0",
                message.name, field.name
            )));
        }
        if !numbers.insert(field.number) {
            return Err(CheckError::bad_descriptor(format!(
                "field number {} is used more than once in message '{}'",
                field.number, message.name
            )));
        }
        if !names.insert(field.name.as_str()) {
            return Err(CheckError::bad_descriptor(format!(
                "field '{}' is declared more than once in message '{}'",
                field.name, message.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn builds_for_valid_descriptor() {
        let descriptor = greeter_descriptor();
        let catalog = MessageCatalog::build(&descriptor).unwrap();
        let method = &descriptor.services[0].methods[0];
        assert_eq!(catalog.input_of("Greeter", method).unwrap().name, "GreetRequest");
        assert_eq!(catalog.output_of("Greeter", method).unwrap().name, "GreetResponse");
    }

    #[test]
    fn rejects_undeclared_message() {
        let mut descriptor = greeter_descriptor();
        descriptor.services[0].methods[0].output = "Nope".to_string();
        let err = MessageCatalog::build(&descriptor).unwrap_err();
        assert_eq!(err.code(), meta_core::ErrorCode::Meta0001);
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn rejects_undeclared_field_message_reference() {
        let mut descriptor = greeter_descriptor();
        let mut field = string_field(3, "profile", false);
        field.ty = FieldType::Message("Nope".to_string());
        descriptor.messages[0].fields.push(field);

        let err = MessageCatalog::build(&descriptor).unwrap_err();
        assert_eq!(err.code(), meta_core::ErrorCode::Meta0001);
        assert!(err.to_string().contains("GreetRequest.profile"), "{err}");
    }

    #[test]
    fn accepts_field_referencing_declared_message() {
        let mut descriptor = greeter_descriptor();
        let mut field = string_field(3, "previous", false);
        field.ty = FieldType::Message("GreetResponse".to_string());
        descriptor.messages[0].fields.push(field);

        assert!(MessageCatalog::build(&descriptor).is_ok());
    }

    #[test]
    fn rejects_duplicate_services() {
        let mut descriptor = greeter_descriptor();
        let svc = descriptor.services[0].clone();
        descriptor.services.push(svc);
        let err = MessageCatalog::build(&descriptor).unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn rejects_duplicate_field_numbers() {
        let mut descriptor = greeter_descriptor();
        descriptor.messages[0].fields.push(string_field(1, "other", false));
        let err = MessageCatalog::build(&descriptor).unwrap_err();
        assert!(err.to_string().contains("field number 1"));
    }

    #[test]
    fn rejects_field_number_zero() {
        let mut descriptor = greeter_descriptor();
        descriptor.messages[0].fields.push(string_field(0, "zero", false));
        assert!(MessageCatalog::build(&descriptor).is_err());
    }

    #[test]
    fn rejects_invalid_names() {
        let mut descriptor = greeter_descriptor();
        descriptor.services[0].name = "greeter:v2".to_string();
        let err = MessageCatalog::build(&descriptor).unwrap_err();
        assert!(err.to_string().contains("invalid service name"));
    }

    #[test]
    fn rejects_empty_deployment() {
        let mut descriptor = greeter_descriptor();
        descriptor.services.clear();
        assert!(MessageCatalog::build(&descriptor).is_err());
    }
}
