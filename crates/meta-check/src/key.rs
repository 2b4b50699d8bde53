//! Key field validation for keyed services.

use meta_core::{KeyField, MessageType, ServiceDefinition};
use tracing::debug;

use crate::catalog::MessageCatalog;
use crate::error::{CheckError, CheckResult, KeyProblem};

/// The single string key field of a message.
pub fn key_field(message: &MessageType) -> Result<KeyField, KeyProblem> {
    let keys: Vec<_> = message.key_fields().collect();
    match keys.as_slice() {
        [] => Err(KeyProblem::Missing),
        [field] if field.is_string_primitive() => Ok(KeyField::from(*field)),
        [field] => Err(KeyProblem::NotString {
            field: field.name.clone(),
            ty: field.type_label(),
        }),
        _ => Err(KeyProblem::Multiple {
            fields: keys.iter().map(|f| f.name.clone()).collect(),
        }),
    }
}

/// Check that every method input of a keyed service carries exactly one
/// string key field. Services of any other kind pass unconditionally.
pub fn validate_service_keys(service: &ServiceDefinition, catalog: &MessageCatalog) -> CheckResult<()> {
    if !service.kind.is_keyed() {
        return Ok(());
    }
    for method in &service.methods {
        let input = catalog.input_of(&service.name, method)?;
        if let Err(problem) = key_field(input) {
            return Err(CheckError::BadKeyDefinition {
                service: service.name.clone(),
                method: method.name.clone(),
                message: input.name.clone(),
                problem,
            });
        }
    }
    debug!(service = %service.name, methods = service.methods.len(), "key definitions valid");
    Ok(())
}
