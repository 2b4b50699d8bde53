//! meta-check — registration checks for service deployments.
//!
//! # Components
//!
//! - **`catalog`** — descriptor structure checks and message lookup (META0001)
//! - **`key`** — key field validation for keyed services (META0002)
//! - **`compat`** — candidate revision against prior revisions (META0006)
//! - **`report`** — human-readable rejection and plan output

pub mod catalog;
pub mod compat;
pub mod error;
pub mod key;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

use meta_core::{DeploymentDescriptor, MethodContract, RevisionNumber, ServiceDefinition, ServiceRevision};

pub use catalog::MessageCatalog;
pub use compat::check_revision;
pub use error::{CheckError, CheckResult, Conflict, Direction, FieldProblem, KeyProblem};
pub use key::{key_field, validate_service_keys};

/// A descriptor that passed every check not involving prior revisions.
#[derive(Debug)]
pub struct PreparedDeployment<'a> {
    descriptor: &'a DeploymentDescriptor,
    catalog: MessageCatalog,
    deployment_id: String,
}

/// Build the message catalog and validate the keys of every service.
pub fn prepare(descriptor: &DeploymentDescriptor) -> CheckResult<PreparedDeployment<'_>> {
    let catalog = MessageCatalog::build(descriptor)?;
    for service in &descriptor.services {
        validate_service_keys(service, &catalog)?;
    }
    Ok(PreparedDeployment {
        descriptor,
        catalog,
        deployment_id: descriptor.deployment_id(),
    })
}

impl PreparedDeployment<'_> {
    pub fn deployment_id(&self) -> &str {
        &self.deployment_id
    }

    pub fn endpoint(&self) -> &str {
        &self.descriptor.deployment.endpoint
    }

    pub fn services(&self) -> &[ServiceDefinition] {
        &self.descriptor.services
    }

    /// Materialize a service of this deployment as revision `number`.
    pub fn revision(
        &self,
        service: &ServiceDefinition,
        number: RevisionNumber,
        created_at: u64,
    ) -> CheckResult<ServiceRevision> {
        let mut methods = Vec::with_capacity(service.methods.len());
        for method in &service.methods {
            let input = self.catalog.input_of(&service.name, method)?;
            let output = self.catalog.output_of(&service.name, method)?;
            let key = if service.kind.is_keyed() {
                let key = key_field(input).map_err(|problem| CheckError::BadKeyDefinition {
                    service: service.name.clone(),
                    method: method.name.clone(),
                    message: input.name.clone(),
                    problem,
                })?;
                Some(key)
            } else {
                None
            };
            methods.push(MethodContract {
                name: method.name.clone(),
                input: input.clone(),
                output: output.clone(),
                key,
            });
        }

        Ok(ServiceRevision {
            service: service.name.clone(),
            revision: number,
            deployment_id: self.deployment_id.clone(),
            kind: service.kind,
            methods,
            created_at,
        })
    }
}
