//! Revision compatibility — a candidate revision against every prior one.
//!
//! A candidate must keep the service kind and the per-method key of every
//! prior revision, implement every prior method, and keep message shapes
//! that prior callers can still produce and consume:
//!
//! - input messages: a field number present in both versions keeps its
//!   name, type and `repeated` label. Fields may be added or dropped.
//! - output messages: every prior field is still present by number with the
//!   same name, type and label. Fields may be added.
//!
//! Message references inside fields are compared by type name only.

use meta_core::{MessageType, ServiceRevision};
use tracing::debug;

use crate::error::{CheckError, CheckResult, Conflict, Direction, FieldProblem};

/// Check `candidate` against all accepted revisions of the same service.
pub fn check_revision(candidate: &ServiceRevision, prior: &[ServiceRevision]) -> CheckResult<()> {
    for existing in prior {
        debug_assert_eq!(existing.service, candidate.service);
        if let Err(conflict) = compare(existing, candidate) {
            return Err(CheckError::RevisionConflict {
                deployment: candidate.deployment_id.clone(),
                service: candidate.service.clone(),
                revision: candidate.revision,
                existing: existing.revision,
                conflict,
            });
        }
    }
    debug!(
        service = %candidate.service,
        revision = candidate.revision,
        prior = prior.len(),
        "revision compatible"
    );
    Ok(())
}

fn compare(existing: &ServiceRevision, candidate: &ServiceRevision) -> Result<(), Conflict> {
    if existing.kind != candidate.kind {
        return Err(Conflict::KindChanged {
            previous: existing.kind,
            proposed: candidate.kind,
        });
    }

    for old in &existing.methods {
        let Some(new) = candidate.method(&old.name) else {
            return Err(Conflict::MissingMethod {
                method: old.name.clone(),
            });
        };

        if old.key != new.key {
            return Err(Conflict::KeyChanged {
                method: old.name.clone(),
                previous: old.key.clone(),
                proposed: new.key.clone(),
            });
        }

        check_message(&old.input, &new.input, Direction::Input).map_err(|problem| {
            Conflict::IncompatibleMessage {
                method: old.name.clone(),
                direction: Direction::Input,
                message: new.input.name.clone(),
                problem,
            }
        })?;
        check_message(&old.output, &new.output, Direction::Output).map_err(|problem| {
            Conflict::IncompatibleMessage {
                method: old.name.clone(),
                direction: Direction::Output,
                message: new.output.name.clone(),
                problem,
            }
        })?;
    }

    Ok(())
}

fn check_message(old: &MessageType, new: &MessageType, direction: Direction) -> Result<(), FieldProblem> {
    for field in &old.fields {
        let Some(current) = new.field_by_number(field.number) else {
            if direction == Direction::Output {
                return Err(FieldProblem::Removed {
                    number: field.number,
                    name: field.name.clone(),
                });
            }
            continue;
        };

        if current.name != field.name {
            return Err(FieldProblem::Renamed {
                number: field.number,
                previous: field.name.clone(),
                proposed: current.name.clone(),
            });
        }
        if current.ty != field.ty || current.repeated != field.repeated {
            return Err(FieldProblem::TypeChanged {
                number: field.number,
                name: field.name.clone(),
                previous: field.type_label(),
                proposed: current.type_label(),
            });
        }
    }
    Ok(())
}
