//! StateStore — redb-backed revision persistence for metagrid.
//!
//! Provides deployment registration (checked and all-or-nothing) and read
//! access to accepted revisions and deployment records. All values are
//! JSON-serialized into redb's `&[u8]` value columns. The store supports
//! both on-disk and in-memory backends (the latter for testing).

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use meta_core::{DeploymentDescriptor, DeploymentRecord, RevisionNumber, ServiceRef, ServiceRevision};
use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{StateError, StateResult};
use crate::tables::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Revisions a deployment registers, or would register on a dry run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistrationPlan {
    pub deployment: DeploymentRecord,
    pub revisions: Vec<ServiceRevision>,
}

/// Thread-safe revision store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "revision store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory revision store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(REVISIONS).map_err(map_err!(Table))?;
        txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Registration ───────────────────────────────────────────────

    /// Run every registration check against the current history without
    /// writing anything.
    pub fn check_deployment(
        &self,
        descriptor: &DeploymentDescriptor,
        now: u64,
    ) -> StateResult<RegistrationPlan> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let revisions = txn.open_table(REVISIONS).map_err(map_err!(Table))?;
        let deployments = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;

        let plan = plan(&revisions, &deployments, descriptor, now).inspect_err(log_rejection)?;
        debug!(
            deployment = %plan.deployment.id,
            services = plan.revisions.len(),
            "deployment check passed"
        );
        Ok(plan)
    }

    /// Check and register a deployment. Either every service revision of
    /// the deployment is stored, or none is.
    pub fn register_deployment(
        &self,
        descriptor: &DeploymentDescriptor,
        now: u64,
    ) -> StateResult<RegistrationPlan> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let planned = {
            let mut revisions = txn.open_table(REVISIONS).map_err(map_err!(Table))?;
            let mut deployments = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;

            plan(&revisions, &deployments, descriptor, now).and_then(|planned| {
                for rev in &planned.revisions {
                    let value = serde_json::to_vec(rev).map_err(map_err!(Serialize))?;
                    revisions
                        .insert(rev.table_key().as_str(), value.as_slice())
                        .map_err(map_err!(Write))?;
                }
                let record = &planned.deployment;
                let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
                deployments
                    .insert(record.id.as_str(), value.as_slice())
                    .map_err(map_err!(Write))?;
                Ok(planned)
            })
        };

        let planned = match planned {
            Ok(planned) => planned,
            Err(err) => {
                log_rejection(&err);
                txn.abort().map_err(map_err!(Transaction))?;
                return Err(err);
            }
        };
        txn.commit().map_err(map_err!(Transaction))?;

        for rev in &planned.revisions {
            info!(
                deployment = %planned.deployment.id,
                service = %rev.service,
                revision = rev.revision,
                kind = %rev.kind,
                "service revision registered"
            );
        }
        Ok(planned)
    }

    // ── Revisions ──────────────────────────────────────────────────

    /// All accepted revisions of a service, oldest first.
    pub fn list_revisions(&self, service: &str) -> StateResult<Vec<ServiceRevision>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REVISIONS).map_err(map_err!(Table))?;
        scan_revisions(&table, service)
    }

    /// Get a specific revision of a service.
    pub fn get_revision(
        &self,
        service: &str,
        revision: RevisionNumber,
    ) -> StateResult<Option<ServiceRevision>> {
        let key = meta_core::revision_key(service, revision);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REVISIONS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    /// The most recent revision of a service.
    pub fn latest_revision(&self, service: &str) -> StateResult<Option<ServiceRevision>> {
        Ok(self.list_revisions(service)?.pop())
    }

    /// The latest revision of every registered service, ordered by name.
    pub fn list_services(&self) -> StateResult<Vec<ServiceRevision>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REVISIONS).map_err(map_err!(Table))?;
        let mut latest: BTreeMap<String, ServiceRevision> = BTreeMap::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let rev: ServiceRevision = decode(value.value())?;
            match latest.get(&rev.service) {
                Some(current) if current.revision >= rev.revision => {}
                _ => {
                    latest.insert(rev.service.clone(), rev);
                }
            }
        }
        Ok(latest.into_values().collect())
    }

    // ── Deployments ────────────────────────────────────────────────

    /// Get a deployment record by ID.
    pub fn get_deployment(&self, id: &str) -> StateResult<Option<DeploymentRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    /// List all deployment records, oldest first.
    pub fn list_deployments(&self) -> StateResult<Vec<DeploymentRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: DeploymentRecord = decode(value.value())?;
            results.push(record);
        }
        results.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(results)
    }
}

/// Check a descriptor against the history visible through `revisions` and
/// `deployments`, producing the revisions it would add.
fn plan<R, D>(
    revisions: &R,
    deployments: &D,
    descriptor: &DeploymentDescriptor,
    now: u64,
) -> StateResult<RegistrationPlan>
where
    R: ReadableTable<&'static str, &'static [u8]>,
    D: ReadableTable<&'static str, &'static [u8]>,
{
    let prepared = meta_check::prepare(descriptor)?;
    let deployment_id = prepared.deployment_id();
    if deployments.get(deployment_id).map_err(map_err!(Read))?.is_some() {
        return Err(StateError::DeploymentExists(deployment_id.to_string()));
    }

    let mut planned = Vec::with_capacity(prepared.services().len());
    for service in prepared.services() {
        let prior = scan_revisions(revisions, &service.name)?;
        let number = prior.last().map_or(1, |rev| rev.revision + 1);
        let candidate = prepared.revision(service, number, now)?;
        meta_check::check_revision(&candidate, &prior)?;
        planned.push(candidate);
    }

    Ok(RegistrationPlan {
        deployment: DeploymentRecord {
            id: deployment_id.to_string(),
            endpoint: prepared.endpoint().to_string(),
            services: planned
                .iter()
                .map(|rev| ServiceRef {
                    name: rev.service.clone(),
                    revision: rev.revision,
                })
                .collect(),
            created_at: now,
        },
        revisions: planned,
    })
}

/// Revisions of one service by key prefix scan, in revision order.
fn scan_revisions<T>(table: &T, service: &str) -> StateResult<Vec<ServiceRevision>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let prefix = format!("{service}:");
    let mut results = Vec::new();
    for entry in table.range(prefix.as_str()..).map_err(map_err!(Read))? {
        let (key, value) = entry.map_err(map_err!(Read))?;
        if !key.value().starts_with(&prefix) {
            break;
        }
        results.push(decode(value.value())?);
    }
    Ok(results)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StateResult<T> {
    serde_json::from_slice(bytes).map_err(map_err!(Deserialize))
}

fn log_rejection(err: &StateError) {
    match err {
        StateError::Rejected(check) => warn!(
            code = %check.code(),
            service = check.service().unwrap_or("-"),
            "deployment rejected: {check}"
        ),
        StateError::DeploymentExists(id) => warn!(deployment = %id, "deployment already registered"),
        _ => {}
    }
}
