//! `meta check` and `meta register`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use meta_check::report::{format_plan, format_rejection};
use meta_core::DeploymentDescriptor;
use metagrid_state::{StateError, StateStore};
use serde_json::json;

use super::{open_store, open_store_for_read, unix_now};

/// Dry run: check the descriptor against the store without writing.
pub fn check(data_dir: &Path, file: &Path, format: &str) -> Result<()> {
    let store = open_store_for_read(data_dir)?;
    run(&store, file, format, false)
}

pub fn register(data_dir: &Path, file: &Path, format: &str) -> Result<()> {
    let store = open_store(data_dir)?;
    run(&store, file, format, true)
}

fn run(store: &StateStore, file: &Path, format: &str, commit: bool) -> Result<()> {
    let descriptor = DeploymentDescriptor::from_file(file)
        .with_context(|| format!("reading descriptor {}", file.display()))?;

    let now = unix_now();
    let result = if commit {
        store.register_deployment(&descriptor, now)
    } else {
        store.check_deployment(&descriptor, now)
    };

    match result {
        Ok(plan) => {
            match format {
                "json" => {
                    let out = json!({ "accepted": true, "committed": commit, "plan": plan });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                _ => print!("{}", format_plan(&plan.deployment.id, &plan.revisions, commit)),
            }
            Ok(())
        }
        Err(StateError::Rejected(err)) => {
            match format {
                "json" => {
                    let out = json!({
                        "accepted": false,
                        "code": err.code(),
                        "message": err.to_string(),
                        "error": &err,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                _ => eprint!("{}", format_rejection(&err)),
            }
            bail!("deployment rejected ({})", err.code())
        }
        Err(other) => Err(other.into()),
    }
}
