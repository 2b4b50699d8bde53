//! `meta services list` and `meta services describe`.

use std::path::Path;

use anyhow::{anyhow, Result};
use meta_core::{DeploymentRecord, ServiceRevision};

use super::{open_store_for_read, render_table};

pub fn list(data_dir: &Path) -> Result<()> {
    let store = open_store_for_read(data_dir)?;
    let services = store.list_services()?;

    if services.is_empty() {
        println!("No services registered.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = services
        .iter()
        .map(|rev| {
            vec![
                rev.service.clone(),
                rev.kind.to_string(),
                rev.revision.to_string(),
                rev.deployment_id.clone(),
                rev.methods.len().to_string(),
            ]
        })
        .collect();
    print!(
        "{}",
        render_table(&["NAME", "KIND", "REVISION", "DEPLOYMENT", "METHODS"], &rows)
    );

    Ok(())
}

pub fn describe(data_dir: &Path, name: &str, revision: Option<u32>, format: &str) -> Result<()> {
    let store = open_store_for_read(data_dir)?;
    let rev = match revision {
        Some(n) => store.get_revision(name, n)?,
        None => store.latest_revision(name)?,
    }
    .ok_or_else(|| match revision {
        Some(n) => anyhow!("service '{name}' has no revision {n}"),
        None => anyhow!("service '{name}' is not registered"),
    })?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&rev)?),
        _ => {
            let deployment = store.get_deployment(&rev.deployment_id)?;
            print!("{}", format_description(&rev, deployment.as_ref()));
        }
    }

    Ok(())
}

fn format_description(rev: &ServiceRevision, deployment: Option<&DeploymentRecord>) -> String {
    let mut out = String::new();

    out.push_str("Service Information\n");
    let mut info = vec![
        vec!["Name:".to_string(), rev.service.clone()],
        vec!["Kind:".to_string(), rev.kind.to_string()],
        vec!["Revision:".to_string(), rev.revision.to_string()],
        vec!["Deployment:".to_string(), rev.deployment_id.clone()],
    ];
    if let Some(d) = deployment {
        info.push(vec!["Endpoint:".to_string(), d.endpoint.clone()]);
    }
    info.push(vec!["Registered:".to_string(), rev.created_at.to_string()]);
    for row in &info {
        out.push_str(&format!("  {:<12}{}\n", row[0], row[1]));
    }

    out.push_str("\nMethods\n");
    let rows: Vec<Vec<String>> = rev
        .methods
        .iter()
        .map(|m| {
            vec![
                m.name.clone(),
                m.input.name.clone(),
                m.output.name.clone(),
                m.key.as_ref().map(ToString::to_string).unwrap_or_default(),
            ]
        })
        .collect();
    out.push_str(&render_table(&["NAME", "INPUT TYPE", "OUTPUT TYPE", "KEY FIELD"], &rows));

    out
}
