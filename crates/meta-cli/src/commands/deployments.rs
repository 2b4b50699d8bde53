use std::path::Path;

use anyhow::Result;

use super::{open_store_for_read, render_table};

pub fn list(data_dir: &Path) -> Result<()> {
    let store = open_store_for_read(data_dir)?;
    let deployments = store.list_deployments()?;

    if deployments.is_empty() {
        println!("No deployments registered.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = deployments
        .iter()
        .map(|d| {
            let services: Vec<String> = d
                .services
                .iter()
                .map(|s| format!("{}@{}", s.name, s.revision))
                .collect();
            vec![
                d.id.clone(),
                d.endpoint.clone(),
                services.join(", "),
                d.created_at.to_string(),
            ]
        })
        .collect();
    print!("{}", render_table(&["ID", "ENDPOINT", "SERVICES", "REGISTERED"], &rows));

    Ok(())
}
