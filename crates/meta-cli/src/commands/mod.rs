pub mod deployments;
pub mod explain;
pub mod init;
pub mod register;
pub mod services;

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use metagrid_state::StateStore;
use tracing::debug;

/// File name of the revision store inside the data directory.
pub const STORE_FILE: &str = "registry.redb";

/// Open (or create) the revision store under `data_dir`.
pub fn open_store(data_dir: &Path) -> Result<StateStore> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;
    let path = data_dir.join(STORE_FILE);
    StateStore::open(&path).with_context(|| format!("opening revision store {}", path.display()))
}

/// Open the revision store for reading. A data directory without a store
/// reads as an empty history and nothing is created on disk.
pub fn open_store_for_read(data_dir: &Path) -> Result<StateStore> {
    let path = data_dir.join(STORE_FILE);
    if path.is_file() {
        return open_store(data_dir);
    }
    debug!(path = %path.display(), "no revision store yet, using empty history");
    Ok(StateStore::open_in_memory()?)
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Render rows as a left-aligned table with a header line.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect();
        format!("  {}\n", padded.join("  ").trim_end())
    };
    out.push_str(&line(headers.to_vec()));
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}
