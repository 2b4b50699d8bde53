use std::path::Path;

use anyhow::{bail, Result};
use meta_core::{DeploymentDescriptor, ServiceKind};

pub fn init(name: &str, kind: &str, endpoint: &str, path: &Path) -> Result<()> {
    let kind: ServiceKind = kind.parse().map_err(anyhow::Error::msg)?;
    if path.exists() {
        bail!("{} already exists, refusing to overwrite", path.display());
    }

    let descriptor = DeploymentDescriptor::scaffold(name, kind, endpoint);
    std::fs::write(path, descriptor.to_toml_string()?)?;
    println!("✓ Generated {}", path.display());

    Ok(())
}
