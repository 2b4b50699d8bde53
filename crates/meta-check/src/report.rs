//! Human-readable report formatting.

use meta_core::ServiceRevision;

use crate::error::CheckError;

pub fn format_rejection(err: &CheckError) -> String {
    let code = err.code();
    let mut out = String::new();

    out.push_str(&format!("\n❌ {code}: {}\n\n", code.title()));
    out.push_str(&format!("  {err}\n\n"));
    out.push_str(&format!("  Run `meta explain {code}` for details.\n"));

    out
}

/// Summary of the revisions a deployment registers (or would register).
pub fn format_plan(deployment_id: &str, revisions: &[ServiceRevision], committed: bool) -> String {
    let mut out = String::new();

    let verb = if committed { "Registered" } else { "Would register" };
    out.push_str(&format!("\n✅ {verb} deployment {deployment_id}\n\n"));

    for rev in revisions {
        out.push_str(&format!(
            "  • {} revision {} ({}, {} methods)\n",
            rev.service,
            rev.revision,
            rev.kind,
            rev.methods.len()
        ));
    }
    out.push('\n');

    out
}
