//! Validation command handler.

use bulwark::{Protections, ProtectionSet};
use std::path::Path;

fn describe(label: &str, set: &ProtectionSet) {
    let enabled: Vec<String> = set.enabled().iter().map(|p| p.kind().to_string()).collect();
    if enabled.is_empty() {
        println!("  {}: nothing enabled", label);
    } else {
        println!("  {}: {}", label, enabled.join(", "));
    }
}

/// Parses a protections snapshot and prints the effective configuration.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn handle_validate_command(path: &Path) -> anyhow::Result<()> {
    tracing::info!("Validating protections");
    let content = std::fs::read(path)?;
    let protections = Protections::from_slice(&content)?;

    println!("✓ {} is valid", path.display());
    match protections.global() {
        Some(set) => describe("global", set),
        None => println!("  global: not configured"),
    }
    let mut rooms: Vec<_> = protections.overrides().iter().collect();
    rooms.sort_by(|a, b| a.0.cmp(b.0));
    for (room, set) in rooms {
        describe(&format!("override {}", room), set);
    }
    Ok(())
}
