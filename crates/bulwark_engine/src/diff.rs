//! Human-readable differences between protections snapshots.

use bulwark_protections::{ProtectionKind, ProtectionSet, Protections};
use std::collections::BTreeSet;

/// Describes what changed from `old` to `new`, one line per change.
///
/// Returns an empty list when the snapshots are equal.
///
/// ```
/// use bulwark_engine::diff_protections;
/// use bulwark_protections::Protections;
///
/// let old = Protections::from_json(r#"{"global": {"no_media": {"enabled": false}}}"#).unwrap();
/// let new = Protections::from_json(r#"{"global": {"no_media": {"enabled": true}}}"#).unwrap();
/// assert_eq!(diff_protections(Some(&old), &new), vec!["global: no_media enabled"]);
/// ```
pub fn diff_protections(old: Option<&Protections>, new: &Protections) -> Vec<String> {
    let mut lines = Vec::new();
    let old_global = old.and_then(|p| p.global().as_ref());
    diff_scope("global", old_global, new.global().as_ref(), &mut lines);

    let rooms: BTreeSet<_> = old
        .map(|p| p.overrides().keys().collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .chain(new.overrides().keys())
        .collect();
    for room in rooms {
        let label = format!("override {}", room);
        let before = old.and_then(|p| p.overrides().get(room));
        diff_scope(&label, before, new.overrides().get(room), &mut lines);
    }
    lines
}

fn diff_scope(
    label: &str,
    old: Option<&ProtectionSet>,
    new: Option<&ProtectionSet>,
    lines: &mut Vec<String>,
) {
    match (old, new) {
        (None, None) => {}
        (None, Some(set)) => lines.push(format!("{}: added ({})", label, summarize(set))),
        (Some(_), None) => lines.push(format!("{}: removed", label)),
        (Some(before), Some(after)) => {
            diff_protection(
                label,
                ProtectionKind::NoMedia,
                Some((before.no_media(), before.no_media().is_enabled())),
                Some((after.no_media(), after.no_media().is_enabled())),
                lines,
            );
            diff_protection(
                label,
                ProtectionKind::MaxMentions,
                before.max_mentions().as_ref().map(|p| (p, p.is_enabled())),
                after.max_mentions().as_ref().map(|p| (p, p.is_enabled())),
                lines,
            );
            diff_protection(
                label,
                ProtectionKind::ServerRequirements,
                before.server_requirements().as_ref().map(|p| (p, p.is_enabled())),
                after.server_requirements().as_ref().map(|p| (p, p.is_enabled())),
                lines,
            );
        }
    }
}

fn diff_protection<T: PartialEq>(
    label: &str,
    kind: ProtectionKind,
    old: Option<(&T, bool)>,
    new: Option<(&T, bool)>,
    lines: &mut Vec<String>,
) {
    match (old, new) {
        (None, None) => {}
        (None, Some(_)) => lines.push(format!("{}: {} added", label, kind)),
        (Some(_), None) => lines.push(format!("{}: {} removed", label, kind)),
        (Some((before, was_enabled)), Some((after, is_enabled))) => {
            if was_enabled != is_enabled {
                let state = if is_enabled { "enabled" } else { "disabled" };
                lines.push(format!("{}: {} {}", label, kind, state));
            } else if before != after {
                lines.push(format!("{}: {} settings changed", label, kind));
            }
        }
    }
}

fn summarize(set: &ProtectionSet) -> String {
    let enabled: Vec<String> = set.enabled().iter().map(|p| p.kind().to_string()).collect();
    if enabled.is_empty() {
        "nothing enabled".to_string()
    } else {
        enabled.join(", ")
    }
}
