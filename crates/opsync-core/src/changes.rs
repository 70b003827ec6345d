//! Field-level change detection between a stored and an incoming task.

use crate::CanonicalTask;

/// Compute human-readable deltas for the tracked fields.
///
/// Tracked fields, in order: status, assignee, responsible, priority.
/// Values are compared verbatim; an empty or absent value is rendered with
/// the field's fallback text.
pub fn detect_changes(prior: &CanonicalTask, incoming: &CanonicalTask) -> Vec<String> {
    let mut changes = Vec::new();

    push_change(
        &mut changes,
        "Status",
        Some(&prior.status),
        Some(&incoming.status),
        "N/A",
    );
    push_change(
        &mut changes,
        "Assignee",
        Some(&prior.assignee),
        Some(&incoming.assignee),
        "Unassigned",
    );
    push_change(
        &mut changes,
        "Responsible",
        prior.responsible.as_ref(),
        incoming.responsible.as_ref(),
        "N/A",
    );
    push_change(
        &mut changes,
        "Priority",
        Some(&prior.priority),
        Some(&incoming.priority),
        "Normal",
    );

    changes
}

fn push_change(
    changes: &mut Vec<String>,
    label: &str,
    old: Option<&String>,
    new: Option<&String>,
    fallback: &str,
) {
    if old == new {
        return;
    }
    changes.push(format!(
        "{label}: {} → {}",
        or_fallback(old, fallback),
        or_fallback(new, fallback)
    ));
}

fn or_fallback<'a>(value: Option<&'a String>, fallback: &'a str) -> &'a str {
    match value {
        Some(v) if !v.is_empty() => v.as_str(),
        _ => fallback,
    }
}
