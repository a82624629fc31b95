//! Human-readable rendering of plans and run results.

use std::collections::HashMap;
use std::fmt::Write;

use crate::pattern::{CLASSIFICATION_ATTR, NATIONALITY_ATTR, NEED_TO_KNOW_ATTR};
use crate::plan::{PlanAction, SyncPlanEntry};
use crate::sync::{ExecutionResult, SyncSummary};

const OWNED_FIELDS: [&str; 3] = [CLASSIFICATION_ATTR, NATIONALITY_ATTR, NEED_TO_KNOW_ATTR];

/// Render a dry-run plan, one line per user in plan order.
pub fn render_plan(plan: &[SyncPlanEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Plan for {} users:", plan.len());
    let _ = writeln!(out);

    for entry in plan {
        match entry.action {
            PlanAction::Update => {
                let _ = writeln!(
                    out,
                    "{:<18} {:<32} {}",
                    "update",
                    entry.username,
                    field_changes(&entry.current_attributes, &entry.desired_attributes)
                );
            }
            PlanAction::SkipAlreadySet => {
                let _ = writeln!(
                    out,
                    "{:<18} {:<32} {}",
                    "skip (set)",
                    entry.username,
                    field_changes(&entry.current_attributes, &entry.desired_attributes)
                );
            }
            PlanAction::SkipNoMatch => {
                let _ = writeln!(
                    out,
                    "{:<18} {:<32} username does not match pattern",
                    "skip (no match)", entry.username
                );
            }
            PlanAction::FetchError => {
                let _ = writeln!(
                    out,
                    "{:<18} {:<32} {}",
                    "fetch error",
                    entry.username,
                    entry.fetch_error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    out
}

/// Render the results of an apply run: per-user outcomes plus the tally.
pub fn render_results(
    results: &[ExecutionResult],
    schema_created: &[String],
    summary: &SyncSummary,
) -> String {
    let mut out = String::new();

    if !schema_created.is_empty() {
        let _ = writeln!(
            out,
            "Created user profile attributes: {}",
            schema_created.join(", ")
        );
        let _ = writeln!(out);
    }

    for result in results {
        if result.success {
            let _ = writeln!(out, "updated  {}", result.username);
        } else {
            let _ = writeln!(
                out,
                "failed   {}  {}",
                result.username,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    if !results.is_empty() {
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Summary:");
    let _ = writeln!(out, "  Updated:               {}", summary.updated);
    let _ = writeln!(out, "  Skipped (no match):    {}", summary.skipped_no_match);
    let _ = writeln!(out, "  Skipped (already set): {}", summary.skipped_already_set);
    let _ = writeln!(out, "  Fetch errors:          {}", summary.fetch_errors);
    let _ = writeln!(out, "  Failed:                {}", summary.failed);

    out
}

/// Render `field: old -> new` for each owned field, in a fixed order.
fn field_changes(
    current: &HashMap<String, Vec<String>>,
    desired: &HashMap<String, Vec<String>>,
) -> String {
    let mut parts = Vec::new();
    for field in OWNED_FIELDS {
        let Some(new) = desired.get(field).and_then(|v| v.first()) else {
            continue;
        };
        match current.get(field).and_then(|v| v.first()) {
            Some(old) if old == new => parts.push(format!("{field}: \"{new}\"")),
            Some(old) => parts.push(format!("{field}: \"{old}\" -> \"{new}\"")),
            None => parts.push(format!("{field}: (unset) -> \"{new}\"")),
        }
    }
    parts.join(", ")
}
