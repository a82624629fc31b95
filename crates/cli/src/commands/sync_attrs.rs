use keywarden_attr_sync::report::{render_plan, render_results};
use keywarden_attr_sync::sync::{AttrSyncEngine, SyncSummary};
use tracing::info;

/// Run the `sync-user-attributes` command.
pub async fn run(config_path: &str, dry_run: bool) -> anyhow::Result<()> {
    let client = super::connect(config_path).await?;

    info!(dry_run, "starting user attribute sync");

    let engine = AttrSyncEngine::new(client);
    let outcome = engine.run(dry_run).await?;

    if dry_run {
        print!("{}", render_plan(&outcome.plan));
        println!();
        println!("This was a dry run. No changes were made to the realm.");
        println!("Run `keywarden sync-user-attributes` without --dry-run to apply changes.");
    } else {
        print!(
            "{}",
            render_results(&outcome.results, &outcome.schema_created, &outcome.summary)
        );
    }

    if let Some(reason) = failure_reason(&outcome.summary) {
        anyhow::bail!(reason);
    }

    Ok(())
}

/// An apply run only fully succeeds when every update went through and no
/// user was excluded because their attributes could not be read. A dry run
/// reports fetch errors in the plan without failing.
fn failure_reason(summary: &SyncSummary) -> Option<String> {
    if summary.failed > 0 {
        return Some(format!("{} user update(s) failed", summary.failed));
    }
    if !summary.dry_run && summary.fetch_errors > 0 {
        return Some(format!(
            "{} user(s) could not be read and were not updated",
            summary.fetch_errors
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(failed: usize, fetch_errors: usize, dry_run: bool) -> SyncSummary {
        SyncSummary {
            updated: 0,
            skipped_no_match: 0,
            skipped_already_set: 0,
            fetch_errors,
            failed,
            dry_run,
        }
    }

    #[tokio::test]
    async fn sync_requires_config_file() {
        let result = run("/nonexistent/keywarden.toml", true).await;
        assert!(result.is_err());
    }

    #[test]
    fn clean_apply_run_is_a_success() {
        assert!(failure_reason(&summary(0, 0, false)).is_none());
    }

    #[test]
    fn failed_updates_fail_the_run() {
        let reason = failure_reason(&summary(2, 0, false)).unwrap();
        assert!(reason.contains("2 user update(s) failed"));
    }

    #[test]
    fn fetch_errors_fail_an_apply_run() {
        let reason = failure_reason(&summary(0, 1, false)).unwrap();
        assert!(reason.contains("could not be read"));
    }

    #[test]
    fn fetch_errors_do_not_fail_a_dry_run() {
        assert!(failure_reason(&summary(0, 1, true)).is_none());
    }
}
