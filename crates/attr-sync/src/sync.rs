//! Attribute sync engine: plan, then report or apply.

use keywarden_admin::client::KeycloakAdminClient;
use keywarden_core::error::Result;
use tracing::{info, warn};

use crate::plan::{build_plan, PlanAction, SyncPlanEntry};
use crate::schema::ensure_profile_fields;

/// Tally of a sync run.
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub updated: usize,
    pub skipped_no_match: usize,
    pub skipped_already_set: usize,
    pub fetch_errors: usize,
    pub failed: usize,
    pub dry_run: bool,
}

/// Per-user outcome of an applied update.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub user_id: String,
    pub username: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Everything a run produced: the plan, the per-user results (empty on
/// dry runs), the schema fields created, and the tally.
#[derive(Debug)]
pub struct SyncOutcome {
    pub plan: Vec<SyncPlanEntry>,
    pub results: Vec<ExecutionResult>,
    pub schema_created: Vec<String>,
    pub summary: SyncSummary,
}

/// Sync engine that derives user attributes from username patterns.
pub struct AttrSyncEngine {
    client: KeycloakAdminClient,
}

impl AttrSyncEngine {
    /// Create a new engine over an authenticated admin client.
    pub fn new(client: KeycloakAdminClient) -> Self {
        Self { client }
    }

    /// Run a sync. A dry run plans and stops without issuing any write
    /// call — not even schema creation. An apply run ensures the profile
    /// schema first, then works through the plan one user at a time.
    pub async fn run(&self, dry_run: bool) -> Result<SyncOutcome> {
        info!(realm = self.client.realm(), dry_run, "starting attribute sync");

        let plan = build_plan(&self.client).await?;

        if dry_run {
            let summary = summarize(&plan, &[], true);
            info!(
                would_update = summary.updated,
                skipped_no_match = summary.skipped_no_match,
                skipped_already_set = summary.skipped_already_set,
                "attribute sync dry run complete"
            );
            return Ok(SyncOutcome {
                plan,
                results: Vec::new(),
                schema_created: Vec::new(),
                summary,
            });
        }

        let schema_created = ensure_profile_fields(&self.client).await?;
        let results = self.apply(&plan).await;
        let summary = summarize(&plan, &results, false);

        info!(
            updated = summary.updated,
            failed = summary.failed,
            skipped_no_match = summary.skipped_no_match,
            skipped_already_set = summary.skipped_already_set,
            fetch_errors = summary.fetch_errors,
            "attribute sync complete"
        );

        Ok(SyncOutcome {
            plan,
            results,
            schema_created,
            summary,
        })
    }

    /// Apply every `Update` entry, best effort. A per-user failure is
    /// recorded and the batch moves on; nothing is rolled back.
    async fn apply(&self, plan: &[SyncPlanEntry]) -> Vec<ExecutionResult> {
        let mut results = Vec::new();

        for entry in plan {
            if entry.action != PlanAction::Update {
                continue;
            }

            // Full replacement for the owned fields; everything else the
            // user already carries rides along untouched.
            let mut attributes = entry.current_attributes.clone();
            for (key, value) in &entry.desired_attributes {
                attributes.insert(key.clone(), value.clone());
            }

            match self
                .client
                .update_user_attributes(&entry.user_id, &attributes)
                .await
            {
                Ok(()) => {
                    info!(username = %entry.username, "updated user attributes");
                    results.push(ExecutionResult {
                        user_id: entry.user_id.clone(),
                        username: entry.username.clone(),
                        success: true,
                        error: None,
                    });
                }
                Err(e) => {
                    warn!(username = %entry.username, error = %e, "user attribute update failed");
                    results.push(ExecutionResult {
                        user_id: entry.user_id.clone(),
                        username: entry.username.clone(),
                        success: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        results
    }
}

fn summarize(plan: &[SyncPlanEntry], results: &[ExecutionResult], dry_run: bool) -> SyncSummary {
    let failed = results.iter().filter(|r| !r.success).count();
    let updated = if dry_run {
        plan.iter().filter(|e| e.action == PlanAction::Update).count()
    } else {
        results.iter().filter(|r| r.success).count()
    };

    SyncSummary {
        updated,
        skipped_no_match: plan
            .iter()
            .filter(|e| e.action == PlanAction::SkipNoMatch)
            .count(),
        skipped_already_set: plan
            .iter()
            .filter(|e| e.action == PlanAction::SkipAlreadySet)
            .count(),
        fetch_errors: plan
            .iter()
            .filter(|e| e.action == PlanAction::FetchError)
            .count(),
        failed,
        dry_run,
    }
}
