//! Plan construction: one entry per user, in store order.

use std::collections::HashMap;

use keywarden_admin::client::KeycloakAdminClient;
use keywarden_core::error::Result;
use tracing::{debug, warn};

use crate::pattern::{parse_username, ParsedUsername};

/// What the executor should do with a plan entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    /// Username does not decompose into the three-part pattern.
    SkipNoMatch,
    /// All three derived attributes already hold the desired values.
    SkipAlreadySet,
    /// At least one derived attribute differs; an update will be issued.
    Update,
    /// Current attributes could not be read; excluded from mutation.
    FetchError,
}

/// One user's row in the sync plan.
#[derive(Debug, Clone)]
pub struct SyncPlanEntry {
    pub user_id: String,
    pub username: String,
    pub parsed: Option<ParsedUsername>,
    /// The user's full attribute map as currently stored.
    pub current_attributes: HashMap<String, Vec<String>>,
    /// Derived attributes; empty unless the username matched.
    pub desired_attributes: HashMap<String, Vec<String>>,
    pub action: PlanAction,
    /// Populated only when `action` is [`PlanAction::FetchError`].
    pub fetch_error: Option<String>,
}

/// Build the sync plan from live realm state.
///
/// Users are listed once; a failure there aborts the run. When the listing
/// omits a user's attributes, a per-user lookup fills them in — a failing
/// lookup marks that entry `FetchError` and the plan continues. Entries come
/// out in the order the store returned users, so dry-run output is stable
/// across runs against unchanged state.
pub async fn build_plan(client: &KeycloakAdminClient) -> Result<Vec<SyncPlanEntry>> {
    let users = client.list_users().await?;
    debug!(count = users.len(), realm = client.realm(), "listed users for planning");

    let mut plan = Vec::with_capacity(users.len());

    for user in users {
        let username = user.username.clone();

        let user_id = match user.id {
            Some(id) => id,
            None => {
                warn!(username = %username, "user record missing id, skipping");
                plan.push(SyncPlanEntry {
                    user_id: String::new(),
                    username,
                    parsed: None,
                    current_attributes: HashMap::new(),
                    desired_attributes: HashMap::new(),
                    action: PlanAction::FetchError,
                    fetch_error: Some("user record missing id".to_string()),
                });
                continue;
            }
        };

        let current_attributes = match user.attributes {
            Some(attrs) => attrs,
            None => match client.get_user(&user_id).await {
                Ok(Some(full)) => full.attributes.unwrap_or_default(),
                Ok(None) => {
                    warn!(username = %username, "user vanished between list and fetch");
                    plan.push(fetch_error_entry(user_id, username, "user not found"));
                    continue;
                }
                Err(e) => {
                    warn!(username = %username, error = %e, "could not fetch user attributes");
                    plan.push(fetch_error_entry(user_id, username, &e.to_string()));
                    continue;
                }
            },
        };

        let parsed = parse_username(&username);
        let (desired_attributes, action) = match &parsed {
            None => (HashMap::new(), PlanAction::SkipNoMatch),
            Some(p) => {
                let desired = p.desired_attributes();
                if attributes_match(&current_attributes, &desired) {
                    (desired, PlanAction::SkipAlreadySet)
                } else {
                    (desired, PlanAction::Update)
                }
            }
        };

        plan.push(SyncPlanEntry {
            user_id,
            username,
            parsed,
            current_attributes,
            desired_attributes,
            action,
            fetch_error: None,
        });
    }

    Ok(plan)
}

fn fetch_error_entry(user_id: String, username: String, error: &str) -> SyncPlanEntry {
    SyncPlanEntry {
        user_id,
        username,
        parsed: None,
        current_attributes: HashMap::new(),
        desired_attributes: HashMap::new(),
        action: PlanAction::FetchError,
        fetch_error: Some(error.to_string()),
    }
}

/// Field-wise comparison over the desired keys only; attributes the sync
/// does not own never influence the action.
fn attributes_match(
    current: &HashMap<String, Vec<String>>,
    desired: &HashMap<String, Vec<String>>,
) -> bool {
    desired
        .iter()
        .all(|(key, value)| current.get(key) == Some(value))
}
