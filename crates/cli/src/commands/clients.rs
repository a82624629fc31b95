use std::collections::HashMap;

use keywarden_admin::client::KeycloakAdminClient;
use keywarden_admin::models::{ClientRepresentation, ProtocolMapper};
use tracing::warn;

const AUDIENCE_MAPPER_TYPE: &str = "oidc-audience-mapper";
const CUSTOM_AUDIENCE_KEY: &str = "included.custom.audience";
const CLIENT_AUDIENCE_KEY: &str = "included.client.audience";
const DEFAULT_MAPPER_NAME: &str = "audience-mapper";

/// Run the `list-clients` command.
pub async fn run_list(config_path: &str) -> anyhow::Result<()> {
    let client = super::connect(config_path).await?;
    let clients = client.list_clients().await?;

    println!("Found {} clients:", clients.len());
    println!();
    println!("{:<40} {:<30} {}", "Client ID", "Name", "ID");
    println!("{}", "-".repeat(100));
    for c in &clients {
        println!(
            "{:<40} {:<30} {}",
            c.client_id,
            c.name.as_deref().unwrap_or(""),
            c.id.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

/// Run the `show-client` command.
pub async fn run_show(config_path: &str, client_id: &str) -> anyhow::Result<()> {
    let client = super::connect(config_path).await?;
    let clients = client.list_clients().await?;

    let Some(target) = clients.iter().find(|c| c.client_id == client_id) else {
        anyhow::bail!("client '{client_id}' not found");
    };

    println!("Client details for '{client_id}':");
    println!("{}", serde_json::to_string_pretty(target)?);

    let Some(internal_id) = target.id.as_deref() else {
        anyhow::bail!("client '{client_id}' has no internal id");
    };

    let mappers = client.list_protocol_mappers(internal_id).await?;
    println!();
    println!("Protocol mappers:");
    for mapper in &mappers {
        println!("  - {} ({})", mapper.name, mapper.protocol_mapper);
        for (key, value) in &mapper.config {
            println!("      {key}: {value}");
        }
    }

    Ok(())
}

/// Run the `find-audience` command.
pub async fn run_find_audience(config_path: &str, audience: Option<&str>) -> anyhow::Result<()> {
    let client = super::connect(config_path).await?;
    let matches = find_clients_with_audience(&client, audience).await?;

    println!("Found {} clients with audience configuration:", matches.len());
    println!();
    println!("{:<40} {:<10} {}", "Client ID", "Type", "Audience");
    println!("{}", "-".repeat(80));
    for m in &matches {
        println!("{:<40} {:<10} {}", m.client_id, m.audience_type, m.audience);
    }

    Ok(())
}

/// Run the `update-audience` command.
pub async fn run_update_audience(
    config_path: &str,
    client_ids: &[String],
    audience: &str,
) -> anyhow::Result<()> {
    let client = super::connect(config_path).await?;
    let clients = client.list_clients().await?;

    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for client_id in client_ids {
        match update_client_audience(&client, &clients, client_id, audience).await {
            Ok(created) => {
                if created {
                    println!("created audience mapper for '{client_id}' with audience '{audience}'");
                } else {
                    println!("updated audience for '{client_id}' to '{audience}'");
                }
                succeeded += 1;
            }
            Err(e) => {
                println!("failed to update '{client_id}': {e}");
                failed += 1;
            }
        }
    }

    println!();
    println!("Summary: {succeeded} succeeded, {failed} failed");
    if failed > 0 {
        anyhow::bail!("{failed} client update(s) failed");
    }

    Ok(())
}

/// How `update-redirect-uris` combines the requested URIs with a client's
/// current list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RedirectUriMode {
    /// Replace the full list
    Replace,
    /// Append, skipping entries already present
    Add,
    /// Remove the named entries
    Remove,
}

/// Run the `list-redirect-uris` command.
pub async fn run_list_redirect_uris(config_path: &str, filter: Option<&str>) -> anyhow::Result<()> {
    let client = super::connect(config_path).await?;
    let clients = client.list_clients().await?;

    println!("Found {} clients:", clients.len());
    println!();
    println!("{:<40} Redirect URIs", "Client ID");
    println!("{}", "-".repeat(100));

    let mut matched = 0usize;
    for c in &clients {
        if let Some(pattern) = filter {
            if !c.redirect_uris.iter().any(|uri| uri.contains(pattern)) {
                continue;
            }
        }
        matched += 1;
        match c.redirect_uris.split_first() {
            Some((first, rest)) => {
                println!("{:<40} {first}", c.client_id);
                for uri in rest {
                    println!("{:<40} {uri}", "");
                }
            }
            None => println!("{:<40} (no redirect URIs)", c.client_id),
        }
    }

    if let Some(pattern) = filter {
        println!();
        println!("{matched} clients matched filter '{pattern}'");
    }

    Ok(())
}

/// Run the `update-redirect-uris` command.
pub async fn run_update_redirect_uris(
    config_path: &str,
    client_ids: &[String],
    uris: &[String],
    mode: RedirectUriMode,
) -> anyhow::Result<()> {
    let client = super::connect(config_path).await?;
    let clients = client.list_clients().await?;

    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for client_id in client_ids {
        match update_redirect_uris_for(&client, &clients, client_id, uris, mode).await {
            Ok(new_uris) => {
                println!("updated '{client_id}'");
                println!("  result: {new_uris:?}");
                succeeded += 1;
            }
            Err(e) => {
                println!("failed to update '{client_id}': {e}");
                failed += 1;
            }
        }
    }

    println!();
    println!("Summary: {succeeded} succeeded, {failed} failed");
    if failed > 0 {
        anyhow::bail!("{failed} client update(s) failed");
    }

    Ok(())
}

async fn update_redirect_uris_for(
    client: &KeycloakAdminClient,
    clients: &[ClientRepresentation],
    client_id: &str,
    uris: &[String],
    mode: RedirectUriMode,
) -> anyhow::Result<Vec<String>> {
    let target = clients
        .iter()
        .find(|c| c.client_id == client_id)
        .ok_or_else(|| anyhow::anyhow!("client '{client_id}' not found"))?;
    let internal_id = target
        .id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("client '{client_id}' has no internal id"))?;

    let new_uris = apply_uri_mode(&target.redirect_uris, uris, mode);
    client
        .update_client_redirect_uris(internal_id, &new_uris)
        .await?;
    Ok(new_uris)
}

/// Combine a client's current redirect URIs with the requested ones.
fn apply_uri_mode(current: &[String], uris: &[String], mode: RedirectUriMode) -> Vec<String> {
    match mode {
        RedirectUriMode::Replace => uris.to_vec(),
        RedirectUriMode::Add => {
            let mut merged = current.to_vec();
            for uri in uris {
                if !merged.contains(uri) {
                    merged.push(uri.clone());
                }
            }
            merged
        }
        RedirectUriMode::Remove => current
            .iter()
            .filter(|uri| !uris.contains(uri))
            .cloned()
            .collect(),
    }
}

/// Run the `replace-redirect-uri` command.
pub async fn run_replace_redirect_uri(
    config_path: &str,
    old_pattern: &str,
    new_uri: &str,
    dry_run: bool,
) -> anyhow::Result<()> {
    let client = super::connect(config_path).await?;
    let clients = client.list_clients().await?;

    println!("Searching for redirect URIs containing '{old_pattern}'");
    println!("Replacing with '{new_uri}'");
    println!();

    let mut planned: Vec<(&ClientRepresentation, Vec<String>)> = Vec::new();
    for c in &clients {
        if let Some(new_uris) = replace_matching_uris(&c.redirect_uris, old_pattern, new_uri) {
            println!("{}", c.client_id);
            println!("  current: {:?}", c.redirect_uris);
            println!("  becomes: {:?}", new_uris);
            planned.push((c, new_uris));
        }
    }

    if planned.is_empty() {
        println!("No clients have redirect URIs containing '{old_pattern}'");
        return Ok(());
    }

    if dry_run {
        println!();
        println!("This was a dry run. No changes were made to the realm.");
        return Ok(());
    }

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for (c, new_uris) in planned {
        let Some(internal_id) = c.id.as_deref() else {
            println!("failed to update '{}': client has no internal id", c.client_id);
            failed += 1;
            continue;
        };
        match client.update_client_redirect_uris(internal_id, &new_uris).await {
            Ok(()) => {
                println!("updated {}", c.client_id);
                succeeded += 1;
            }
            Err(e) => {
                println!("failed to update '{}': {e}", c.client_id);
                failed += 1;
            }
        }
    }

    println!();
    println!("Summary: {succeeded} succeeded, {failed} failed");
    if failed > 0 {
        anyhow::bail!("{failed} client update(s) failed");
    }

    Ok(())
}

/// A client carrying an audience mapper.
struct AudienceMatch {
    client_id: String,
    audience: String,
    audience_type: &'static str,
}

async fn find_clients_with_audience(
    client: &KeycloakAdminClient,
    audience_filter: Option<&str>,
) -> anyhow::Result<Vec<AudienceMatch>> {
    let clients = client.list_clients().await?;
    let mut matches = Vec::new();

    for c in &clients {
        let Some(internal_id) = c.id.as_deref() else {
            continue;
        };

        // Skip clients whose mappers we cannot read.
        let mappers = match client.list_protocol_mappers(internal_id).await {
            Ok(mappers) => mappers,
            Err(e) => {
                warn!(client_id = %c.client_id, error = %e, "could not read protocol mappers");
                continue;
            }
        };

        for mapper in &mappers {
            if mapper.protocol_mapper != AUDIENCE_MAPPER_TYPE {
                continue;
            }
            let Some((audience, audience_type)) = mapper_audience(mapper) else {
                continue;
            };
            if audience_filter.is_none() || audience_filter == Some(audience.as_str()) {
                matches.push(AudienceMatch {
                    client_id: c.client_id.clone(),
                    audience,
                    audience_type,
                });
            }
        }
    }

    Ok(matches)
}

async fn update_client_audience(
    client: &KeycloakAdminClient,
    clients: &[ClientRepresentation],
    client_id: &str,
    audience: &str,
) -> anyhow::Result<bool> {
    let target = clients
        .iter()
        .find(|c| c.client_id == client_id)
        .ok_or_else(|| anyhow::anyhow!("client '{client_id}' not found"))?;
    let internal_id = target
        .id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("client '{client_id}' has no internal id"))?;

    let mappers = client.list_protocol_mappers(internal_id).await?;
    let existing = mappers
        .iter()
        .find(|m| m.protocol_mapper == AUDIENCE_MAPPER_TYPE);

    match existing {
        Some(mapper) => {
            let mapper_id = mapper
                .id
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("audience mapper has no id"))?;
            let mut updated = mapper.clone();
            retarget_audience_config(&mut updated.config, audience);
            client
                .update_protocol_mapper(internal_id, mapper_id, &updated)
                .await?;
            Ok(false)
        }
        None => {
            let mapper = new_audience_mapper(audience);
            client.create_protocol_mapper(internal_id, &mapper).await?;
            Ok(true)
        }
    }
}

/// The audience a mapper points at, preferring the custom field.
fn mapper_audience(mapper: &ProtocolMapper) -> Option<(String, &'static str)> {
    if let Some(custom) = mapper.config.get(CUSTOM_AUDIENCE_KEY) {
        if !custom.is_empty() {
            return Some((custom.clone(), "custom"));
        }
    }
    if let Some(client_aud) = mapper.config.get(CLIENT_AUDIENCE_KEY) {
        if !client_aud.is_empty() {
            return Some((client_aud.clone(), "client"));
        }
    }
    None
}

/// Switch a mapper config to a custom audience and enable the token claims.
fn retarget_audience_config(config: &mut HashMap<String, String>, audience: &str) {
    config.remove(CLIENT_AUDIENCE_KEY);
    config.insert(CUSTOM_AUDIENCE_KEY.to_string(), audience.to_string());
    config.insert("access.token.claim".to_string(), "true".to_string());
    config.insert("id.token.claim".to_string(), "true".to_string());
    config.insert("introspection.token.claim".to_string(), "true".to_string());
}

fn new_audience_mapper(audience: &str) -> ProtocolMapper {
    let mut config = HashMap::new();
    retarget_audience_config(&mut config, audience);
    ProtocolMapper {
        id: None,
        name: DEFAULT_MAPPER_NAME.to_string(),
        protocol: "openid-connect".to_string(),
        protocol_mapper: AUDIENCE_MAPPER_TYPE.to_string(),
        config,
    }
}

/// Replace every redirect URI containing `pattern` with `new_uri`.
/// Returns None when nothing matches.
fn replace_matching_uris(uris: &[String], pattern: &str, new_uri: &str) -> Option<Vec<String>> {
    if !uris.iter().any(|uri| uri.contains(pattern)) {
        return None;
    }
    Some(
        uris.iter()
            .map(|uri| {
                if uri.contains(pattern) {
                    new_uri.to_string()
                } else {
                    uri.clone()
                }
            })
            .collect(),
    )
}
