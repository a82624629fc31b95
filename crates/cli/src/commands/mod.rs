use std::path::Path;

use keywarden_admin::auth::{acquire_token, AdminCredentials};
use keywarden_admin::client::KeycloakAdminClient;
use keywarden_core::config::KeywardenConfig;

pub mod clients;
pub mod sync_attrs;
pub mod users;

/// Load the config, acquire an admin token, and build the admin client.
pub(crate) async fn connect(config_path: &str) -> anyhow::Result<KeycloakAdminClient> {
    let config = KeywardenConfig::load(Path::new(config_path))?;
    config.validate()?;

    let credentials = AdminCredentials {
        username: config.auth.username.clone(),
        password: config.auth.password.clone(),
        client_id: config.auth.client_id.clone(),
        client_secret: config.auth.client_secret.clone(),
    };

    let http = reqwest::Client::new();
    let token = acquire_token(
        &http,
        &config.keywarden.server_url,
        &config.keywarden.realm,
        &credentials,
    )
    .await?;

    Ok(KeycloakAdminClient::new(
        &config.keywarden.server_url,
        &config.keywarden.realm,
        &token,
    ))
}
