//! Admin token acquisition via the OAuth 2.0 password grant.
//!
//! One token is acquired per run and attached to every admin call.
//! Mid-run refresh is deliberately not handled; runs are short.

use keywarden_core::error::{KeywardenError, Result};
use serde::Deserialize;
use tracing::debug;

/// OAuth token response from the realm token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Credentials for the admin token request.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: Option<String>,
}

/// Acquire a bearer token for the admin REST API.
///
/// Issues a password grant against
/// `{base_url}/realms/{realm}/protocol/openid-connect/token`.
pub async fn acquire_token(
    http: &reqwest::Client,
    base_url: &str,
    realm: &str,
    credentials: &AdminCredentials,
) -> Result<String> {
    let token_url = format!(
        "{}/realms/{realm}/protocol/openid-connect/token",
        base_url.trim_end_matches('/')
    );
    debug!(url = %token_url, client_id = %credentials.client_id, "requesting admin token");

    let mut form = vec![
        ("grant_type", "password"),
        ("client_id", credentials.client_id.as_str()),
        ("username", credentials.username.as_str()),
        ("password", credentials.password.as_str()),
    ];
    if let Some(ref secret) = credentials.client_secret {
        form.push(("client_secret", secret.as_str()));
    }

    let response = http
        .post(&token_url)
        .form(&form)
        .send()
        .await
        .map_err(|e| KeywardenError::Auth(format!("token request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(KeywardenError::Auth(format!(
            "token request failed ({status}): {body}"
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| KeywardenError::Auth(format!("token response parse failed: {e}")))?;

    debug!("admin token acquired");
    Ok(token.access_token)
}
