//! Typed reqwest wrapper for the Keycloak admin REST API.

use std::collections::HashMap;

use keywarden_core::error::{KeywardenError, Result};
use reqwest::StatusCode;

use crate::models::{ClientRepresentation, ProtocolMapper, UserProfileConfig, UserRepresentation};

/// HTTP client for realm admin operations.
pub struct KeycloakAdminClient {
    http: reqwest::Client,
    base_url: String,
    realm: String,
    auth_token: String,
}

impl KeycloakAdminClient {
    /// Create a new client for the given server, realm, and bearer token.
    pub fn new(base_url: &str, realm: &str, auth_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            realm: realm.to_string(),
            auth_token: auth_token.to_string(),
        }
    }

    /// Override the base URL (for testing with wiremock).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Return the realm this client administers.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    fn admin_url(&self, suffix: &str) -> String {
        format!("{}/admin/realms/{}{suffix}", self.base_url, self.realm)
    }

    fn users_url(&self) -> String {
        self.admin_url("/users")
    }

    fn user_url(&self, user_id: &str) -> String {
        self.admin_url(&format!("/users/{user_id}"))
    }

    fn profile_url(&self) -> String {
        self.admin_url("/users/profile")
    }

    fn clients_url(&self) -> String {
        self.admin_url("/clients")
    }

    fn mappers_url(&self, client_internal_id: &str) -> String {
        self.admin_url(&format!("/clients/{client_internal_id}/protocol-mappers/models"))
    }

    /// List all users in the realm.
    pub async fn list_users(&self) -> Result<Vec<UserRepresentation>> {
        let resp = self
            .http
            .get(self.users_url())
            .bearer_auth(&self.auth_token)
            .send()
            .await
            .map_err(|e| KeywardenError::Admin(format!("list users request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(KeywardenError::Admin(format!(
                "list users failed ({status}): {body}"
            )));
        }

        resp.json::<Vec<UserRepresentation>>()
            .await
            .map_err(|e| KeywardenError::Admin(format!("list users parse failed: {e}")))
    }

    /// Get a single user by internal id. Returns None if 404.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserRepresentation>> {
        let resp = self
            .http
            .get(self.user_url(user_id))
            .bearer_auth(&self.auth_token)
            .send()
            .await
            .map_err(|e| KeywardenError::Admin(format!("get user request failed: {e}")))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(KeywardenError::Admin(format!(
                "get user failed ({status}): {body}"
            )));
        }

        let user = resp
            .json::<UserRepresentation>()
            .await
            .map_err(|e| KeywardenError::Admin(format!("get user parse failed: {e}")))?;
        Ok(Some(user))
    }

    /// Replace a user's custom attribute map.
    ///
    /// The payload carries only `attributes`; Keycloak leaves the rest of
    /// the user representation untouched.
    pub async fn update_user_attributes(
        &self,
        user_id: &str,
        attributes: &HashMap<String, Vec<String>>,
    ) -> Result<()> {
        let body = serde_json::json!({ "attributes": attributes });
        let resp = self
            .http
            .put(self.user_url(user_id))
            .bearer_auth(&self.auth_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| KeywardenError::Admin(format!("update user request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(KeywardenError::Admin(format!(
                "update user failed ({status}): {body}"
            )));
        }

        Ok(())
    }

    /// Set a user's password credential.
    pub async fn reset_password(
        &self,
        user_id: &str,
        password: &str,
        temporary: bool,
    ) -> Result<()> {
        let body = serde_json::json!({
            "type": "password",
            "value": password,
            "temporary": temporary,
        });
        let url = self.admin_url(&format!("/users/{user_id}/reset-password"));
        let resp = self
            .http
            .put(&url)
            .bearer_auth(&self.auth_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| KeywardenError::Admin(format!("reset password request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(KeywardenError::Admin(format!(
                "reset password failed ({status}): {body}"
            )));
        }

        Ok(())
    }

    /// Read the realm's user-profile schema configuration.
    pub async fn get_user_profile(&self) -> Result<UserProfileConfig> {
        let resp = self
            .http
            .get(self.profile_url())
            .bearer_auth(&self.auth_token)
            .send()
            .await
            .map_err(|e| KeywardenError::Admin(format!("get user profile request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(KeywardenError::Admin(format!(
                "get user profile failed ({status}): {body}"
            )));
        }

        resp.json::<UserProfileConfig>()
            .await
            .map_err(|e| KeywardenError::Admin(format!("get user profile parse failed: {e}")))
    }

    /// Write back the realm's user-profile schema configuration.
    pub async fn put_user_profile(&self, profile: &UserProfileConfig) -> Result<()> {
        let resp = self
            .http
            .put(self.profile_url())
            .bearer_auth(&self.auth_token)
            .json(profile)
            .send()
            .await
            .map_err(|e| KeywardenError::Admin(format!("put user profile request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(KeywardenError::Admin(format!(
                "put user profile failed ({status}): {body}"
            )));
        }

        Ok(())
    }

    /// List all clients in the realm.
    pub async fn list_clients(&self) -> Result<Vec<ClientRepresentation>> {
        let resp = self
            .http
            .get(self.clients_url())
            .bearer_auth(&self.auth_token)
            .send()
            .await
            .map_err(|e| KeywardenError::Admin(format!("list clients request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(KeywardenError::Admin(format!(
                "list clients failed ({status}): {body}"
            )));
        }

        resp.json::<Vec<ClientRepresentation>>()
            .await
            .map_err(|e| KeywardenError::Admin(format!("list clients parse failed: {e}")))
    }

    /// Replace a client's redirect URIs.
    pub async fn update_client_redirect_uris(
        &self,
        client_internal_id: &str,
        redirect_uris: &[String],
    ) -> Result<()> {
        let body = serde_json::json!({ "redirectUris": redirect_uris });
        let url = self.admin_url(&format!("/clients/{client_internal_id}"));
        let resp = self
            .http
            .put(&url)
            .bearer_auth(&self.auth_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| KeywardenError::Admin(format!("update client request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(KeywardenError::Admin(format!(
                "update client failed ({status}): {body}"
            )));
        }

        Ok(())
    }

    /// List the protocol mappers attached to a client.
    pub async fn list_protocol_mappers(
        &self,
        client_internal_id: &str,
    ) -> Result<Vec<ProtocolMapper>> {
        let resp = self
            .http
            .get(self.mappers_url(client_internal_id))
            .bearer_auth(&self.auth_token)
            .send()
            .await
            .map_err(|e| KeywardenError::Admin(format!("list mappers request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(KeywardenError::Admin(format!(
                "list mappers failed ({status}): {body}"
            )));
        }

        resp.json::<Vec<ProtocolMapper>>()
            .await
            .map_err(|e| KeywardenError::Admin(format!("list mappers parse failed: {e}")))
    }

    /// Attach a new protocol mapper to a client.
    pub async fn create_protocol_mapper(
        &self,
        client_internal_id: &str,
        mapper: &ProtocolMapper,
    ) -> Result<()> {
        let resp = self
            .http
            .post(self.mappers_url(client_internal_id))
            .bearer_auth(&self.auth_token)
            .json(mapper)
            .send()
            .await
            .map_err(|e| KeywardenError::Admin(format!("create mapper request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(KeywardenError::Admin(format!(
                "create mapper failed ({status}): {body}"
            )));
        }

        Ok(())
    }

    /// Update an existing protocol mapper in place.
    pub async fn update_protocol_mapper(
        &self,
        client_internal_id: &str,
        mapper_id: &str,
        mapper: &ProtocolMapper,
    ) -> Result<()> {
        let url = format!("{}/{mapper_id}", self.mappers_url(client_internal_id));
        let resp = self
            .http
            .put(&url)
            .bearer_auth(&self.auth_token)
            .json(mapper)
            .send()
            .await
            .map_err(|e| KeywardenError::Admin(format!("update mapper request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(KeywardenError::Admin(format!(
                "update mapper failed ({status}): {body}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, KeycloakAdminClient) {
        let server = MockServer::start().await;
        let client =
            KeycloakAdminClient::new("https://sso.example.com", "demo", "test-token")
                .with_base_url(&server.uri());
        (server, client)
    }

    #[tokio::test]
    async fn list_users_success() {
        let (server, client) = setup().await;

        let response_body = serde_json::json!([
            {"id": "u-1", "username": "secret-usa-aaa", "attributes": {"nationality": ["USA"]}},
            {"id": "u-2", "username": "alice"}
        ]);

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/users"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let users = client.list_users().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "secret-usa-aaa");
        assert!(users[1].attributes.is_none());
    }

    #[tokio::test]
    async fn list_users_server_error() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/users"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let result = client.list_users().await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("500"));
    }

    #[tokio::test]
    async fn get_user_found() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/users/u-1"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "u-1",
                "username": "secret-usa-aaa",
                "attributes": {"classification": ["Secret"]}
            })))
            .mount(&server)
            .await;

        let user = client.get_user("u-1").await.unwrap().unwrap();
        assert_eq!(user.username, "secret-usa-aaa");
    }

    #[tokio::test]
    async fn get_user_not_found() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/users/nobody"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let user = client.get_user("nobody").await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn update_user_attributes_sends_attributes_payload() {
        let (server, client) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/demo/users/u-1"))
            .and(bearer_token("test-token"))
            .and(body_partial_json(serde_json::json!({
                "attributes": {"classification": ["Secret"]}
            })))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let mut attrs = HashMap::new();
        attrs.insert("classification".to_string(), vec!["Secret".to_string()]);
        client.update_user_attributes("u-1", &attrs).await.unwrap();
    }

    #[tokio::test]
    async fn update_user_attributes_forbidden() {
        let (server, client) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/demo/users/u-1"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let result = client.update_user_attributes("u-1", &HashMap::new()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("403"));
    }

    #[tokio::test]
    async fn reset_password_temporary() {
        let (server, client) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/demo/users/u-1/reset-password"))
            .and(body_partial_json(serde_json::json!({
                "type": "password",
                "value": "NewPass1!",
                "temporary": true
            })))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client.reset_password("u-1", "NewPass1!", true).await.unwrap();
    }

    #[tokio::test]
    async fn get_user_profile_success() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/users/profile"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "attributes": [{"name": "email"}],
                "groups": []
            })))
            .mount(&server)
            .await;

        let profile = client.get_user_profile().await.unwrap();
        assert_eq!(profile.attributes.len(), 1);
        assert_eq!(profile.attributes[0].name, "email");
    }

    #[tokio::test]
    async fn put_user_profile_round_trips_extra_fields() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/users/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "attributes": [{"name": "email"}],
                "unmanagedAttributePolicy": "ENABLED"
            })))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/demo/users/profile"))
            .and(body_partial_json(serde_json::json!({
                "unmanagedAttributePolicy": "ENABLED"
            })))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let profile = client.get_user_profile().await.unwrap();
        client.put_user_profile(&profile).await.unwrap();
    }

    #[tokio::test]
    async fn list_clients_success() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/clients"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "c-1", "clientId": "portal", "redirectUris": ["https://portal.example.com/*"]},
                {"id": "c-2", "clientId": "api"}
            ])))
            .mount(&server)
            .await;

        let clients = client.list_clients().await.unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].redirect_uris.len(), 1);
        assert!(clients[1].redirect_uris.is_empty());
    }

    #[tokio::test]
    async fn update_client_redirect_uris_success() {
        let (server, client) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/demo/clients/c-1"))
            .and(body_partial_json(serde_json::json!({
                "redirectUris": ["https://new.example.com/callback"]
            })))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client
            .update_client_redirect_uris("c-1", &["https://new.example.com/callback".to_string()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_protocol_mappers_success() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/clients/c-1/protocol-mappers/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": "m-1",
                "name": "audience-mapper",
                "protocol": "openid-connect",
                "protocolMapper": "oidc-audience-mapper",
                "config": {"included.custom.audience": "api"}
            }])))
            .mount(&server)
            .await;

        let mappers = client.list_protocol_mappers("c-1").await.unwrap();
        assert_eq!(mappers.len(), 1);
        assert_eq!(mappers[0].protocol_mapper, "oidc-audience-mapper");
    }

    #[tokio::test]
    async fn create_protocol_mapper_success() {
        let (server, client) = setup().await;

        Mock::given(method("POST"))
            .and(path("/admin/realms/demo/clients/c-1/protocol-mappers/models"))
            .and(body_partial_json(serde_json::json!({
                "name": "audience-mapper",
                "protocolMapper": "oidc-audience-mapper"
            })))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let mapper = ProtocolMapper {
            id: None,
            name: "audience-mapper".to_string(),
            protocol: "openid-connect".to_string(),
            protocol_mapper: "oidc-audience-mapper".to_string(),
            config: HashMap::new(),
        };
        client.create_protocol_mapper("c-1", &mapper).await.unwrap();
    }

    #[tokio::test]
    async fn update_protocol_mapper_success() {
        let (server, client) = setup().await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/demo/clients/c-1/protocol-mappers/models/m-1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let mapper = ProtocolMapper {
            id: Some("m-1".to_string()),
            name: "audience-mapper".to_string(),
            protocol: "openid-connect".to_string(),
            protocol_mapper: "oidc-audience-mapper".to_string(),
            config: HashMap::new(),
        };
        client
            .update_protocol_mapper("c-1", "m-1", &mapper)
            .await
            .unwrap();
    }
}
