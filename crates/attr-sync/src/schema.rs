//! User-profile schema management.
//!
//! Derived attributes only show up in the account console and the admin
//! user-detail view once the realm's user-profile schema declares them,
//! so apply mode ensures the declarations exist before any user mutation.

use keywarden_admin::client::KeycloakAdminClient;
use keywarden_admin::models::{ProfileAttribute, ProfilePermissions};
use keywarden_core::error::Result;
use tracing::info;

use crate::pattern::{CLASSIFICATION_ATTR, NATIONALITY_ATTR, NEED_TO_KNOW_ATTR};

/// The schema fields the sync owns, with their display names.
pub const REQUIRED_PROFILE_FIELDS: [(&str, &str); 3] = [
    (CLASSIFICATION_ATTR, "Classification"),
    (NATIONALITY_ATTR, "Nationality"),
    (NEED_TO_KNOW_ATTR, "Need To Know"),
];

/// Ensure the three owned schema fields exist, returning the names actually
/// created this run.
///
/// Idempotent: when every field is already declared, no write is issued.
/// A failing creation propagates immediately so no user mutation happens
/// against a half-declared schema.
pub async fn ensure_profile_fields(client: &KeycloakAdminClient) -> Result<Vec<String>> {
    let mut profile = client.get_user_profile().await?;

    let mut created = Vec::new();
    for (name, display_name) in REQUIRED_PROFILE_FIELDS {
        if profile.attributes.iter().any(|attr| attr.name == name) {
            continue;
        }

        profile.attributes.push(new_profile_attribute(name, display_name));
        client.put_user_profile(&profile).await?;
        info!(attribute = name, "created user profile attribute");
        created.push(name.to_string());
    }

    Ok(created)
}

fn new_profile_attribute(name: &str, display_name: &str) -> ProfileAttribute {
    ProfileAttribute {
        name: name.to_string(),
        display_name: Some(display_name.to_string()),
        multivalued: false,
        permissions: Some(ProfilePermissions {
            view: vec!["admin".to_string(), "user".to_string()],
            edit: vec!["admin".to_string()],
        }),
        extra: serde_json::Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, KeycloakAdminClient) {
        let server = MockServer::start().await;
        let client = KeycloakAdminClient::new("https://sso.example.com", "demo", "tok")
            .with_base_url(&server.uri());
        (server, client)
    }

    fn profile_with(names: &[&str]) -> serde_json::Value {
        let attrs: Vec<serde_json::Value> = names
            .iter()
            .map(|n| serde_json::json!({"name": n}))
            .collect();
        serde_json::json!({"attributes": attrs})
    }

    #[tokio::test]
    async fn all_fields_present_issues_no_writes() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/users/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_with(&[
                "email",
                "classification",
                "nationality",
                "needToKnow",
            ])))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/demo/users/profile"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let created = ensure_profile_fields(&client).await.unwrap();
        assert!(created.is_empty());
    }

    #[tokio::test]
    async fn missing_fields_are_created_in_order() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/users/profile"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(profile_with(&["email", "nationality"])),
            )
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/demo/users/profile"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let created = ensure_profile_fields(&client).await.unwrap();
        assert_eq!(created, vec!["classification", "needToKnow"]);
    }

    #[tokio::test]
    async fn created_field_carries_display_name_and_permissions() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/users/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_with(&[
                "email",
                "nationality",
                "needToKnow",
            ])))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/demo/users/profile"))
            .and(body_partial_json(serde_json::json!({
                "attributes": [
                    {"name": "email"},
                    {"name": "nationality"},
                    {"name": "needToKnow"},
                    {
                        "name": "classification",
                        "displayName": "Classification",
                        "permissions": {"view": ["admin", "user"], "edit": ["admin"]}
                    }
                ]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let created = ensure_profile_fields(&client).await.unwrap();
        assert_eq!(created, vec!["classification"]);
    }

    #[tokio::test]
    async fn creation_failure_aborts() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/users/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile_with(&["email"])))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/admin/realms/demo/users/profile"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let result = ensure_profile_fields(&client).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("403"));
    }

    #[tokio::test]
    async fn schema_read_failure_aborts() {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/admin/realms/demo/users/profile"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = ensure_profile_fields(&client).await;
        assert!(result.is_err());
    }
}
