use std::collections::HashMap;

use tracing::info;

/// Run the `list-users` command.
pub async fn run_list(config_path: &str, filter: Option<&str>) -> anyhow::Result<()> {
    let client = super::connect(config_path).await?;
    let mut users = client.list_users().await?;

    if let Some(filter) = filter {
        let needle = filter.to_lowercase();
        users.retain(|u| u.username.to_lowercase().contains(&needle));
    }

    println!("Found {} users:", users.len());
    println!();
    println!("{:<30} {:<40} {}", "Username", "Email", "ID");
    println!("{}", "-".repeat(100));
    for user in &users {
        println!(
            "{:<30} {:<40} {}",
            user.username,
            user.email.as_deref().unwrap_or(""),
            user.id.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

/// Run the `reset-passwords` command.
pub async fn run_reset_passwords(
    config_path: &str,
    usernames: &[String],
    password: &str,
    permanent: bool,
    yes: bool,
) -> anyhow::Result<()> {
    println!(
        "About to reset passwords for {} users ({})",
        usernames.len(),
        if permanent {
            "permanent"
        } else {
            "temporary, users must change on first login"
        }
    );

    if !yes {
        anyhow::bail!("refusing to reset passwords without --yes");
    }

    let client = super::connect(config_path).await?;
    let users = client.list_users().await?;
    let by_username: HashMap<&str, &str> = users
        .iter()
        .filter_map(|u| Some((u.username.as_str(), u.id.as_deref()?)))
        .collect();

    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for username in usernames {
        let Some(user_id) = by_username.get(username.as_str()) else {
            println!("user '{username}' not found");
            failed += 1;
            continue;
        };

        match client.reset_password(user_id, password, !permanent).await {
            Ok(()) => {
                info!(username = %username, permanent, "password reset");
                println!("password reset for '{username}'");
                succeeded += 1;
            }
            Err(e) => {
                println!("failed to reset password for '{username}': {e}");
                failed += 1;
            }
        }
    }

    println!();
    println!("Summary: {succeeded} succeeded, {failed} failed");
    if failed > 0 {
        anyhow::bail!("{failed} password reset(s) failed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reset_passwords_requires_confirmation() {
        let result = run_reset_passwords(
            "/nonexistent/keywarden.toml",
            &["alice".to_string()],
            "NewPass1!",
            false,
            false,
        )
        .await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("--yes"));
    }

    #[tokio::test]
    async fn list_users_requires_config_file() {
        let result = run_list("/nonexistent/keywarden.toml", None).await;
        assert!(result.is_err());
    }
}
