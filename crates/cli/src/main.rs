use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::clients::RedirectUriMode;

#[derive(Parser)]
#[command(name = "keywarden", about = "Keycloak realm administration toolkit", version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "keywarden.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Derive classification attributes from username patterns
    SyncUserAttributes {
        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
    },
    /// List all clients in the realm
    ListClients,
    /// Show a client's representation and protocol mappers
    ShowClient {
        /// Client ID (the OAuth clientId, not the internal UUID)
        client_id: String,
    },
    /// Find clients with an audience mapper
    FindAudience {
        /// Only show clients whose audience equals this value
        #[arg(long)]
        audience: Option<String>,
    },
    /// Point clients' audience mappers at a new audience value
    UpdateAudience {
        /// Comma-separated client IDs
        #[arg(long, value_delimiter = ',', required = true)]
        client_ids: Vec<String>,
        /// New audience value
        #[arg(long)]
        audience: String,
    },
    /// List all clients with their redirect URIs
    ListRedirectUris {
        /// Only show clients with a redirect URI containing this substring
        #[arg(long)]
        filter: Option<String>,
    },
    /// Edit redirect URIs for specific clients
    UpdateRedirectUris {
        /// Comma-separated client IDs
        #[arg(long, value_delimiter = ',', required = true)]
        client_ids: Vec<String>,
        /// Comma-separated redirect URIs
        #[arg(long, value_delimiter = ',', required = true)]
        uris: Vec<String>,
        /// How the URIs combine with each client's current list
        #[arg(long, value_enum, default_value = "replace")]
        mode: RedirectUriMode,
    },
    /// Replace redirect URIs containing a pattern across all clients
    ReplaceRedirectUri {
        /// Substring to search for in redirect URIs
        #[arg(long)]
        old_pattern: String,
        /// URI that replaces every matching entry
        #[arg(long)]
        new_uri: String,
        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
    },
    /// List all users in the realm
    ListUsers {
        /// Filter users by username substring (case-insensitive)
        #[arg(long)]
        filter: Option<String>,
    },
    /// Reset passwords for multiple users
    ResetPasswords {
        /// Comma-separated usernames
        #[arg(long, value_delimiter = ',', required = true)]
        usernames: Vec<String>,
        /// New password to set
        #[arg(long)]
        password: String,
        /// Set as permanent password (default: temporary)
        #[arg(long)]
        permanent: bool,
        /// Confirm the reset; without this flag nothing is changed
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::SyncUserAttributes { dry_run } => {
            commands::sync_attrs::run(&cli.config, dry_run).await?;
        }
        Commands::ListClients => {
            commands::clients::run_list(&cli.config).await?;
        }
        Commands::ShowClient { client_id } => {
            commands::clients::run_show(&cli.config, &client_id).await?;
        }
        Commands::FindAudience { audience } => {
            commands::clients::run_find_audience(&cli.config, audience.as_deref()).await?;
        }
        Commands::UpdateAudience {
            client_ids,
            audience,
        } => {
            commands::clients::run_update_audience(&cli.config, &client_ids, &audience).await?;
        }
        Commands::ListRedirectUris { filter } => {
            commands::clients::run_list_redirect_uris(&cli.config, filter.as_deref()).await?;
        }
        Commands::UpdateRedirectUris {
            client_ids,
            uris,
            mode,
        } => {
            commands::clients::run_update_redirect_uris(&cli.config, &client_ids, &uris, mode)
                .await?;
        }
        Commands::ReplaceRedirectUri {
            old_pattern,
            new_uri,
            dry_run,
        } => {
            commands::clients::run_replace_redirect_uri(
                &cli.config,
                &old_pattern,
                &new_uri,
                dry_run,
            )
            .await?;
        }
        Commands::ListUsers { filter } => {
            commands::users::run_list(&cli.config, filter.as_deref()).await?;
        }
        Commands::ResetPasswords {
            usernames,
            password,
            permanent,
            yes,
        } => {
            commands::users::run_reset_passwords(&cli.config, &usernames, &password, permanent, yes)
                .await?;
        }
    }

    Ok(())
}
