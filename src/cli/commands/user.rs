use clap::Subcommand;
use serde_json::json;

use crate::auth::Role;
use crate::cli::utils::{field, output_empty_collection, output_success, output_table};
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;
use crate::services::user_service::UserInput;
use crate::services::{KindergartenService, UserService};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List user accounts")]
    List,

    #[command(about = "Create a user account")]
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, help = "SuperAdmin, KindergartenAdmin or Teacher")]
        role: Role,
        #[arg(long, help = "Kindergarten subdomain (not used for SuperAdmin)")]
        kindergarten: Option<String>,
    },

    #[command(about = "Set a new password")]
    Passwd {
        #[arg(help = "Account email")]
        email: String,
        #[arg(help = "New password")]
        password: String,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await?;
    let users = UserService::new(pool.clone());

    match cmd {
        UserCommands::List => {
            let listing = users.list().await?;
            if listing.is_empty() {
                return output_empty_collection(&output_format, "users", "No users found");
            }
            let items = listing.iter().map(serde_json::to_value).collect::<Result<Vec<_>, _>>()?;
            output_table(
                &output_format,
                "users",
                &items,
                &[("ID", 6), ("EMAIL", 30), ("ROLE", 18), ("KINDERGARTEN", 24), ("ACTIVE", 6)],
                |u| {
                    vec![
                        field(u, "id"),
                        field(u, "email"),
                        field(u, "role"),
                        field(u, "kindergarten_name"),
                        field(u, "is_active"),
                    ]
                },
            )
        }
        UserCommands::Create { email, username, password, role, kindergarten } => {
            let kindergarten_id = match kindergarten {
                Some(subdomain) if !role.is_system() => {
                    let found = KindergartenService::new(pool)
                        .find_by_subdomain(&subdomain.to_ascii_lowercase())
                        .await?
                        .ok_or_else(|| anyhow::anyhow!("Kindergarten '{}' not found", subdomain))?;
                    Some(found.id)
                }
                _ => None,
            };
            let user = users
                .create(UserInput {
                    username,
                    email,
                    password: Some(password),
                    role,
                    kindergarten_id,
                    is_active: Some(true),
                })
                .await?;
            output_success(
                &output_format,
                &format!("Created {} account {}", user.role, user.email),
                Some(json!({ "user": user })),
            )
        }
        UserCommands::Passwd { email, password } => {
            let user = users.set_password(&email, &password).await?;
            output_success(&output_format, &format!("Password updated for {}", user.email), None)
        }
    }
}
