use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{field, output_empty_collection, output_success, output_table};
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;
use crate::services::kindergarten_service::KindergartenInput;
use crate::services::KindergartenService;

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List kindergartens")]
    List {
        #[arg(long, help = "Include soft-deleted kindergartens")]
        all: bool,
    },

    #[command(about = "Create a kindergarten with default site content")]
    Create {
        #[arg(help = "Display name")]
        name: String,
        #[arg(help = "Subdomain (letters, digits, hyphens)")]
        subdomain: String,
    },

    #[command(about = "Deactivate a kindergarten; its site stops resolving")]
    Deactivate {
        #[arg(help = "Subdomain")]
        subdomain: String,
    },
}

pub async fn handle(cmd: TenantCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = KindergartenService::new(DatabaseManager::pool().await?);

    match cmd {
        TenantCommands::List { all } => {
            let kindergartens = service.list(all).await?;
            if kindergartens.is_empty() {
                return output_empty_collection(&output_format, "kindergartens", "No kindergartens found");
            }
            let items = kindergartens
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?;
            output_table(
                &output_format,
                "kindergartens",
                &items,
                &[("ID", 6), ("SUBDOMAIN", 20), ("NAME", 30), ("ACTIVE", 8), ("TRASHED", 8)],
                |k| {
                    vec![
                        field(k, "id"),
                        field(k, "subdomain"),
                        field(k, "name"),
                        field(k, "is_active"),
                        if k["trashed_at"].is_null() { "no".to_string() } else { "yes".to_string() },
                    ]
                },
            )
        }
        TenantCommands::Create { name, subdomain } => {
            let kindergarten = service
                .create(KindergartenInput { name, subdomain, is_active: Some(true) })
                .await?;
            output_success(
                &output_format,
                &format!("Created kindergarten '{}' ({})", kindergarten.subdomain, kindergarten.id),
                Some(json!({ "kindergarten": kindergarten })),
            )
        }
        TenantCommands::Deactivate { subdomain } => {
            let kindergarten = service
                .find_by_subdomain(&subdomain.to_ascii_lowercase())
                .await?
                .ok_or_else(|| anyhow::anyhow!("Kindergarten '{}' not found", subdomain))?;
            let kindergarten = service.set_active(kindergarten.id, false).await?;
            output_success(
                &output_format,
                &format!("Deactivated kindergarten '{}'", kindergarten.subdomain),
                Some(json!({ "kindergarten": kindergarten })),
            )
        }
    }
}
