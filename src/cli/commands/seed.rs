use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;
use crate::services::seed;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let fixture = seed::load_fixture()?;
    let pool = DatabaseManager::pool().await?;
    let report = seed::run(pool, fixture).await?;

    let message = match (report.kindergarten_created, report.users_created.len()) {
        (false, 0) => "Sample data already present, nothing to do".to_string(),
        (created, users) => format!(
            "Seeded {}{} user account(s)",
            if created { "sample kindergarten and " } else { "" },
            users
        ),
    };

    if let OutputFormat::Text = output_format {
        for email in &report.users_skipped {
            println!("  skipped existing account {}", email);
        }
    }
    output_success(&output_format, &message, Some(json!({ "report": report })))
}
