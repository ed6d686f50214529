mod config;
mod error;
mod event;
mod github;
mod logging;
mod model;
mod sync;
mod util;

use std::process::ExitCode;

use anyhow::Result;
use tracing::{debug, info};

use config::Settings;
use github::graphql::GraphqlClient;
use sync::SyncReport;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    match run().await {
        Ok(report) => {
            info!(
                item_id = %report.item_id,
                updated_fields = report.updated_fields,
                "project item synced"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", util::workflow::error_command(&format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<SyncReport> {
    let settings = Settings::from_env()?;
    debug!(?settings, "loaded settings");

    let payload = event::load_payload(&settings.event_path)?;
    let content = payload.triggering_content(&settings.event_name)?;
    info!("This issue URL is {}", content.html_url);

    let api = GraphqlClient::new(settings.api_url.clone(), settings.token.clone());
    let target = settings.target(content.number);
    let report = sync::run(&api, &target, &settings.field_option_values).await?;

    Ok(report)
}
