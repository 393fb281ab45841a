//! Show tracker state

use libvidask_api::ApiClient;
use libvidask_core::VidaskError;

use crate::cli::Cli;
use crate::output::{output_success, print_human};

pub async fn run(cli: &Cli, client: &ApiClient) -> Result<(), VidaskError> {
    let status = client.session().await?;

    let current = match &status.session.current_video_id {
        Some(id) => id.to_string(),
        None => "(none)".to_string(),
    };
    print_human(cli, &format!("Current video: {}", current));
    if let Some(updated_at) = status.session.updated_at {
        print_human(cli, &format!("Updated at: {}", updated_at.to_rfc3339()));
    }
    print_human(
        cli,
        &format!(
            "Invalidations: {} emitted, {} dispatched, {} succeeded, {} failed",
            status.session.invalidations_emitted,
            status.invalidations.dispatched,
            status.invalidations.succeeded,
            status.invalidations.failed
        ),
    );

    output_success(cli, status);
    Ok(())
}
