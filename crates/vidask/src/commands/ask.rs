//! Ask a question about a video

use libvidask_api::ApiClient;
use libvidask_core::{VidaskError, VideoContext};
use serde::Serialize;
use tracing::debug;

use super::parse_video;
use crate::cli::Cli;
use crate::output::{output_success, print_human};

#[derive(Serialize)]
struct AskOutput {
    video_id: String,
    title: String,
    query: String,
    response: String,
}

pub async fn run(
    cli: &Cli,
    client: &ApiClient,
    query: &str,
    video: &str,
    title: Option<String>,
) -> Result<(), VidaskError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(VidaskError::InvalidArgument("Please enter a query.".to_string()));
    }

    let video_id = parse_video(video)?;
    let context = VideoContext::new(video_id, title, None);
    debug!(video_id = %context.video_id, server = %client.base_url(), "Sending query");

    let response = client.ask(query, &context).await?;

    print_human(cli, &response);
    output_success(
        cli,
        AskOutput {
            video_id: context.video_id.to_string(),
            title: context.title,
            query: query.to_string(),
            response,
        },
    );
    Ok(())
}
