//! Clear cached embeddings

use libvidask_api::ApiClient;
use libvidask_core::{ClearTarget, VidaskError};
use serde::Serialize;

use super::parse_video;
use crate::cli::Cli;
use crate::output::{describe, output_success, output_warning, print_human};

#[derive(Serialize)]
struct ClearOutput {
    target: String,
    cleared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn run(
    cli: &Cli,
    client: &ApiClient,
    video: Option<&str>,
    all: bool,
    strict: bool,
) -> Result<(), VidaskError> {
    let target = match (video, all) {
        (_, true) => ClearTarget::All,
        (Some(raw), false) => ClearTarget::Video(parse_video(raw)?),
        (None, false) => {
            return Err(VidaskError::InvalidArgument(
                "Either --video or --all is required.".to_string(),
            ))
        }
    };

    match client.clear(&target).await {
        Ok(response) => {
            print_human(cli, &response);
            output_success(
                cli,
                ClearOutput {
                    target: target.to_string(),
                    cleared: true,
                    response: Some(response),
                    error: None,
                },
            );
            Ok(())
        }
        Err(e) => {
            let err = VidaskError::from(e);
            if strict {
                return Err(err);
            }
            output_warning(cli, &format!("could not clear cache for {}: {}", target, describe(&err)));
            output_success(
                cli,
                ClearOutput {
                    target: target.to_string(),
                    cleared: false,
                    response: None,
                    error: Some(describe(&err)),
                },
            );
            Ok(())
        }
    }
}
