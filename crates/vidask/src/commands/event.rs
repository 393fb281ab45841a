//! Relay browser lifecycle events

use libvidask_api::ApiClient;
use libvidask_core::session::BrowserEvent;
use libvidask_core::VidaskError;

use super::parse_video;
use crate::cli::{Cli, EventCommand};
use crate::output::{output_success, print_human};

pub async fn run(cli: &Cli, client: &ApiClient, cmd: EventCommand) -> Result<(), VidaskError> {
    let event = to_browser_event(cmd)?;
    let accepted = client.send_event(&event).await?;

    match &accepted.event {
        Some(name) => print_human(cli, &format!("Event accepted ({})", name)),
        None => print_human(cli, "Event accepted (no session change)"),
    }
    output_success(cli, accepted);
    Ok(())
}

fn to_browser_event(cmd: EventCommand) -> Result<BrowserEvent, VidaskError> {
    let event = match cmd {
        EventCommand::VideoLoaded { video, title } => BrowserEvent::VideoLoaded {
            video_id: parse_video(&video)?.to_string(),
            video_title: title,
        },
        EventCommand::TabUpdated { url, status } => BrowserEvent::TabUpdated {
            url,
            status: Some(status),
        },
        EventCommand::TabClosed { window_closing } => BrowserEvent::TabRemoved {
            is_window_closing: window_closing,
        },
        EventCommand::Suspend => BrowserEvent::Suspend,
        EventCommand::PageUnload { video } => BrowserEvent::PageUnload {
            video_id: parse_video(&video)?.to_string(),
        },
    };
    Ok(event)
}
