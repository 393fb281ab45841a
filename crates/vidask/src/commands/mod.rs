pub mod ask;
pub mod clear;
pub mod event;
pub mod session;

use libvidask_core::{VidaskError, VideoId};

/// Accept either a bare video id or a YouTube watch URL
pub(crate) fn parse_video(raw: &str) -> Result<VideoId, VidaskError> {
    VideoId::from_id_or_url(raw).map_err(|e| VidaskError::InvalidArgument(e.to_string()))
}
