use clap::{Parser, Subcommand};
use libvidask_api::DEFAULT_SERVER_URL;

#[derive(Parser)]
#[command(name = "vidask", about = "Ask questions about YouTube videos", version)]
pub struct Cli {
    /// Daemon base URL
    #[arg(long, global = true, env = "VIDASK_SERVER", default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress human-readable output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Log requests to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ask a question about a video
    Ask {
        /// The question
        query: String,

        /// Video ID or watch URL
        #[arg(long, allow_hyphen_values = true)]
        video: String,

        /// Video title, if known
        #[arg(long)]
        title: Option<String>,
    },

    /// Clear cached embeddings for one video or all videos
    Clear {
        /// Video ID or watch URL
        #[arg(long, required_unless_present = "all", conflicts_with = "all", allow_hyphen_values = true)]
        video: Option<String>,

        /// Clear every cached video
        #[arg(long)]
        all: bool,

        /// Exit with an error if the clear fails
        #[arg(long)]
        strict: bool,
    },

    /// Relay a browser lifecycle event to the daemon
    Event {
        #[command(subcommand)]
        cmd: EventCommand,
    },

    /// Show the tracked video and invalidation counters
    Session,
}

#[derive(Subcommand, Clone)]
pub enum EventCommand {
    /// A watch page finished loading
    VideoLoaded {
        /// Video ID or watch URL
        #[arg(allow_hyphen_values = true)]
        video: String,

        /// Page title
        #[arg(long)]
        title: Option<String>,
    },

    /// A tab changed url or load status
    TabUpdated {
        url: String,

        #[arg(long, default_value = "complete")]
        status: String,
    },

    /// A tab was closed
    TabClosed {
        /// The whole window is closing
        #[arg(long)]
        window_closing: bool,
    },

    /// The extension is suspending
    Suspend,

    /// A watch page is navigating away
    PageUnload {
        /// Video ID or watch URL
        #[arg(allow_hyphen_values = true)]
        video: String,
    },
}
