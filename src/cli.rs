use crate::config::DEFAULT_PORT;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    author = "Gokul <@bahdotsh>",
    version = env!("CARGO_PKG_VERSION"),
    about = "snipsync - capture, search and sync code snippets",
    long_about = "snipsync keeps code snippets in a local store and, when enabled, on a remote snippet service."
)]
pub struct Snipsync {
    #[clap(subcommand)]
    pub commands: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save a new snippet (code is read from --file or stdin)
    Add {
        #[clap(long, short = 't', help = "Title of the snippet")]
        title: String,

        #[clap(long, short = 'd', default_value = "", help = "Short description")]
        description: String,

        #[clap(
            long,
            short = 'l',
            help = "Language id (inferred from --file when omitted)"
        )]
        language: Option<String>,

        #[clap(long = "tag", short = 'g', help = "Tag, may be repeated")]
        tags: Vec<String>,

        #[clap(long, short = 'f', help = "Read the code from this file")]
        file: Option<PathBuf>,
    },
    /// List local snippets
    List,
    /// Search snippets (remotely when the API is enabled)
    Search {
        #[clap(help = "Text to look for; lists everything when omitted")]
        query: Option<String>,
    },
    /// Print a snippet's code
    Show {
        #[clap(help = "Position as printed by `list`")]
        position: usize,
    },
    /// Copy a snippet's code to the clipboard
    Insert {
        #[clap(help = "Position as printed by `list`")]
        position: usize,
    },
    /// Delete a snippet locally and, if synced, remotely
    Delete {
        #[clap(help = "Position as printed by `list`")]
        position: usize,
    },
    /// Push snippets that only exist locally to the remote service
    Sync,
    /// Show the effective configuration
    Config,
    /// Run a local snippet service for development
    Serve {
        #[clap(long, short, default_value_t = DEFAULT_PORT, help = "Port to listen on")]
        port: u16,

        #[clap(long, help = "Require this bearer token on every request")]
        token: Option<String>,

        #[clap(long, help = "Keep snippets in memory instead of on disk")]
        in_memory: bool,
    },
}
