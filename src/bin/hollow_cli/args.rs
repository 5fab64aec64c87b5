//! Command-line surface for `hollow_cli`.

#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "hollow_cli",
    version,
    about = "Operator client for a running hollow server",
    long_about = None
)]
pub struct Cli {
    /// Server base URL, e.g. <https://edge.example.com>
    #[arg(long, env = "HOLLOW_SITE_URL")]
    pub site: Option<String>,

    /// Path to a file containing the revalidation secret (takes precedence over env)
    #[arg(long, env = "HOLLOW_SECRET_FILE")]
    pub secret_file: Option<PathBuf>,

    /// Revalidation secret from env (no CLI flag, to keep it out of shell history)
    #[arg(hide = true, env = "HOLLOW__REVALIDATE__SECRET")]
    pub secret_env: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Invalidate every cached entry
    Rebuild,
    /// Invalidate the cached entries for the given paths
    Revalidate {
        /// Public paths such as `/blog/hello-world`
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,
    },
    /// Check server liveness
    Health,
    /// Fetch the search index and report whether it is degraded
    SearchIndex {
        /// Print the full payload instead of a summary
        #[arg(long)]
        full: bool,
    },
}

impl Commands {
    /// Whether the command is sent to the secret-guarded webhook.
    pub fn needs_secret(&self) -> bool {
        matches!(self, Self::Rebuild | Self::Revalidate { .. })
    }
}
