//! hollow_cli: operator client for the revalidation webhook and status endpoints.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod handlers;
mod print;


use clap::Parser;

use args::{Cli, Commands};
use client::{CliError, build_ctx_from_cli};
use handlers::SearchIndexSummary;
use print::print_json;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = build_ctx_from_cli(&cli)?;

    match cli.command {
        Commands::Rebuild => print_json(&handlers::rebuild(&ctx).await?)?,
        Commands::Revalidate { paths } => print_json(&handlers::revalidate(&ctx, paths).await?)?,
        Commands::Health => print_json(&handlers::health(&ctx).await?)?,
        Commands::SearchIndex { full } => {
            let payload = handlers::search_index(&ctx).await?;
            if full {
                print_json(&payload)?;
            } else {
                print_json(&SearchIndexSummary::from(&payload))?;
            }
        }
    }

    Ok(())
}
