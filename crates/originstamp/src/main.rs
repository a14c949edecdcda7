//! OriginStamp CLI and HTTP service entry point.
//!
//! Parses CLI arguments, opens the ledger, then dispatches to the command
//! handler or starts the HTTP service.

mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, Context};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = match cli.verbose {
        0 => "warn,originstamp=info",
        1 => "info,originstamp=debug,originstamp_store=debug,originstamp_client=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Hashing is pure and needs no ledger
    if let Commands::Hash {
        title,
        body,
        body_file,
    } = &cli.command
    {
        let body_file = body_file.clone();
        return cli::hash(title, body, body_file, cli.json).await;
    }

    let ctx = Context::open(&cli).await?;

    match cli.command {
        Commands::Serve { bind } => cli::serve(&ctx, bind).await?,
        Commands::Stamp {
            title,
            body,
            body_file,
            content_id,
        } => cli::stamp(&ctx, content_id, title, body, body_file).await?,
        Commands::Hash { .. } => {}
        Commands::Download { digest, output } => cli::download(&ctx, &digest, output).await?,
        Commands::History { page } => cli::history(&ctx, page).await?,
        Commands::Status { recent } => cli::status(&ctx, recent).await?,
        Commands::Config { action } => cli::config(&ctx, action).await?,
        Commands::Teardown { yes } => cli::teardown(&ctx, yes).await?,
    }

    Ok(())
}
