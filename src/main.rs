use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lectern::app::AppContext;
use lectern::cli::{commands, Cli, Commands};
use lectern::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }

    let ctx = AppContext::new(config)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let result = match cli.command {
        Commands::List {
            resource,
            page,
            limit,
        } => commands::list(&ctx, resource, page, limit, &cancel).await,
        Commands::Get { resource, id, slug } => {
            commands::get(&ctx, resource, id.as_deref(), slug.as_deref(), &cancel).await
        }
        Commands::Featured => commands::featured(&ctx, &cancel).await,
        Commands::Children {
            resource,
            parent_id,
        } => commands::children(&ctx, resource, &parent_id, &cancel).await,
        Commands::Sanitize { input } => commands::sanitize(&ctx, &input),
    };

    match result {
        Err(e) if e.is_cancelled() => {
            eprintln!("Interrupted");
            Ok(())
        }
        other => Ok(other?),
    }
}
