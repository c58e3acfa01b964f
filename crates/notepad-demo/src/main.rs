//! Terminal host for the streaming notepad, plus the server it talks to.

mod cli;

use std::io;

use anyhow::{Context, bail};
use clap::Parser;
use notepad_server::ServeConfig;
use notepad_stream::observability::init_observability;
use notepad_stream::prelude::*;
use tracing::{info, warn};

use crate::cli::{Cli, Commands, ServeArgs, WatchArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_observability("info");

    match Cli::parse().command {
        Commands::Watch(args) => watch(args).await,
        Commands::Serve(args) => serve(args).await,
    }
}

async fn watch(args: WatchArgs) -> anyhow::Result<()> {
    let subscriber = Subscriber::new(ClientConfig::new(&args.base_url))
        .context("invalid client configuration")?;
    let options = StreamOptions::default()
        .path(args.path)
        .chunk_size(args.chunk_size)
        .delay_ms(args.delay_ms);
    let notepad = NotepadStream::with_options(options)
        .mount(&subscriber)
        .context("failed to mount notepad")?;
    let search = StaticPanel::new("Search", "(search is served by the full app)");
    let mut page = HostPage::new(search, notepad).clear_screen(!args.no_clear);

    let mut stdout = io::stdout();
    let outcome = tokio::select! {
        result = page.run(&mut stdout) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    page.close();

    match outcome {
        None => {
            info!("interrupted");
            Ok(())
        }
        Some(Ok(Status::Error)) => bail!("notepad stream failed"),
        Some(Ok(status)) => {
            info!(%status, "watch finished");
            Ok(())
        }
        Some(Err(e)) => Err(e).context("failed to render page"),
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = ServeConfig::default().bind(args.bind).root(args.root);
    notepad_server::serve(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
        }
    })
    .await
    .context("server failed")
}
