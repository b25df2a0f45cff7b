//! VidSaver - fetch a video's formats and prepare one for download
//!
//! Terminal front end for the acquisition controller. The metadata/download
//! service address comes from `VIDSAVER_BACKEND_URL` (a `.env` file is
//! honoured).

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use vidsaver::clipboard;
use vidsaver::utils::{format_duration, format_file_size};
use vidsaver::{
    BackendActor, BackendCommand, BackendEvent, HttpVideoService, ServiceConfig, VideoService,
};

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Video URL to fetch
    url: Option<String>,

    /// Read the video URL from the clipboard
    #[arg(long, conflicts_with = "url")]
    clipboard: bool,

    /// Format id to download (defaults to the first one offered)
    #[arg(short, long)]
    format: Option<String>,

    /// Only list the available formats
    #[arg(long)]
    list: bool,

    /// Open the prepared file with the system handler
    #[arg(long)]
    open: bool,

    /// Copy the prepared file's address to the clipboard
    #[arg(long)]
    copy: bool,

    /// Check that the service is reachable and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = ServiceConfig::from_env()?;

    if args.check {
        let service = HttpVideoService::new(config.clone()).context("building HTTP client")?;
        let message = service
            .health()
            .await
            .with_context(|| format!("service at {} is not reachable", config.base_url))?;
        println!("✓ {} ({})", message, config.base_url);
        return Ok(());
    }

    let url = match (args.url, args.clipboard) {
        (Some(url), _) => url,
        (None, true) => clipboard::read_video_url().map_err(anyhow::Error::msg)?,
        (None, false) => bail!("Please pass a video URL or --clipboard"),
    };

    let (commands, command_rx) = mpsc::channel(8);
    let (event_tx, mut events) = mpsc::channel(8);
    let actor = BackendActor::new(config, command_rx, event_tx)?;
    let controller = actor.controller().clone();
    let backend = tokio::spawn(actor.run());

    println!("Fetching video info...");
    commands.send(BackendCommand::FetchInfo { url }).await?;
    let metadata = match next_event(&mut events).await? {
        BackendEvent::MetadataReady(metadata) => metadata,
        other => bail!("unexpected backend event: {:?}", other),
    };

    println!("Title: {}", metadata.title);
    println!("Duration: {}", format_duration(metadata.duration));
    if !metadata.thumbnail.is_empty() {
        println!("Thumbnail: {}", metadata.thumbnail);
    }
    println!("Formats:");
    for format in &metadata.formats {
        println!("  {:>8}  {}", format.format_id, format.display_label());
    }

    if args.list {
        commands.send(BackendCommand::Shutdown).await?;
        return Ok(());
    }

    if let Some(format_id) = args.format {
        commands.send(BackendCommand::SelectFormat(format_id)).await?;
        next_event(&mut events).await?;
    }

    let session = controller.snapshot().await;
    if let Some(format) = session.selected() {
        println!(
            "Preparing {} ({})...",
            format.format_id,
            format_file_size(format.filesize)
        );
    }

    commands.send(BackendCommand::Download).await?;
    let result = match next_event(&mut events).await? {
        BackendEvent::DownloadReady(result) => result,
        other => bail!("unexpected backend event: {:?}", other),
    };
    println!("Download ready: {}", result.artifact_reference);

    commands.send(BackendCommand::Shutdown).await?;
    backend.await?;

    if args.copy {
        match clipboard::copy_artifact_reference(&result.artifact_reference) {
            Ok(()) => println!("Copied to clipboard"),
            Err(e) => eprintln!("WARNING: {}", e),
        }
    }

    if args.open {
        open::that(&result.artifact_reference)
            .with_context(|| format!("opening {}", result.artifact_reference))?;
    }

    Ok(())
}

/// Wait for the backend's answer; a notification ends the run with its message.
async fn next_event(events: &mut mpsc::Receiver<BackendEvent>) -> Result<BackendEvent> {
    match events.recv().await {
        Some(BackendEvent::Notification(message)) => bail!(message),
        Some(event) => Ok(event),
        None => bail!("backend stopped unexpectedly"),
    }
}
