use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};
use url::Url;

use streamcap::capture::{CaptureLayout, CaptureOptions, capture};
use streamcap::compose::{
    ComposeOptions, DEFAULT_DOWNLOADER, DEFAULT_JOBS, DEFAULT_MUXER, Instructions,
};
use streamcap::fetch;
use streamcap::shared::{interrupt_on_ctrlc, run_command};

/// Capture a HLS media playlist for offline download and remuxing.
///
/// Downloads the manifest, lists every segment and key URL it references,
/// writes a copy that points at local files instead, and prints the commands
/// that fetch the files and remux them into a single transport stream.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// The URL of the HLS media playlist.
    #[arg(value_name = "URL", value_parser = Url::parse)]
    manifest_url: Url,
    /// The capture directory. The remuxed stream is written next to it as NAME.ts.
    #[arg(value_name = "NAME")]
    capture_name: PathBuf,
    /// Number of concurrent downloads for the bulk downloader.
    #[arg(short = 'j', long, default_value_t = DEFAULT_JOBS,
          value_parser = clap::value_parser!(u32).range(1..))]
    jobs: u32,
    /// The bulk downloader program.
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_DOWNLOADER)]
    downloader: String,
    /// The muxer program.
    #[arg(long, value_name = "PROGRAM", default_value = DEFAULT_MUXER)]
    muxer: String,
    /// Stop with an error when the manifest cannot be downloaded.
    #[arg(long)]
    fail_fast: bool,
    /// Run the composed commands instead of only printing them.
    #[arg(long)]
    run: bool,
    /// Print debug logging.
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let layout = CaptureLayout::new(&args.capture_name);
    let client = fetch::client().context("Failed to create HTTP client")?;
    let options = CaptureOptions {
        fail_fast: args.fail_fast,
    };
    let summary = {
        let url = args.manifest_url.clone();
        let layout = layout.clone();
        interrupt_on_ctrlc(tokio::spawn(async move {
            capture(&client, &url, &layout, options).await
        }))
        .await
        .with_context(|| format!("Failed to capture {}", args.manifest_url))?
    };
    info!(
        "Captured {} links into {}",
        summary.links.len(),
        layout.root().display()
    );

    let instructions = Instructions::new(
        &layout,
        &ComposeOptions {
            downloader: args.downloader,
            muxer: args.muxer,
            jobs: args.jobs,
        },
    );
    if !args.run {
        println!("\n{instructions}");
        return Ok(());
    }

    for command in [instructions.download, instructions.remux] {
        println!("\nrunning: {command}");
        let status = interrupt_on_ctrlc(tokio::spawn(async move { run_command(&command).await }))
            .await
            .context("Failed to run command")?;
        if !status.success() {
            bail!("Command failed with {status}");
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::builder()
            .with_default_directive(Level::WARN.into())
            .from_env_lossy()
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
