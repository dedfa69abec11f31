//! digit-board
//!
//! Browse a handwritten-digit bitmap dataset and sketch new digits, in two
//! floating panels that can be hovered, raised and dragged around.

mod app;
mod canvas;
mod config;
mod dataset;
mod fps;
mod render;
mod shared;
mod wm;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::config::Config;
use crate::dataset::Dataset;
use crate::render::x11::X11Backend;
use crate::shared::Size;

const USAGE: &str = "\
Usage: digit-board [OPTIONS]

Options:
  --dataset <PATH>   Bitmap dataset to browse
  --sample <INDEX>   Sample shown at startup
  --config <PATH>    Configuration file
  -h, --help         Print this help";

/// Command line overrides on top of the config file
#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    dataset: Option<PathBuf>,
    sample: Option<usize>,
    config: Option<PathBuf>,
    help: bool,
}

impl CliArgs {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--dataset" => {
                    let value = args.next().context("--dataset needs a path")?;
                    parsed.dataset = Some(PathBuf::from(value));
                }
                "--config" => {
                    let value = args.next().context("--config needs a path")?;
                    parsed.config = Some(PathBuf::from(value));
                }
                "--sample" => {
                    let value = args.next().context("--sample needs an index")?;
                    let index = value
                        .parse()
                        .with_context(|| format!("Invalid sample index {:?}", value))?;
                    parsed.sample = Some(index);
                }
                other => bail!("Unknown argument {:?}", other),
            }
        }
        Ok(parsed)
    }

    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.dataset {
            config.dataset.path = path.clone();
        }
        if let Some(sample) = self.sample {
            config.dataset.initial_sample = sample;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "digit_board=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    info!("Starting digit-board");

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);

    let dataset = Dataset::open(&config.dataset.path)
        .with_context(|| format!("Failed to load dataset {:?}", config.dataset.path))?;

    // Setup signal handlers for graceful shutdown
    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let tx = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    let _ = tx.send(()).await;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    let _ = tx.send(()).await;
                }
            }
        });
    }
    #[cfg(not(unix))]
    {
        let tx = shutdown_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C, shutting down gracefully");
                let _ = tx.send(()).await;
            }
        });
    }

    let display = &config.display;
    let mut backend = X11Backend::open(&display.title, Size::new(display.width, display.height))?;
    let app = App::new(&mut backend, &config, dataset)?;

    if let Err(e) = app.run(&mut backend, display.target_fps, shutdown_rx).await {
        error!("Application error: {:#}", e);
        return Err(e);
    }

    drop(shutdown_tx);
    info!("Goodbye");
    Ok(())
}
