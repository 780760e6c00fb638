// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use snapcam::app::AppModel;
use snapcam::i18n;

mod cli;

#[derive(Parser)]
#[command(name = "snapcam")]
#[command(about = "Point-and-keep camera for the COSMIC desktop")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Take a photo and keep it
    Photo {
        /// Camera index to use (from 'snapcam list'); defaults to the rear camera
        #[arg(short, long)]
        camera: Option<usize>,

        /// Delete the provisional capture once the photo is kept
        #[arg(long)]
        discard_provisional: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=snapcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List) => Ok(cli::list_cameras()?),
        Some(Commands::Photo {
            camera,
            discard_provisional,
        }) => Ok(cli::take_photo(camera, discard_provisional)?),
        None => run_gui(),
    }
}

fn run_gui() -> Result<(), Box<dyn std::error::Error>> {
    // Get the system's preferred languages.
    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();

    // Enable localizations to be applied.
    i18n::init(&requested_languages);

    // Settings for configuring the application window and iced runtime.
    let settings = cosmic::app::Settings::default().size_limits(
        cosmic::iced::Limits::NONE
            .min_width(360.0)
            .min_height(480.0),
    );

    // Starts the application's event loop with `()` as the application's flags.
    cosmic::app::run::<AppModel>(settings, ())?;

    Ok(())
}
