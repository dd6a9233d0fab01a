use anyhow::{Context, Result};
use clap::Parser;
use crossbeam::channel;
use piano_client::{
    app::PianoApp,
    config::Args,
    frame_source::HttpFrameSource,
    hand_tracker::SubprocessLandmarker,
    playback::{playback_channel, KiraPlayer},
};
use piano_core::{KeyLayout, SampleLibrary};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let config = args.into_config()?;

    log::info!("Virtual piano starting...");
    log::info!("Camera: {}", config.frame_url);
    log::info!("Samples: {}", config.samples_dir.display());

    let library = SampleLibrary::open(&config.samples_dir).with_context(|| {
        format!("Failed to read sample directory {}", config.samples_dir.display())
    })?;
    log::info!("Loaded {} sample file name(s)", library.len());

    let layout = KeyLayout::new(config.layout);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log::info!("Interrupt received, shutting down");
                drop(shutdown_tx);
            }
            Err(e) => {
                log::warn!("Unable to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });

    // The blocking HTTP client and the window must stay off the async executor
    tokio::task::block_in_place(move || {
        let (queue, worker) = playback_channel(config.hold);

        let channels = config.channels;
        let playback = worker
            .spawn(shutdown_rx.clone(), move || KiraPlayer::new(channels))
            .context("Failed to start audio playback")?;

        let landmarker = SubprocessLandmarker::spawn(&config.landmarker)
            .context("Failed to initialize hand landmarker")?;
        let source = HttpFrameSource::new(config.frame_url.clone(), config.frame_width)?;

        let mut app = PianoApp::new(
            source,
            landmarker,
            layout,
            config.calibration,
            library,
            config.max_hands,
            queue,
        );

        let result = app.run(&shutdown_rx, config.frame_delay);

        // Dropping the app closes the playback queue, which stops the worker
        drop(app);
        if playback.join().is_err() {
            log::error!("Playback worker panicked");
        }

        result.context("Frame loop error")
    })
}
