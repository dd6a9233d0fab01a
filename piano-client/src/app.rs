use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, TryRecvError};
use opencv::{core::Mat, highgui};
use piano_core::{
    process_hands, Calibration, DispatchDecision, Dispatcher, FrameOutcome, KeyLayout,
    SampleLibrary,
};
use piano_shared::HandLandmarks;
use std::time::{Duration, Instant};

use crate::frame_source::FrameSource;
use crate::hand_tracker::HandLandmarker;
use crate::overlay;
use crate::playback::PlaybackQueue;

pub const WINDOW_NAME: &str = "virtual-piano";

/// The producer: turns frames into key presses and playback requests
pub struct PianoApp<S, L> {
    source: S,
    landmarker: L,
    layout: KeyLayout,
    calibration: Calibration,
    library: SampleLibrary,
    max_hands: usize,
    dispatcher: Dispatcher,
    queue: PlaybackQueue,
}

/// What one iteration produced, besides the frame itself
pub struct FrameStep {
    pub frame: Mat,
    pub hands: Vec<HandLandmarks>,
    pub outcome: FrameOutcome,
    pub decision: DispatchDecision,
}

impl<S: FrameSource, L: HandLandmarker> PianoApp<S, L> {
    pub fn new(
        source: S,
        landmarker: L,
        layout: KeyLayout,
        calibration: Calibration,
        library: SampleLibrary,
        max_hands: usize,
        queue: PlaybackQueue,
    ) -> Self {
        Self {
            source,
            landmarker,
            layout,
            calibration,
            library,
            max_hands,
            dispatcher: Dispatcher::new(),
            queue,
        }
    }

    /// Acquire a frame, detect presses and hand changes to the playback worker
    pub fn step(&mut self) -> Result<FrameStep> {
        let frame = self.source.next_frame().context("Failed to acquire frame")?;

        let mut hands = self.landmarker.detect(&frame)?;
        hands.truncate(self.max_hands);
        log::debug!("Hands detected: {}", hands.len());

        let outcome = process_hands(&hands, &self.layout, &self.calibration, &self.library);
        for (i, (hand, press)) in hands.iter().zip(&outcome.hands).enumerate() {
            log::debug!(
                "Hand {} ({:?}, score {:.2}) press array: {:?}",
                i,
                hand.handedness,
                hand.score,
                press.pressed()
            );
        }

        let decision = self.dispatcher.update(outcome.dispatch.clone());
        self.queue.apply(decision.clone())?;

        Ok(FrameStep {
            frame,
            hands,
            outcome,
            decision,
        })
    }

    /// Step unless shutdown was requested. A step that fails once shutdown
    /// is underway ends the loop cleanly instead of reporting an error.
    pub fn next_step(&mut self, shutdown: &Receiver<()>) -> Result<Option<FrameStep>> {
        if shutdown_requested(shutdown) {
            return Ok(None);
        }

        match self.step() {
            Ok(step) => Ok(Some(step)),
            Err(e) if shutdown_requested(shutdown) => {
                log::debug!("Frame failed during shutdown: {:#}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Run until `q` is pressed in the window, `shutdown` closes or a frame fails
    pub fn run(&mut self, shutdown: &Receiver<()>, frame_delay: Duration) -> Result<()> {
        log::info!("Starting main loop...");
        highgui::named_window(WINDOW_NAME, highgui::WINDOW_AUTOSIZE)?;

        let mut frame_count = 0;
        let mut last_fps_time = Instant::now();
        let mut fps = 0.0;
        let delay_ms = frame_delay.as_millis().clamp(1, i32::MAX as u128) as i32;

        loop {
            let Some(step) = self.next_step(shutdown)? else {
                log::info!("Shutdown requested, leaving main loop");
                break;
            };

            frame_count += 1;
            if last_fps_time.elapsed().as_secs() >= 1 {
                fps = frame_count as f64 / last_fps_time.elapsed().as_secs_f64();
                frame_count = 0;
                last_fps_time = Instant::now();
            }

            let canvas = overlay::render(
                &step.frame,
                &self.layout,
                &step.outcome.presses,
                &step.hands,
                &step.outcome.hands,
                fps,
            )?;
            highgui::imshow(WINDOW_NAME, &canvas)?;

            if highgui::wait_key(delay_ms)? == b'q' as i32 {
                log::info!("Quit requested");
                break;
            }
        }

        highgui::destroy_window(WINDOW_NAME)?;
        Ok(())
    }
}

fn shutdown_requested(shutdown: &Receiver<()>) -> bool {
    !matches!(shutdown.try_recv(), Err(TryRecvError::Empty))
}
