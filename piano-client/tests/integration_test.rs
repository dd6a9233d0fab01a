use anyhow::Result;
use crossbeam::channel;
use opencv::{
    core::{Mat, Scalar, Vector, CV_8UC3},
    imgcodecs,
    prelude::*,
};
use piano_client::{
    app::PianoApp,
    frame_source::{FrameSource, HttpFrameSource},
    hand_tracker::HandLandmarker,
    playback::{playback_channel, SamplePlayer},
};
use piano_core::{Calibration, DispatchDecision, KeyLayout, SampleLibrary};
use piano_shared::{HandLandmarks, Position};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Records every (channel, sample) the worker starts
#[derive(Clone, Default)]
struct PlayedSamples {
    played: Arc<Mutex<Vec<(usize, PathBuf)>>>,
}

impl PlayedSamples {
    fn get_all(&self) -> Vec<(usize, PathBuf)> {
        self.played.lock().unwrap().clone()
    }
}

struct RecordingPlayer {
    channels: usize,
    samples: PlayedSamples,
}

impl SamplePlayer for RecordingPlayer {
    fn channels(&self) -> usize {
        self.channels
    }

    fn play(&mut self, channel: usize, path: &Path) -> Result<()> {
        self.samples
            .played
            .lock()
            .unwrap()
            .push((channel, path.to_path_buf()));
        Ok(())
    }
}

/// Hands the app a fixed sequence of detections, one entry per frame
struct ScriptedLandmarker {
    frames: VecDeque<Vec<HandLandmarks>>,
}

impl HandLandmarker for ScriptedLandmarker {
    fn detect(&mut self, _frame: &Mat) -> Result<Vec<HandLandmarks>> {
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}

/// Encodes a plain gray camera still as JPEG
fn camera_still(width: i32, height: i32) -> Result<Vec<u8>> {
    let img = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(128.0))?;
    let mut buffer = Vector::<u8>::new();
    imgcodecs::imencode(".jpg", &img, &mut buffer, &Vector::new())?;
    Ok(buffer.to_vec())
}

async fn camera_server() -> Result<MockServer> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/shot.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(camera_still(1280, 720)?),
        )
        .mount(&mock_server)
        .await;
    Ok(mock_server)
}

/// Open hand whose `joints` are folded onto a single point
fn hand_pressing(offset_x: f32, joints: [usize; 3], at: Position) -> HandLandmarks {
    let mut points: Vec<Position> = (0..21usize)
        .map(|id| {
            let finger = id.saturating_sub(1) / 4;
            let joint = id.saturating_sub(1) % 4;
            Position::new(offset_x + finger as f32 * 40.0, 450.0 - joint as f32 * 50.0)
        })
        .collect();
    for id in joints {
        points[id] = at;
    }
    HandLandmarks::from_positions(&points).unwrap()
}

const INDEX_JOINTS: [usize; 3] = [6, 7, 8];
const RING_JOINTS: [usize; 3] = [14, 15, 16];

fn sample_dir(layout: &KeyLayout) -> Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    for key in layout.white_keys().iter().chain(layout.black_keys()) {
        std::fs::write(dir.path().join(format!("{}.ogg", key.label)), b"")?;
    }
    Ok(dir)
}

/// Runs `frames` through the frame loop against the mock camera and
/// returns what the playback worker started
fn play_frames(
    camera_url: String,
    frames: Vec<Vec<HandLandmarks>>,
) -> Result<(Vec<(usize, PathBuf)>, PathBuf)> {
    let layout = KeyLayout::default();
    let samples_dir = sample_dir(&layout)?;
    let library = SampleLibrary::open(samples_dir.path())?;

    let samples = PlayedSamples::default();
    let worker_samples = samples.clone();
    let (queue, worker) = playback_channel(Duration::from_millis(10));
    let (_shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    let playback = worker.spawn(shutdown_rx, move || {
        Ok(RecordingPlayer {
            channels: 10,
            samples: worker_samples,
        })
    })?;

    let frame_count = frames.len();
    let mut app = PianoApp::new(
        HttpFrameSource::new(camera_url, 640)?,
        ScriptedLandmarker {
            frames: frames.into(),
        },
        layout,
        Calibration::default(),
        library,
        2,
        queue,
    );

    for _ in 0..frame_count {
        let step = app.step()?;
        assert_eq!(step.frame.cols(), 640);
    }

    // closing the queue lets the worker finish what it received, then exit
    drop(app);
    playback.join().unwrap();

    Ok((samples.get_all(), samples_dir.path().to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetches_and_resizes_camera_still() -> Result<()> {
        let mock_server = camera_server().await?;
        let url = format!("{}/shot.jpg", mock_server.uri());

        let frame = tokio::task::spawn_blocking(move || -> Result<Mat> {
            let mut source = HttpFrameSource::new(url, 640)?;
            source.next_frame()
        })
        .await??;

        assert_eq!(frame.cols(), 640);
        assert_eq!(frame.rows(), 360);
        Ok(())
    }

    #[tokio::test]
    async fn test_camera_error_is_reported() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/shot.jpg"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        let url = format!("{}/shot.jpg", mock_server.uri());

        let result = tokio::task::spawn_blocking(move || -> Result<Mat> {
            let mut source = HttpFrameSource::new(url, 640)?;
            source.next_frame()
        })
        .await?;

        assert!(result.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_index_press_plays_its_key_once() -> Result<()> {
        let mock_server = camera_server().await?;
        let url = format!("{}/shot.jpg", mock_server.uri());

        let layout = KeyLayout::default();
        let key = layout.white_keys()[14].bounds;
        let tip = Position::new(key.xmin as f32 + 5.0, 320.0);
        let held = hand_pressing(100.0, INDEX_JOINTS, tip);

        // the key stays down for three frames
        let frames = vec![vec![held.clone()], vec![held.clone()], vec![held]];
        let (played, dir) = tokio::task::spawn_blocking(move || play_frames(url, frames)).await??;

        assert_eq!(played, vec![(0, dir.join("a2.ogg"))]);
        Ok(())
    }

    #[tokio::test]
    async fn test_two_hands_play_together_on_separate_channels() -> Result<()> {
        let mock_server = camera_server().await?;
        let url = format!("{}/shot.jpg", mock_server.uri());

        let layout = KeyLayout::default();
        let black = layout.black_keys()[10].clone();
        let white = layout.white_keys()[40].clone();
        let first = hand_pressing(100.0, RING_JOINTS, black.bounds.center());
        let second = hand_pressing(
            300.0,
            INDEX_JOINTS,
            Position::new(white.bounds.xmin as f32 + 3.0, 310.0),
        );

        let frames = vec![vec![first.clone(), second.clone()], vec![first, second]];
        let (played, dir) = tokio::task::spawn_blocking(move || play_frames(url, frames)).await??;

        assert_eq!(
            played,
            vec![
                (0, dir.join(format!("{}.ogg", black.label))),
                (1, dir.join(format!("{}.ogg", white.label))),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_release_flushes_and_repress_plays_again() -> Result<()> {
        let mock_server = camera_server().await?;
        let url = format!("{}/shot.jpg", mock_server.uri());

        let layout = KeyLayout::default();
        let key = layout.white_keys()[14].bounds;
        let tip = Position::new(key.xmin as f32 + 5.0, 320.0);
        let pressed = hand_pressing(100.0, INDEX_JOINTS, tip);

        let (decisions, played) = tokio::task::spawn_blocking(move || -> Result<_> {
            let layout = KeyLayout::default();
            let library = SampleLibrary::from_file_names("/samples", vec!["a2.ogg".to_string()]);
            let (queue, worker) = playback_channel(Duration::from_millis(10));
            let lists = worker.into_receiver();

            let mut app = PianoApp::new(
                HttpFrameSource::new(url, 640)?,
                ScriptedLandmarker {
                    frames: vec![vec![pressed.clone()], vec![], vec![pressed]].into(),
                },
                layout,
                Calibration::default(),
                library,
                2,
                queue,
            );

            let mut decisions = Vec::new();
            for _ in 0..3 {
                decisions.push(app.step()?.decision);
            }
            drop(app);
            Ok((decisions, lists.try_iter().collect::<Vec<_>>()))
        })
        .await??;

        let a2 = vec![PathBuf::from("/samples/a2.ogg")];
        assert_eq!(
            decisions,
            vec![
                DispatchDecision::Play(a2.clone()),
                DispatchDecision::Flush,
                DispatchDecision::Play(a2.clone()),
            ]
        );
        // the flush discarded the first request before the worker saw it
        assert_eq!(played, vec![a2]);
        Ok(())
    }
}
