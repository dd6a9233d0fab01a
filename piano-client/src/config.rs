use anyhow::{Context, Result};
use clap::Parser;
use piano_core::{Calibration, Finger, LayoutParams};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Webcam virtual piano", long_about = None)]
pub struct Args {
    /// Still image endpoint of the network camera (e.g., http://192.168.29.189:8080/shot.jpg)
    #[arg(short, long)]
    pub url: String,

    /// Directory with one audio sample per note
    #[arg(short, long)]
    pub samples: PathBuf,

    /// JSON file with per-finger curl thresholds ({"thumb": 8.6, "index": 6.0, ...})
    #[arg(long)]
    pub calibration: Option<PathBuf>,

    #[arg(long)]
    pub thumb_threshold: Option<f32>,

    #[arg(long)]
    pub index_threshold: Option<f32>,

    #[arg(long)]
    pub middle_threshold: Option<f32>,

    #[arg(long)]
    pub ring_threshold: Option<f32>,

    #[arg(long)]
    pub little_threshold: Option<f32>,

    /// Python interpreter with mediapipe installed
    #[arg(long, default_value = "python3")]
    pub python: PathBuf,

    /// Hand landmark helper script
    #[arg(long, default_value = "scripts/hand_landmarks.py")]
    pub landmarker_script: PathBuf,

    /// Minimum hand detection score
    #[arg(long, default_value_t = 0.5)]
    pub confidence: f32,

    /// Hands processed per frame
    #[arg(long, default_value_t = 2)]
    pub max_hands: usize,

    /// Frames are resized to this width
    #[arg(long, default_value_t = 640)]
    pub frame_width: i32,

    /// Audio channels available for simultaneous notes
    #[arg(long, default_value_t = 10)]
    pub channels: usize,

    /// Pause of the playback worker after starting a batch of notes
    #[arg(long, default_value_t = 2000)]
    pub hold_ms: u64,

    /// Window refresh delay per frame
    #[arg(long, default_value_t = 100)]
    pub frame_delay_ms: u64,

    #[arg(long, default_value_t = 40)]
    pub origin_x: i32,

    #[arg(long, default_value_t = 250)]
    pub origin_y: i32,

    #[arg(long, default_value_t = 10)]
    pub white_width: i32,

    #[arg(long, default_value_t = 80)]
    pub white_height: i32,

    #[arg(long, default_value_t = 5)]
    pub black_width: i32,

    #[arg(long, default_value_t = 40)]
    pub black_height: i32,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

/// Validated runtime settings
#[derive(Debug, Clone)]
pub struct PianoConfig {
    pub frame_url: String,
    pub samples_dir: PathBuf,
    pub calibration: Calibration,
    pub layout: LayoutParams,
    pub landmarker: LandmarkerConfig,
    pub max_hands: usize,
    pub frame_width: i32,
    pub channels: usize,
    pub hold: Duration,
    pub frame_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct LandmarkerConfig {
    pub python: PathBuf,
    pub script: PathBuf,
    pub confidence: f32,
}

impl Args {
    pub fn into_config(self) -> Result<PianoConfig> {
        let mut calibration = match &self.calibration {
            Some(path) => load_calibration(path)?,
            None => Calibration::default(),
        };

        let overrides = [
            (Finger::Thumb, self.thumb_threshold),
            (Finger::Index, self.index_threshold),
            (Finger::Middle, self.middle_threshold),
            (Finger::Ring, self.ring_threshold),
            (Finger::Little, self.little_threshold),
        ];
        for (finger, value) in overrides {
            if let Some(value) = value {
                calibration.set_threshold(finger, value);
            }
        }

        if Finger::ALL.iter().any(|f| calibration.threshold(*f) <= 0.0) {
            anyhow::bail!("Curl thresholds must be positive, got {:?}", calibration);
        }
        if self.max_hands == 0 {
            anyhow::bail!("--max-hands must be at least 1");
        }
        if self.channels == 0 {
            anyhow::bail!("--channels must be at least 1");
        }
        if self.frame_width <= 0 {
            anyhow::bail!("--frame-width must be positive");
        }

        let layout = LayoutParams {
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            white_width: self.white_width,
            white_height: self.white_height,
            black_width: self.black_width,
            black_height: self.black_height,
        };
        validate_layout(&layout)?;

        Ok(PianoConfig {
            frame_url: self.url,
            samples_dir: self.samples,
            calibration,
            layout,
            landmarker: LandmarkerConfig {
                python: self.python,
                script: self.landmarker_script,
                confidence: self.confidence.clamp(0.0, 1.0),
            },
            max_hands: self.max_hands,
            frame_width: self.frame_width,
            channels: self.channels,
            hold: Duration::from_millis(self.hold_ms),
            frame_delay: Duration::from_millis(self.frame_delay_ms),
        })
    }
}

fn validate_layout(layout: &LayoutParams) -> Result<()> {
    let sizes = [
        ("--white-width", layout.white_width),
        ("--white-height", layout.white_height),
        ("--black-width", layout.black_width),
        ("--black-height", layout.black_height),
    ];
    for (flag, value) in sizes {
        if value <= 0 {
            anyhow::bail!("{} must be positive, got {}", flag, value);
        }
    }
    if layout.origin_x < 0 || layout.origin_y < 0 {
        anyhow::bail!("Keyboard origin must not be negative, got {:?}", layout);
    }
    if layout.extent().is_none() {
        anyhow::bail!("Keyboard does not fit in pixel coordinates: {:?}", layout);
    }
    Ok(())
}

/// Read a calibration file. Fingers missing from the file keep their defaults.
pub fn load_calibration(path: &Path) -> Result<Calibration> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read calibration file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid calibration file {}", path.display()))
}
