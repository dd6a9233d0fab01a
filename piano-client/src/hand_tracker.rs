use anyhow::{Context, Result};
use opencv::{core::Mat, prelude::*};
use piano_shared::{DetectionResponse, HandLandmarks, LANDMARK_COUNT};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::config::LandmarkerConfig;

/// Source of hand landmarks for a frame, in pixel coordinates
pub trait HandLandmarker {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<HandLandmarks>>;
}

/// MediaPipe hand landmarker running in a helper process.
///
/// Per frame the helper receives width, height and channel count as
/// little-endian u32 followed by the raw BGR bytes, and answers with one
/// JSON line in normalized coordinates.
pub struct SubprocessLandmarker {
    process: Child,
    stdin: ChildStdin,
    stdout_reader: BufReader<ChildStdout>,
    confidence_threshold: f32,
}

impl SubprocessLandmarker {
    pub fn spawn(config: &LandmarkerConfig) -> Result<Self> {
        if !config.script.exists() {
            anyhow::bail!("Hand landmark script not found at {}", config.script.display());
        }

        log::info!("Starting MediaPipe hand landmark helper...");

        let mut command = Command::new(&config.python);
        command
            .arg(&config.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        // Keep terminal signals away from the helper; it is stopped on drop
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut process = command
            .spawn()
            .with_context(|| format!("Failed to start {}", config.python.display()))?;

        let stdin = process.stdin.take().context("Failed to get helper stdin")?;
        let stdout = process.stdout.take().context("Failed to get helper stdout")?;
        let mut stdout_reader = BufReader::new(stdout);

        let mut ready_line = String::new();
        stdout_reader.read_line(&mut ready_line)?;
        if ready_line.trim() != "READY" {
            let _ = process.kill();
            anyhow::bail!("Hand landmark helper did not signal ready, got: {:?}", ready_line);
        }

        log::info!("Hand landmark helper ready");

        Ok(Self {
            process,
            stdin,
            stdout_reader,
            confidence_threshold: config.confidence,
        })
    }

    fn send_frame(&mut self, frame: &Mat) -> Result<()> {
        let width = frame.cols() as u32;
        let height = frame.rows() as u32;
        let channels = frame.channels() as u32;

        let packed;
        let data = if frame.is_continuous() {
            frame.data_bytes()?
        } else {
            packed = frame.try_clone()?;
            packed.data_bytes()?
        };

        self.stdin.write_all(&width.to_le_bytes())?;
        self.stdin.write_all(&height.to_le_bytes())?;
        self.stdin.write_all(&channels.to_le_bytes())?;
        self.stdin.write_all(data)?;
        self.stdin.flush()?;
        Ok(())
    }
}

impl HandLandmarker for SubprocessLandmarker {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<HandLandmarks>> {
        if frame.empty() {
            return Ok(Vec::new());
        }

        self.send_frame(frame)
            .context("Failed to send frame to hand landmark helper")?;

        let mut response = String::new();
        if self.stdout_reader.read_line(&mut response)? == 0 {
            anyhow::bail!("Hand landmark helper exited");
        }

        let result: DetectionResponse = serde_json::from_str(&response)
            .with_context(|| format!("Failed to parse helper response: {}", response.trim()))?;

        Ok(hands_from_response(
            result,
            frame.cols() as u32,
            frame.rows() as u32,
            self.confidence_threshold,
        ))
    }
}

impl Drop for SubprocessLandmarker {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Keep the confident, complete hands of a helper response, in pixels
pub fn hands_from_response(
    response: DetectionResponse,
    width: u32,
    height: u32,
    confidence_threshold: f32,
) -> Vec<HandLandmarks> {
    if let Some(error) = response.error {
        log::warn!("Hand landmark helper error: {}", error);
        return Vec::new();
    }

    response
        .hands
        .iter()
        .filter(|hand| {
            if hand.landmarks.len() != LANDMARK_COUNT {
                log::warn!("Expected {} landmarks, got {}", LANDMARK_COUNT, hand.landmarks.len());
                return false;
            }
            hand.score >= confidence_threshold
        })
        .filter_map(|hand| hand.to_pixels(width, height))
        .collect()
}
