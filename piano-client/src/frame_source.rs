use anyhow::{Context, Result};
use opencv::{
    core::{Mat, Size, Vector},
    imgcodecs, imgproc,
    prelude::*,
};
use std::time::Duration;

/// Produces one frame per call. Failures are not retried.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Mat>;
}

/// Polls a camera endpoint that answers every GET with a single still image
pub struct HttpFrameSource {
    url: String,
    http_client: reqwest::blocking::Client,
    width: i32,
}

impl HttpFrameSource {
    pub fn new(url: impl Into<String>, width: i32) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            url: url.into(),
            http_client,
            width,
        })
    }

    /// Fetch the raw encoded image
    pub fn fetch_bytes(&self) -> Result<Vec<u8>> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .with_context(|| format!("Failed to fetch frame from {}", self.url))?
            .error_for_status()
            .with_context(|| format!("Camera at {} returned an error", self.url))?;

        Ok(response.bytes()?.to_vec())
    }
}

impl FrameSource for HttpFrameSource {
    fn next_frame(&mut self) -> Result<Mat> {
        let bytes = self.fetch_bytes()?;
        let frame = decode_frame(&bytes)?;
        resize_to_width(&frame, self.width)
    }
}

/// Decode an encoded image (JPEG, PNG, ...) keeping its channels
pub fn decode_frame(bytes: &[u8]) -> Result<Mat> {
    let buffer = Vector::<u8>::from_slice(bytes);
    let frame = imgcodecs::imdecode(&buffer, imgcodecs::IMREAD_UNCHANGED)?;
    if frame.empty() {
        anyhow::bail!("Received {} bytes that do not decode to an image", bytes.len());
    }
    Ok(frame)
}

/// Scale to `width` keeping the aspect ratio
pub fn resize_to_width(frame: &Mat, width: i32) -> Result<Mat> {
    if frame.cols() == width {
        return Ok(frame.try_clone()?);
    }

    let height = (frame.rows() as f64 * width as f64 / frame.cols() as f64).round() as i32;
    let mut resized = Mat::default();
    imgproc::resize(
        frame,
        &mut resized,
        Size::new(width, height.max(1)),
        0.0,
        0.0,
        imgproc::INTER_AREA,
    )?;
    Ok(resized)
}
