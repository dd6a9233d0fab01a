#![cfg_attr(not(feature = "std"), no_std)]

use serde::{Deserialize, Serialize};

/// Number of landmarks the hand tracker reports per hand
pub const LANDMARK_COUNT: usize = 21;

/// Landmark indices of the standard 21-point hand topology
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const LITTLE_MCP: usize = 17;
    pub const LITTLE_PIP: usize = 18;
    pub const LITTLE_DIP: usize = 19;
    pub const LITTLE_TIP: usize = 20;
}

/// Represents a 2D position in frame pixel coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another position
    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        libm::sqrtf(dx * dx + dy * dy)
    }

    /// Multiply both coordinates by `factor`
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

/// A tracked point of one hand
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Landmark {
    pub id: u8,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

/// All 21 landmarks of one detected hand, valid for a single frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandLandmarks {
    landmarks: [Landmark; LANDMARK_COUNT],
    pub handedness: Handedness,
    pub score: f32,
}

impl HandLandmarks {
    /// Build a hand from pixel positions given in landmark id order.
    /// Returns `None` unless exactly 21 positions are supplied.
    pub fn from_positions(positions: &[Position]) -> Option<Self> {
        if positions.len() != LANDMARK_COUNT {
            return None;
        }

        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (id, (slot, position)) in landmarks.iter_mut().zip(positions).enumerate() {
            *slot = Landmark {
                id: id as u8,
                position: *position,
            };
        }

        Some(Self {
            landmarks,
            handedness: Handedness::Unknown,
            score: 1.0,
        })
    }

    pub fn with_handedness(mut self, handedness: Handedness) -> Self {
        self.handedness = handedness;
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.landmarks
    }

    /// Pixel position of landmark `id` (0-20)
    pub fn position(&self, id: usize) -> Position {
        self.landmarks[id].position
    }
}

#[cfg(feature = "std")]
pub use detection::{DetectedHand, DetectionResponse, NormalizedLandmark};

/// JSON lines emitted by the MediaPipe helper process
#[cfg(feature = "std")]
mod detection {
    use super::*;

    /// One landmark in normalized image coordinates (0.0 to 1.0)
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
    pub struct NormalizedLandmark {
        pub x: f32,
        pub y: f32,
        #[serde(default)]
        pub z: f32,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct DetectedHand {
        #[serde(default)]
        pub handedness: String,
        pub score: f32,
        pub landmarks: Vec<NormalizedLandmark>,
    }

    /// One response line per submitted frame
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct DetectionResponse {
        pub hands: Vec<DetectedHand>,
        #[serde(default)]
        pub error: Option<String>,
    }

    impl DetectedHand {
        /// Convert to pixel coordinates of a `width` x `height` frame.
        /// Coordinates are truncated to whole pixels.
        pub fn to_pixels(&self, width: u32, height: u32) -> Option<HandLandmarks> {
            let positions: Vec<Position> = self
                .landmarks
                .iter()
                .map(|lm| {
                    Position::new(
                        (lm.x * width as f32).trunc(),
                        (lm.y * height as f32).trunc(),
                    )
                })
                .collect();

            let handedness = match self.handedness.as_str() {
                "Left" => Handedness::Left,
                "Right" => Handedness::Right,
                _ => Handedness::Unknown,
            };

            HandLandmarks::from_positions(&positions)
                .map(|hand| hand.with_handedness(handedness).with_score(self.score))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_distance() {
        let p1 = Position::new(0.0, 0.0);
        let p2 = Position::new(3.0, 4.0);
        assert_eq!(p1.distance_to(&p2), 5.0);
    }

    #[test]
    fn test_hand_requires_21_landmarks() {
        let too_few = [Position::default(); 20];
        assert!(HandLandmarks::from_positions(&too_few).is_none());

        let positions: Vec<Position> = (0..21).map(|i| Position::new(i as f32, 0.0)).collect();
        let hand = HandLandmarks::from_positions(&positions).unwrap();
        assert_eq!(hand.landmarks()[landmarks::INDEX_TIP].id, 8);
        assert_eq!(hand.position(landmarks::LITTLE_TIP), Position::new(20.0, 0.0));
    }

    #[test]
    fn test_detection_response_to_pixels() {
        let line = r#"{"hands":[{"handedness":"Right","score":0.93,"landmarks":[
            {"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0},
            {"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0},
            {"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0},{"x":0.1234,"y":0.9999,"z":0.0},
            {"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0},
            {"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0},
            {"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0},
            {"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0},{"x":0.5,"y":0.25,"z":0.0}
        ]}]}"#;

        let response: DetectionResponse = serde_json::from_str(line).unwrap();
        assert!(response.error.is_none());

        let hand = response.hands[0].to_pixels(640, 480).unwrap();
        assert_eq!(hand.handedness, Handedness::Right);
        assert_eq!(hand.position(landmarks::WRIST), Position::new(320.0, 120.0));
        assert_eq!(hand.position(landmarks::INDEX_TIP), Position::new(78.0, 479.0));
    }
}
