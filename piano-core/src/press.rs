//! Curl heuristic deciding which fingers of a hand are pressing a key

use piano_shared::{landmarks, HandLandmarks, Position};
use serde::{Deserialize, Serialize};

/// Landmark coordinates are scaled down by this factor before measuring
pub const CURL_SCALE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Little,
    ];

    /// Base, middle and tip joints used by the curl test
    pub fn joints(self) -> [usize; 3] {
        match self {
            Finger::Thumb => [landmarks::THUMB_MCP, landmarks::THUMB_IP, landmarks::THUMB_TIP],
            Finger::Index => [landmarks::INDEX_PIP, landmarks::INDEX_DIP, landmarks::INDEX_TIP],
            Finger::Middle => [landmarks::MIDDLE_PIP, landmarks::MIDDLE_DIP, landmarks::MIDDLE_TIP],
            Finger::Ring => [landmarks::RING_PIP, landmarks::RING_DIP, landmarks::RING_TIP],
            Finger::Little => [landmarks::LITTLE_PIP, landmarks::LITTLE_DIP, landmarks::LITTLE_TIP],
        }
    }

    /// Landmark whose position is reported for a press
    pub fn tip(self) -> usize {
        self.joints()[2]
    }
}

/// Per-finger curl thresholds. These depend on camera distance and angle
/// and have to be calibrated per setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub thumb: f32,
    pub index: f32,
    pub middle: f32,
    pub ring: f32,
    pub little: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            thumb: 8.6,
            index: 6.0,
            middle: 6.0,
            ring: 6.0,
            little: 5.0,
        }
    }
}

impl Calibration {
    pub fn threshold(&self, finger: Finger) -> f32 {
        match finger {
            Finger::Thumb => self.thumb,
            Finger::Index => self.index,
            Finger::Middle => self.middle,
            Finger::Ring => self.ring,
            Finger::Little => self.little,
        }
    }

    pub fn set_threshold(&mut self, finger: Finger, value: f32) {
        match finger {
            Finger::Thumb => self.thumb = value,
            Finger::Index => self.index = value,
            Finger::Middle => self.middle = value,
            Finger::Ring => self.ring = value,
            Finger::Little => self.little = value,
        }
    }
}

/// Perimeter of the triangle spanned by three joints, after scaling
pub fn curl_measure(p1: Position, p2: Position, p3: Position) -> f32 {
    let (p1, p2, p3) = (p1.scaled(CURL_SCALE), p2.scaled(CURL_SCALE), p3.scaled(CURL_SCALE));
    p1.distance_to(&p2) + p3.distance_to(&p2) + p1.distance_to(&p3)
}

/// Press state of the five fingers of one hand
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandPress {
    /// Tip position of every pressed finger, `None` otherwise
    tips: [Option<Position>; 5],
}

impl HandPress {
    pub fn is_pressed(&self, finger: Finger) -> bool {
        self.tips[finger as usize].is_some()
    }

    pub fn pressed(&self) -> [bool; 5] {
        self.tips.map(|tip| tip.is_some())
    }

    pub fn tip(&self, finger: Finger) -> Option<Position> {
        self.tips[finger as usize]
    }

    /// Tip positions of the pressed fingers, thumb to little
    pub fn pressed_tips(&self) -> impl Iterator<Item = (Finger, Position)> + '_ {
        Finger::ALL
            .into_iter()
            .filter_map(|finger| self.tip(finger).map(|pos| (finger, pos)))
    }

    pub fn any(&self) -> bool {
        self.tips.iter().any(Option::is_some)
    }
}

/// Classify every finger of `hand` as pressed or not
pub fn detect_presses(hand: &HandLandmarks, calibration: &Calibration) -> HandPress {
    let mut press = HandPress::default();

    for finger in Finger::ALL {
        let [base, mid, tip] = finger.joints().map(|id| hand.position(id));
        if curl_measure(base, mid, tip) < calibration.threshold(finger) {
            press.tips[finger as usize] = Some(hand.position(finger.tip()));
        }
    }

    press
}
