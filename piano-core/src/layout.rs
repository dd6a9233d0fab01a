//! Pixel geometry and note labels of a standard 88-key piano

use piano_shared::Position;
use serde::{Deserialize, Serialize};

pub const WHITE_KEY_COUNT: usize = 52;
pub const BLACK_KEY_COUNT: usize = 36;

/// Index reported by [`NoteHit::Miss`], outside both key ranges
pub const NO_KEY_INDEX: usize = 100;

/// Black keys per octave group, in the order they are laid out
const BLACK_NOTES: [&str; 5] = ["c", "d", "f", "g", "a"];
const WHITE_NOTES: [&str; 7] = ["c", "d", "e", "f", "g", "a", "b"];
const FULL_OCTAVES: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyColor {
    White,
    Black,
}

/// Layout parameters of the on-screen keyboard
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    pub origin_x: i32,
    pub origin_y: i32,
    pub white_width: i32,
    pub white_height: i32,
    pub black_width: i32,
    pub black_height: i32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            origin_x: 40,
            origin_y: 250,
            white_width: 10,
            white_height: 80,
            black_width: 5,
            black_height: 40,
        }
    }
}

impl LayoutParams {
    /// Right and bottom edge of the keyboard, `None` when it does not fit in `i32`
    pub fn extent(&self) -> Option<(i32, i32)> {
        let right = (WHITE_KEY_COUNT as i32)
            .checked_mul(self.white_width)?
            .checked_add(self.origin_x)?
            .checked_add(self.black_width)?;
        let bottom = self
            .origin_y
            .checked_add(self.white_height.max(self.black_height))?;
        Some((right, bottom))
    }
}

/// Rectangular key boundary in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl KeyBox {
    fn at(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            xmin: x,
            ymin: y,
            xmax: x + width,
            ymax: y + height,
        }
    }

    /// Strict containment: a point on an edge is outside
    pub fn contains(&self, pos: Position) -> bool {
        pos.x > self.xmin as f32
            && pos.x < self.xmax as f32
            && pos.y > self.ymin as f32
            && pos.y < self.ymax as f32
    }

    pub fn center(&self) -> Position {
        Position::new(
            (self.xmin + self.xmax) as f32 / 2.0,
            (self.ymin + self.ymax) as f32 / 2.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub index: usize,
    pub color: KeyColor,
    pub bounds: KeyBox,
    pub label: String,
}

/// Result of resolving a fingertip to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteHit<'a> {
    Key(&'a Key),
    Miss,
}

impl NoteHit<'_> {
    pub fn index(&self) -> usize {
        match self {
            NoteHit::Key(key) => key.index,
            NoteHit::Miss => NO_KEY_INDEX,
        }
    }

    pub fn key(&self) -> Option<&Key> {
        match self {
            NoteHit::Key(key) => Some(key),
            NoteHit::Miss => None,
        }
    }
}

/// The full keyboard, built once at startup and read-only afterwards
#[derive(Debug, Clone, PartialEq)]
pub struct KeyLayout {
    white: Vec<Key>,
    black: Vec<Key>,
}

impl KeyLayout {
    pub fn new(params: LayoutParams) -> Self {
        let white_labels = white_labels();
        let black_labels = black_labels();

        let white = white_labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| Key {
                index,
                color: KeyColor::White,
                bounds: KeyBox::at(
                    params.origin_x + index as i32 * params.white_width,
                    params.origin_y,
                    params.white_width,
                    params.white_height,
                ),
                label,
            })
            .collect();

        let black = black_offsets(&params)
            .into_iter()
            .zip(black_labels)
            .enumerate()
            .map(|(index, (x, label))| Key {
                index,
                color: KeyColor::Black,
                bounds: KeyBox::at(x, params.origin_y, params.black_width, params.black_height),
                label,
            })
            .collect();

        Self { white, black }
    }

    pub fn white_keys(&self) -> &[Key] {
        &self.white
    }

    pub fn black_keys(&self) -> &[Key] {
        &self.black
    }

    /// Find the key under `pos`. Black keys sit on top of the white ones,
    /// so they are checked first.
    pub fn resolve(&self, pos: Position) -> NoteHit<'_> {
        self.black
            .iter()
            .chain(self.white.iter())
            .find(|key| key.bounds.contains(pos))
            .map_or(NoteHit::Miss, NoteHit::Key)
    }
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self::new(LayoutParams::default())
    }
}

/// Left edges of the 36 black keys: the lone A#0, then seven groups of
/// 2-then-3 keys skipping the E-F and B-C gaps.
fn black_offsets(params: &LayoutParams) -> Vec<i32> {
    let w = params.white_width;
    let mut x = (params.origin_x as f32 + w as f32 - params.black_width as f32 / 2.0) as i32;
    let mut offsets = Vec::with_capacity(BLACK_KEY_COUNT);

    offsets.push(x);
    x += 2 * w;

    for _ in 0..FULL_OCTAVES {
        for advance in [w, 2 * w, w, w, 2 * w] {
            offsets.push(x);
            x += advance;
        }
    }

    offsets
}

fn white_labels() -> Vec<String> {
    let mut labels = Vec::with_capacity(WHITE_KEY_COUNT);
    labels.push("a0".to_string());
    labels.push("b0".to_string());

    for octave in 1..=FULL_OCTAVES {
        labels.extend(WHITE_NOTES.iter().map(|note| format!("{note}{octave}")));
    }

    labels.push(format!("c{}", FULL_OCTAVES + 1));
    labels
}

fn black_labels() -> Vec<String> {
    let mut labels = Vec::with_capacity(BLACK_KEY_COUNT);
    labels.push("a-0".to_string());

    for octave in 1..=FULL_OCTAVES {
        labels.extend(BLACK_NOTES.iter().map(|note| format!("{note}-{octave}")));
    }

    labels
}
