//! Per-frame detection: hands in, pressed keys and samples out

use piano_shared::HandLandmarks;

use crate::dispatch::DispatchList;
use crate::layout::{KeyColor, KeyLayout, NoteHit};
use crate::press::{detect_presses, Calibration, HandPress};
use crate::samples::SampleLibrary;

/// A fingertip inside a key box during the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PressEvent {
    pub index: usize,
    pub color: KeyColor,
}

/// Everything the frame loop learns from one frame. Dropped at the end of
/// the iteration; nothing here carries over to the next frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    pub hands: Vec<HandPress>,
    pub presses: Vec<PressEvent>,
    pub dispatch: DispatchList,
}

/// Run the press detector on every hand and resolve the pressed fingertips.
/// Tips are visited hand by hand, thumb to little finger. A key pressed by
/// several fingertips is reported and dispatched once.
pub fn process_hands(
    hands: &[HandLandmarks],
    layout: &KeyLayout,
    calibration: &Calibration,
    library: &SampleLibrary,
) -> FrameOutcome {
    let mut outcome = FrameOutcome::default();

    for hand in hands {
        let press = detect_presses(hand, calibration);

        for (finger, tip) in press.pressed_tips() {
            let key = match layout.resolve(tip) {
                NoteHit::Key(key) => key,
                NoteHit::Miss => {
                    log::debug!("{:?} pressed outside the keyboard at {:?}", finger, tip);
                    continue;
                }
            };

            let event = PressEvent {
                index: key.index,
                color: key.color,
            };
            if outcome.presses.contains(&event) {
                continue;
            }

            outcome.presses.push(event);
            outcome.dispatch.push(library.lookup(&key.label).into_path());
        }

        outcome.hands.push(press);
    }

    outcome
}
