//! Key geometry, press detection and playback dispatch for the virtual piano.
//!
//! Everything in here is frame-local and free of I/O except the one-time
//! listing of the sample directory.

pub mod dispatch;
pub mod frame;
pub mod layout;
pub mod press;
pub mod samples;

pub use dispatch::{DispatchDecision, DispatchList, Dispatcher};
pub use frame::{process_hands, FrameOutcome, PressEvent};
pub use layout::{Key, KeyBox, KeyColor, KeyLayout, LayoutParams, NoteHit, NO_KEY_INDEX};
pub use press::{detect_presses, Calibration, Finger, HandPress};
pub use samples::{SampleLibrary, SampleLookup};
