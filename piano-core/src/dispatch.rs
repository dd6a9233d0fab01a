//! Frame-over-frame deduplication of playback requests

use std::path::PathBuf;

/// Sample paths to play for one frame, in press order
pub type DispatchList = Vec<PathBuf>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchDecision {
    /// The press set changed: hand this list to the playback worker
    Play(DispatchList),
    /// All keys were released: discard playback requests not yet consumed
    Flush,
    /// Same press set as the previous frame (or still nothing pressed)
    Unchanged,
}

/// Remembers the previous frame's list. Owned by the frame loop only.
#[derive(Debug, Default)]
pub struct Dispatcher {
    previous: DispatchList,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> &[PathBuf] {
        &self.previous
    }

    pub fn update(&mut self, current: DispatchList) -> DispatchDecision {
        if current == self.previous {
            return DispatchDecision::Unchanged;
        }

        let decision = if current.is_empty() {
            DispatchDecision::Flush
        } else {
            DispatchDecision::Play(current.clone())
        };

        self.previous = current;
        decision
    }
}
