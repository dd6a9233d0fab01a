pub mod app;
pub mod config;
pub mod frame_source;
pub mod hand_tracker;
pub mod overlay;
pub mod playback;
