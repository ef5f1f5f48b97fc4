// Library surface for the binary, headless integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod composer;
pub mod config;
pub mod history;
pub mod history_db;
pub mod overlay;
pub mod player;
pub mod runtime;
pub mod sequence;
pub mod store;
pub mod ticker;
pub mod time_format;
pub mod ui;

pub use player::{PlayerError, PlayerEvent, PlayerInfo, SequencePlayer};
pub use sequence::{SequenceDefinition, TimerDirection, TimerSpec};
