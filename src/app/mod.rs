pub mod display;
pub mod setup;

pub use display::sync_vsync_settings;
pub use setup::{StartupFailure, abort_startup};
