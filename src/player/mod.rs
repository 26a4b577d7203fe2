pub mod analyser;
pub mod app;
pub mod audio;
pub mod banner;
pub mod color;
pub mod frames;
pub mod particles;
pub mod state;
pub mod telemetry;
pub mod transport;
pub mod ui;
pub mod visualizer;

use std::error::Error;

/// Tune into `source` (an http(s) stream or a local file) in the terminal UI.
pub fn run(source: &str, volume: Option<u8>) -> Result<(), Box<dyn Error>> {
    app::run(source, volume)
}
