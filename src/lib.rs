pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod stream;
pub mod utils;

#[cfg(feature = "player")]
pub mod player;
