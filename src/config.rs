//! Application configuration management.
//!
//! This module handles the persistent configuration for campo-radio: the
//! stream to tune into, the initial volume, the visualizer geometry and the
//! analyser parameters, plus the decorative tuning knobs (particle spawn
//! probability, error banner timeout). Configuration is stored in the user's
//! config directory (typically ~/.config/campo/config.toml); a missing file
//! yields the defaults.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::PathBuf;

/// Keys accepted by `campo config set`
pub const SETTABLE_KEYS: &[&str] = &[
    "stream_url",
    "initial_volume",
    "bar_count",
    "particle_spawn_probability",
    "error_banner_timeout_ms",
    "frame_interval_ms",
    "log_file",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stream_url: String,
    #[serde(default = "default_initial_volume")]
    pub initial_volume: u8,
    #[serde(default = "default_bar_count")]
    pub bar_count: usize,
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_smoothing_time_constant")]
    pub smoothing_time_constant: f32,
    #[serde(default = "default_min_decibels")]
    pub min_decibels: f32,
    #[serde(default = "default_max_decibels")]
    pub max_decibels: f32,
    #[serde(default = "default_particle_spawn_probability")]
    pub particle_spawn_probability: f64,
    #[serde(default = "default_error_banner_timeout_ms")]
    pub error_banner_timeout_ms: u64,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_initial_volume() -> u8 {
    70
}

fn default_bar_count() -> usize {
    32
}

fn default_fft_size() -> usize {
    512
}

fn default_smoothing_time_constant() -> f32 {
    0.8
}

fn default_min_decibels() -> f32 {
    -100.0
}

fn default_max_decibels() -> f32 {
    -30.0
}

fn default_particle_spawn_probability() -> f64 {
    0.2
}

fn default_error_banner_timeout_ms() -> u64 {
    5000
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_log_file() -> String {
    std::env::temp_dir()
        .join("campo-radio.log")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            stream_url: String::new(),
            initial_volume: default_initial_volume(),
            bar_count: default_bar_count(),
            fft_size: default_fft_size(),
            smoothing_time_constant: default_smoothing_time_constant(),
            min_decibels: default_min_decibels(),
            max_decibels: default_max_decibels(),
            particle_spawn_probability: default_particle_spawn_probability(),
            error_banner_timeout_ms: default_error_banner_timeout_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            log_file: default_log_file(),
        }
    }

    pub fn with_stream_url(stream_url: impl Into<String>) -> Self {
        Self {
            stream_url: stream_url.into(),
            ..Self::new()
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("campo")
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join("campo")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match key {
            "stream_url" => self.stream_url = value.trim().to_string(),
            "initial_volume" => {
                let volume = value
                    .parse::<u8>()
                    .map_err(|_| "Value must be an integer between 0 and 100")?;
                if volume > 100 {
                    return Err("Value must be an integer between 0 and 100".into());
                }
                self.initial_volume = volume;
            }
            "bar_count" => {
                let count = value
                    .parse::<usize>()
                    .map_err(|_| "Value must be a positive integer")?;
                if count == 0 {
                    return Err("Value must be a positive integer".into());
                }
                self.bar_count = count;
            }
            "particle_spawn_probability" => {
                let probability = value
                    .parse::<f64>()
                    .map_err(|_| "Value must be a number between 0.0 and 1.0")?;
                if !(0.0..=1.0).contains(&probability) {
                    return Err("Value must be a number between 0.0 and 1.0".into());
                }
                self.particle_spawn_probability = probability;
            }
            "error_banner_timeout_ms" => {
                self.error_banner_timeout_ms = value
                    .parse::<u64>()
                    .map_err(|_| "Value must be a number of milliseconds")?;
            }
            "frame_interval_ms" => {
                let interval = value
                    .parse::<u64>()
                    .map_err(|_| "Value must be a number of milliseconds")?;
                if interval == 0 {
                    return Err("Frame interval must be at least 1ms".into());
                }
                self.frame_interval_ms = interval;
            }
            "log_file" => self.log_file = shellexpand::tilde(value).to_string(),
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        Ok(())
    }
}
