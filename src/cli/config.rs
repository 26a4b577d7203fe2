use crate::config::Config;
use owo_colors::OwoColorize;
use std::error::Error;
use std::process::Command;

pub fn handle_config_view() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    println!("{}", "Current campo configuration:".bold());
    let station = if config.stream_url.is_empty() {
        "(not set)".dimmed().to_string()
    } else {
        config.stream_url.cyan().to_string()
    };
    println!("  stream_url: {station}");
    println!("  initial_volume: {}", config.initial_volume);
    println!("  bar_count: {}", config.bar_count);
    println!(
        "  analyser: fft {} / smoothing {} / {} to {} dB",
        config.fft_size,
        config.smoothing_time_constant,
        config.min_decibels,
        config.max_decibels
    );
    println!(
        "  particle_spawn_probability: {}",
        config.particle_spawn_probability
    );
    println!(
        "  error_banner_timeout_ms: {}",
        config.error_banner_timeout_ms
    );
    println!("  frame_interval_ms: {}", config.frame_interval_ms);
    println!("  log_file: {}", config.log_file);

    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;

    if key == "stream_url" {
        super::init::validate_source(value.trim())?;
    }
    config.set_value(key, value)?;
    config.save()?;

    println!("Configuration updated: {key} = {value}");

    Ok(())
}

pub fn handle_config_edit() -> Result<(), Box<dyn Error>> {
    // Ensure config exists
    if !Config::exists()? {
        return Err("campo not initialized. Run 'campo init' first.".into());
    }

    let config_path = Config::config_path()?;
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    println!("Opening {} in {}", config_path.display(), editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("Editor '{editor}' not found. Set $EDITOR to a valid editor path.")
            } else {
                format!("Failed to launch editor '{editor}': {e}")
            }
        })?;

    if !status.success() {
        return Err(format!("Editor '{editor}' exited with error").into());
    }

    // Validate the config after editing
    match Config::load() {
        Ok(_) => println!("Configuration saved successfully"),
        Err(e) => {
            return Err(format!("Configuration validation failed: {e}").into());
        }
    }

    Ok(())
}
