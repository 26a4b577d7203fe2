use crate::config::Config;
use crate::stream;
use dialoguer::{Input, theme::ColorfulTheme};
use owo_colors::OwoColorize;
use std::error::Error;

pub fn handle_init(stream_url: Option<&str>) -> Result<(), Box<dyn Error>> {
    // Check if already initialized
    if Config::exists()? {
        return Err(
            "campo is already initialized. Use 'campo config set stream_url <url>' to change the station."
                .into(),
        );
    }

    let stream_url = match stream_url {
        Some(url) => url.trim().to_string(),
        None => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("Stream URL (or path to an audio file)")
            .interact_text()?
            .trim()
            .to_string(),
    };
    validate_source(&stream_url)?;

    let initial_volume: u8 = Input::<u8>::with_theme(&ColorfulTheme::default())
        .with_prompt("Initial volume (0-100)")
        .default(70)
        .validate_with(|v: &u8| {
            if *v <= 100 {
                Ok(())
            } else {
                Err("Volume must be between 0 and 100")
            }
        })
        .interact_text()?;

    let mut config = Config::with_stream_url(stream_url);
    config.initial_volume = initial_volume;
    config.save()?;

    println!("{} campo initialized!", "✓".green());
    println!("  Station: {}", config.stream_url.cyan());
    println!(
        "  Configuration saved to: {}",
        Config::config_path()?.display()
    );
    println!();
    println!("Tune in with {}", "campo play".yellow());

    Ok(())
}

/// A source is either an http(s) stream or a local file that exists.
pub fn validate_source(source: &str) -> Result<(), Box<dyn Error>> {
    if source.is_empty() {
        return Err("Stream URL cannot be empty".into());
    }
    if stream::is_remote(source) {
        return Ok(());
    }
    if source.contains("://") {
        return Err(format!("Unsupported stream scheme in '{source}'; use http or https").into());
    }

    let expanded = shellexpand::tilde(source);
    if !std::path::Path::new(expanded.as_ref()).is_file() {
        return Err(format!("{expanded} is neither a stream URL nor an audio file").into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_source() {
        assert!(validate_source("http://radio.example/live").is_ok());
        assert!(validate_source("https://radio.example/live.mp3").is_ok());
        assert!(validate_source("").is_err());
        assert!(validate_source("rtsp://radio.example/live").is_err());
        assert!(validate_source("/nonexistent/campo.mp3").is_err());

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("campo.mp3");
        std::fs::write(&file, b"id3").unwrap();
        assert!(validate_source(&file.to_string_lossy()).is_ok());
        assert!(validate_source(&dir.path().to_string_lossy()).is_err());
    }
}
