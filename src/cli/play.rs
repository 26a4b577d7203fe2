use crate::config::Config;
use std::error::Error;

/// Pick what to play: the argument if given, else the configured station.
pub fn resolve_source(source: Option<&str>, config: &Config) -> Result<String, Box<dyn Error>> {
    match source.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Ok(s.to_string()),
        None if !config.stream_url.is_empty() => Ok(config.stream_url.clone()),
        None => Err(
            "No stream to play. Pass a URL or run 'campo config set stream_url <url>'.".into(),
        ),
    }
}

pub fn handle_play(source: Option<&str>, volume: Option<u8>) -> Result<(), Box<dyn Error>> {
    if let Some(v) = volume
        && v > 100
    {
        return Err("Volume must be between 0 and 100".into());
    }

    let config = Config::load()?;
    let source = resolve_source(source, &config)?;

    #[cfg(feature = "player")]
    {
        crate::player::run(&source, volume)
    }

    #[cfg(not(feature = "player"))]
    {
        let _ = volume;
        use owo_colors::OwoColorize;
        println!("{} {}", "🎵".cyan(), "Rádio Campo".bold());
        println!();
        println!(
            "{} Playing {} requires the 'player' feature to be enabled.",
            "Note:".yellow(),
            source
        );
        println!();
        println!("To enable it, install with:");
        println!("  {}", "cargo install campo-radio --features player".cyan());
        println!();
        println!("Or if building from source:");
        println!("  {}", "cargo build --release --features player".cyan());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argument_wins_over_config() {
        let config = Config::with_stream_url("http://radio.example/live");
        assert_eq!(
            resolve_source(Some("~/campo.mp3"), &config).unwrap(),
            "~/campo.mp3"
        );
        assert_eq!(
            resolve_source(Some("  "), &config).unwrap(),
            "http://radio.example/live"
        );
        assert_eq!(
            resolve_source(None, &config).unwrap(),
            "http://radio.example/live"
        );
    }

    #[test]
    fn test_no_source_is_an_error() {
        assert!(resolve_source(None, &Config::new()).is_err());
    }
}
