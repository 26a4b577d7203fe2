use crate::config::Config;
use crate::stream::{self, StreamInfo};
use crate::utils::progress::create_progress_spinner;
use owo_colors::OwoColorize;
use std::error::Error;

pub fn handle_probe(url: Option<&str>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let url = super::play::resolve_source(url, &config)?;
    if !stream::is_remote(&url) {
        return Err(format!("'{url}' is not an http(s) stream").into());
    }

    let spinner = create_progress_spinner(&format!("Conectando com a terra... {url}"));
    let result = stream::probe(&url);
    spinner.finish_and_clear();

    match result {
        Ok(info) => {
            print_info(&info);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            Err(e.into())
        }
    }
}

fn print_info(info: &StreamInfo) {
    println!("{} {}", "✓".green(), "Station is on the air".bold());
    println!("  url: {}", info.url.cyan());
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    println!("  name: {}", field(&info.station_name));
    println!("  genre: {}", field(&info.genre));
    println!("  description: {}", field(&info.description));
    println!("  content type: {}", field(&info.content_type));
    match info.bitrate_kbps {
        Some(kbps) => println!("  bitrate: {kbps} kbps"),
        None => println!("  bitrate: -"),
    }
}
