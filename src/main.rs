//! Rádio Campo - a terminal streaming radio player.
//!
//! `campo play` tunes into an internet radio stream (or a local audio file)
//! and draws a frequency bar visualizer in the earth-toned palette of the
//! station, with a drifting particle field above the bars. Playback is driven
//! from the keyboard: space toggles, `s` stops, the arrow keys change volume.
//!
//! The remaining commands manage the station configuration (`init`,
//! `config`), check that a stream is reachable before tuning in (`probe`)
//! and generate shell completions.

use campo_radio::cli;
use campo_radio::config::SETTABLE_KEYS;
use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;

#[derive(Parser)]
#[command(name = "campo")]
#[command(about = "Terminal streaming radio player with a frequency bar visualizer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize campo configuration
    Init {
        /// Stream URL to save (prompted for if omitted)
        stream_url: Option<String>,
    },
    /// Show current configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Tune in and launch the visualizer
    Play {
        /// Stream URL or audio file (defaults to the configured station)
        source: Option<String>,
        /// Initial volume, 0 to 100
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
        volume: Option<u8>,
    },
    /// Check that a stream is reachable and show its station details
    Probe {
        /// Stream URL (defaults to the configured station)
        url: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new(SETTABLE_KEYS.iter().copied()))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { stream_url } => {
            cli::init::handle_init(stream_url.as_deref())?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
        Commands::Play { source, volume } => {
            cli::play::handle_play(source.as_deref(), volume)?;
        }
        Commands::Probe { url } => {
            cli::probe::handle_probe(url.as_deref())?;
        }
    }

    Ok(())
}
