//! Project-wide constants used across multiple modules.
//!
//! Status texts are fixed Portuguese strings; they are not configurable.

/// Spinner animation characters for progress indicators
pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub const STATUS_CONNECTING: &str = "Conectando com a terra...";
pub const STATUS_BUFFERING: &str = "Preparando a colheita...";
pub const STATUS_NOW_PLAYING: &str = "🎵 Rádio - A voz do Campo 🎵";
pub const STATUS_READY: &str = "Pronto para tocar a voz do campo";
pub const STATUS_PAUSED: &str = "Transmissão pausada";
pub const STATUS_STOPPED: &str = "Transmissão parada";
pub const STATUS_FINISHED: &str = "Transmissão finalizada";
pub const STATUS_PLAYBACK_ERROR: &str = "Erro ao reproduzir áudio";
pub const STATUS_STREAM_ERROR: &str = "Erro ao carregar a transmissão";
pub const STATUS_NO_VISUALIZER: &str = "Visualização de áudio não suportada neste terminal";

pub const BANNER_PLAYBACK_REJECTED: &str =
    "Não foi possível reproduzir o áudio. Verifique a conexão.";
pub const BANNER_MEDIA_ERROR: &str = "Erro no áudio. Verifique o arquivo ou conexão.";

/// Earth-tone palette for the decorative particles (RGB)
pub const EARTH_COLORS: &[(u8, u8, u8)] = &[
    (0x2e, 0x7d, 0x32),
    (0x4c, 0xaf, 0x50),
    (0x20, 0x0b, 0x03),
    (0xff, 0x8f, 0x00),
    (0x81, 0x3b, 0x26),
];

/// User agent sent with stream requests
pub const USER_AGENT: &str = concat!("campo-radio/", env!("CARGO_PKG_VERSION"));
