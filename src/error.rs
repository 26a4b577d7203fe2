//! Error kinds surfaced by the player.
//!
//! The transport controller never hands these to its callers; they are caught
//! at the boundary and turned into status text, the error banner and a log
//! line. The audio engine and the analysis pipeline construct them.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayerError {
    /// The playback request failed (network, decoding, output device).
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),

    /// The media reported an error after playback began.
    #[error("media error: {0}")]
    MediaRuntime(String),

    /// The analysis pipeline could not be built; playback still works.
    #[error("visualization unavailable: {0}")]
    VisualizationUnavailable(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("audio output error: {0}")]
    Output(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_detail() {
        let err = PlayerError::PlaybackRejected("connection refused".to_string());
        assert_eq!(err.to_string(), "playback rejected: connection refused");

        let err = PlayerError::VisualizationUnavailable("fft size 500".to_string());
        assert!(err.to_string().contains("fft size 500"));
    }

    #[test]
    fn test_boxes_into_dyn_error() {
        let boxed: Box<dyn std::error::Error> = PlayerError::Output("no device".into()).into();
        assert_eq!(boxed.to_string(), "audio output error: no device");
    }
}
