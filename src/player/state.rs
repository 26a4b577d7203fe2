//! Transport-level value types: playback state, status texts, volume icons
//! and the lifecycle events a media element reports.

use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
    Loading,
    Errored,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Stopped => "stopped",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Loading => "loading",
            PlaybackState::Errored => "errored",
        }
    }
}

/// The single line of status text shown under the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMessage {
    Connecting,
    Buffering,
    NowPlaying,
    Ready,
    Paused,
    Stopped,
    Finished,
    PlaybackError,
    StreamError,
    VisualizationUnavailable,
}

impl StatusMessage {
    pub fn text(&self) -> &'static str {
        match self {
            StatusMessage::Connecting => STATUS_CONNECTING,
            StatusMessage::Buffering => STATUS_BUFFERING,
            StatusMessage::NowPlaying => STATUS_NOW_PLAYING,
            StatusMessage::Ready => STATUS_READY,
            StatusMessage::Paused => STATUS_PAUSED,
            StatusMessage::Stopped => STATUS_STOPPED,
            StatusMessage::Finished => STATUS_FINISHED,
            StatusMessage::PlaybackError => STATUS_PLAYBACK_ERROR,
            StatusMessage::StreamError => STATUS_STREAM_ERROR,
            StatusMessage::VisualizationUnavailable => STATUS_NO_VISUALIZER,
        }
    }

    /// Connecting and buffering get a spinner in front of the text
    pub fn is_loading(&self) -> bool {
        matches!(self, StatusMessage::Connecting | StatusMessage::Buffering)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeIcon {
    Muted,
    Low,
    Medium,
    High,
}

impl VolumeIcon {
    /// Threshold bands: 0 muted, (0, 0.3) low, [0.3, 0.7) medium, [0.7, 1] high.
    pub fn for_level(volume: f32) -> Self {
        if volume <= 0.0 {
            VolumeIcon::Muted
        } else if volume < 0.3 {
            VolumeIcon::Low
        } else if volume < 0.7 {
            VolumeIcon::Medium
        } else {
            VolumeIcon::High
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            VolumeIcon::Muted => "🔇",
            VolumeIcon::Low => "🔈",
            VolumeIcon::Medium => "🔉",
            VolumeIcon::High => "🔊",
        }
    }
}

/// Signals reported by the media element, as opposed to user commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEvent {
    LoadStart,
    CanPlay,
    Waiting,
    Playing,
    Paused,
    Ended,
    Error(String),
}
