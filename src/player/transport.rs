//! Play/pause/stop/volume state machine for one media element.
//!
//! The controller reacts to two kinds of input: user commands (toggle, play,
//! pause, stop, volume) and lifecycle events reported by the media itself
//! (load start, can play, waiting, playing, paused, ended, error). It starts
//! and stops the visualization loop as playback comes and goes.
//!
//! Nothing here returns an error to the caller. A rejected playback request
//! or a media failure is logged and turned into status text plus the error
//! banner; a missing analysis pipeline only disables the visualizer.

use log::{error, info, warn};
use rand::Rng;
use std::time::{Duration, Instant};

use super::analyser::AnalysisContext;
use super::banner::ErrorBanner;
use super::frames::{FrameScheduler, TickScheduler};
use super::state::{MediaEvent, PlaybackState, StatusMessage, VolumeIcon};
use super::visualizer::Visualizer;
use crate::constants::{BANNER_MEDIA_ERROR, BANNER_PLAYBACK_REJECTED};
use crate::error::PlayerError;

/// Keyboard volume step
pub const VOLUME_STEP: f32 = 0.1;

/// Capabilities of the underlying playable media
pub trait MediaElement {
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self);
    /// Rewind to the beginning; a live stream reconnects on the next play.
    fn seek_to_start(&mut self);
    fn set_volume(&mut self, volume: f32);
    /// Lifecycle events the media noticed on its own since the last frame.
    fn poll_event(&mut self) -> Option<MediaEvent> {
        None
    }
}

/// Everything the visualizer needs, or the reason it could not be built
pub struct AnalysisPipeline<S: FrameScheduler = TickScheduler> {
    pub visualizer: Visualizer<S>,
    pub context: Box<dyn AnalysisContext>,
}

pub struct TransportController<M: MediaElement, S: FrameScheduler = TickScheduler> {
    media: M,
    context: Option<Box<dyn AnalysisContext>>,
    visualizer: Option<Visualizer<S>>,
    state: PlaybackState,
    is_playing: bool,
    status: StatusMessage,
    slider: u8,
    volume: f32,
    volume_icon: VolumeIcon,
    banner: ErrorBanner,
}

impl<M: MediaElement, S: FrameScheduler> TransportController<M, S> {
    pub fn new(
        media: M,
        pipeline: Result<AnalysisPipeline<S>, PlayerError>,
        initial_volume: u8,
        banner_timeout: Duration,
    ) -> Self {
        let (visualizer, context, status) = match pipeline {
            Ok(pipeline) => (
                Some(pipeline.visualizer),
                Some(pipeline.context),
                StatusMessage::Ready,
            ),
            Err(e) => {
                warn!("Audio visualization not supported: {e}");
                (None, None, StatusMessage::VisualizationUnavailable)
            }
        };

        let mut controller = Self {
            media,
            context,
            visualizer,
            state: PlaybackState::Stopped,
            is_playing: false,
            status,
            slider: 0,
            volume: 0.0,
            volume_icon: VolumeIcon::Muted,
            banner: ErrorBanner::new(banner_timeout),
        };
        controller.set_volume(initial_volume);
        controller
    }

    pub fn toggle_play(&mut self, now: Instant) {
        if self.is_playing {
            self.pause(now);
        } else {
            self.play(now);
        }
    }

    pub fn play(&mut self, now: Instant) {
        if let Err(e) = self.try_play() {
            error!("Error playing audio: {e}");
            self.is_playing = false;
            self.state = PlaybackState::Errored;
            self.status = StatusMessage::PlaybackError;
            self.banner.show(BANNER_PLAYBACK_REJECTED, now);
            return;
        }

        self.is_playing = true;
        self.state = PlaybackState::Playing;
        self.status = StatusMessage::NowPlaying;
        self.start_visualization();
        info!("Playback started");
    }

    fn try_play(&mut self) -> Result<(), PlayerError> {
        if let Some(context) = self.context.as_mut()
            && context.is_suspended()
        {
            context
                .resume()
                .map_err(|e| PlayerError::PlaybackRejected(e.to_string()))?;
        }
        self.media.play()
    }

    pub fn pause(&mut self, now: Instant) {
        self.media.pause();
        self.is_playing = false;
        self.state = PlaybackState::Paused;
        self.status = StatusMessage::Paused;
        self.stop_visualization(now);
        info!("Playback paused");
    }

    pub fn stop(&mut self, now: Instant) {
        self.media.pause();
        self.media.seek_to_start();
        if let Some(context) = self.context.as_mut() {
            context.suspend();
        }
        self.is_playing = false;
        self.state = PlaybackState::Stopped;
        self.stop_visualization(now);
        self.status = StatusMessage::Stopped;
        info!("Playback stopped");
    }

    /// Apply a 0-100 slider value.
    pub fn set_volume(&mut self, level: u8) {
        self.slider = level.min(100);
        self.volume = self.slider as f32 / 100.0;
        self.media.set_volume(self.volume);
        self.volume_icon = VolumeIcon::for_level(self.volume);
    }

    /// Keyboard step: clamp to [0, 1], move the slider, then apply it.
    pub fn nudge_volume(&mut self, delta: f32) {
        let target = (self.volume + delta).clamp(0.0, 1.0);
        self.set_volume((target * 100.0).round() as u8);
    }

    pub fn handle_media_event(&mut self, event: MediaEvent, now: Instant) {
        log::debug!("Media event: {event:?}");
        match event {
            MediaEvent::LoadStart => {
                self.state = PlaybackState::Loading;
                self.status = StatusMessage::Connecting;
            }
            MediaEvent::CanPlay => {
                if self.is_playing {
                    self.state = PlaybackState::Playing;
                    self.status = StatusMessage::NowPlaying;
                } else {
                    if self.state == PlaybackState::Loading {
                        self.state = PlaybackState::Stopped;
                    }
                    self.status = StatusMessage::Ready;
                }
            }
            MediaEvent::Waiting => {
                self.state = PlaybackState::Loading;
                self.status = StatusMessage::Buffering;
            }
            MediaEvent::Playing => {
                self.is_playing = true;
                self.state = PlaybackState::Playing;
                self.status = StatusMessage::NowPlaying;
                self.start_visualization();
            }
            MediaEvent::Paused => {
                self.is_playing = false;
                self.state = PlaybackState::Paused;
                self.status = StatusMessage::Paused;
                self.stop_visualization(now);
            }
            MediaEvent::Ended => {
                self.is_playing = false;
                self.state = PlaybackState::Stopped;
                self.status = StatusMessage::Finished;
                self.stop_visualization(now);
                info!("Stream ended");
            }
            MediaEvent::Error(detail) => {
                let err = PlayerError::MediaRuntime(detail);
                error!("Audio error: {err}");
                // Keep the media from later reporting its drained buffer as the end
                self.media.pause();
                self.is_playing = false;
                self.state = PlaybackState::Errored;
                self.status = StatusMessage::StreamError;
                self.stop_visualization(now);
                self.banner.show(BANNER_MEDIA_ERROR, now);
            }
        }
    }

    /// Run one host frame: the visualizer callback if due, then every sweep.
    /// Returns true when a visualizer frame was rendered.
    pub fn tick<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> bool {
        self.banner.sweep(now);
        match self.visualizer.as_mut() {
            Some(visualizer) => visualizer.poll(now, rng),
            None => false,
        }
    }

    fn start_visualization(&mut self) {
        if let Some(visualizer) = self.visualizer.as_mut() {
            visualizer.start();
        }
    }

    fn stop_visualization(&mut self, now: Instant) {
        if let Some(visualizer) = self.visualizer.as_mut() {
            visualizer.stop(now);
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn status(&self) -> StatusMessage {
        self.status
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn slider(&self) -> u8 {
        self.slider
    }

    pub fn volume_icon(&self) -> VolumeIcon {
        self.volume_icon
    }

    /// Pause glyph while playing, play glyph otherwise
    pub fn play_icon(&self) -> &'static str {
        if self.is_playing { "⏸" } else { "▶" }
    }

    pub fn banner(&self) -> &ErrorBanner {
        &self.banner
    }

    pub fn visualizer(&self) -> Option<&Visualizer<S>> {
        self.visualizer.as_ref()
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }
}
