#![cfg(feature = "player")]

use campo_radio::config::Config;
use campo_radio::constants::{BANNER_PLAYBACK_REJECTED, STATUS_STOPPED};
use campo_radio::error::PlayerError;
use campo_radio::player::analyser::MonitorGate;
use campo_radio::player::app::build_pipeline;
use campo_radio::player::state::{MediaEvent, PlaybackState, StatusMessage, VolumeIcon};
use campo_radio::player::transport::{MediaElement, TransportController};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::mpsc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct RecordedMedia {
    reject_play: bool,
    playing: bool,
    position: u64,
    play_calls: usize,
    volume: f32,
}

impl MediaElement for RecordedMedia {
    fn play(&mut self) -> Result<(), PlayerError> {
        self.play_calls += 1;
        if self.reject_play {
            return Err(PlayerError::PlaybackRejected("connection refused".into()));
        }
        self.playing = true;
        self.position += 1;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek_to_start(&mut self) {
        self.position = 0;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }
}

struct Station {
    controller: TransportController<RecordedMedia>,
    gate: MonitorGate,
    samples_tx: mpsc::Sender<Vec<f32>>,
}

fn tune_in(media: RecordedMedia) -> Station {
    let config = Config::with_stream_url("http://radio.example/live");
    let (samples_tx, samples_rx) = mpsc::channel();
    let gate = MonitorGate::new();
    let pipeline = build_pipeline(&config, samples_rx, gate.clone());
    let controller = TransportController::new(
        media,
        pipeline,
        config.initial_volume,
        Duration::from_millis(config.error_banner_timeout_ms),
    );
    Station {
        controller,
        gate,
        samples_tx,
    }
}

/// A sine sitting exactly on analyser bin 8 for the default 512-point window
fn tone() -> Vec<f32> {
    (0..2048)
        .map(|i| 0.8 * (2.0 * std::f32::consts::PI * 8.0 * i as f32 / 512.0).sin())
        .collect()
}

#[test]
fn test_listening_session() {
    let mut station = tune_in(RecordedMedia::default());
    let mut rng = StdRng::seed_from_u64(11);
    let start = Instant::now();

    assert_eq!(station.controller.state(), PlaybackState::Stopped);
    assert_eq!(station.controller.status(), StatusMessage::Ready);
    assert!(!station.gate.is_open());

    station.controller.toggle_play(start);
    assert_eq!(station.controller.state(), PlaybackState::Playing);
    assert!(station.gate.is_open());
    assert!(station.controller.media().playing);

    station.samples_tx.send(tone()).unwrap();
    for frame in 0..5 {
        let now = start + Duration::from_millis(16 * frame);
        assert!(station.controller.tick(now, &mut rng));
    }
    let bars = station.controller.visualizer().unwrap().bars();
    assert!(bars[1].smoothed > 0.0);
    assert!(bars[1].smoothed > bars[20].smoothed);

    let paused_at = start + Duration::from_millis(100);
    station.controller.toggle_play(paused_at);
    assert_eq!(station.controller.state(), PlaybackState::Paused);
    assert!(!station.controller.visualizer().unwrap().is_running());
    assert!(!station.controller.tick(paused_at, &mut rng));

    station.controller.toggle_play(paused_at);
    assert_eq!(station.controller.state(), PlaybackState::Playing);
    assert_eq!(station.controller.media().position, 2);

    let stopped_at = start + Duration::from_millis(200);
    station.controller.stop(stopped_at);
    assert_eq!(station.controller.state(), PlaybackState::Stopped);
    assert_eq!(station.controller.media().position, 0);
    assert_eq!(station.controller.status().text(), STATUS_STOPPED);
    assert_eq!(station.controller.play_icon(), "▶");
    assert!(!station.gate.is_open());

    // Bars walk back to the baseline one after another
    station
        .controller
        .tick(stopped_at + Duration::from_secs(5), &mut rng);
    let bars = station.controller.visualizer().unwrap().bars();
    assert!(bars.iter().all(|bar| bar.smoothed == 0.0 && !bar.reset_pending()));

    // Tuning back in resumes the analysis the stop suspended
    station
        .controller
        .toggle_play(stopped_at + Duration::from_secs(6));
    assert!(station.gate.is_open());
    assert_eq!(station.controller.state(), PlaybackState::Playing);
}

#[test]
fn test_stream_lifecycle_events() {
    let mut station = tune_in(RecordedMedia::default());
    let now = Instant::now();

    station.controller.handle_media_event(MediaEvent::LoadStart, now);
    assert_eq!(station.controller.state(), PlaybackState::Loading);
    assert!(station.controller.status().is_loading());

    station.controller.handle_media_event(MediaEvent::CanPlay, now);
    assert_eq!(station.controller.state(), PlaybackState::Stopped);
    assert_eq!(station.controller.status(), StatusMessage::Ready);

    station.controller.play(now);
    station.controller.handle_media_event(MediaEvent::Waiting, now);
    assert_eq!(station.controller.status(), StatusMessage::Buffering);
    station.controller.handle_media_event(MediaEvent::Playing, now);
    assert_eq!(station.controller.status(), StatusMessage::NowPlaying);

    station.controller.handle_media_event(MediaEvent::Ended, now);
    assert_eq!(station.controller.state(), PlaybackState::Stopped);
    assert_eq!(station.controller.status(), StatusMessage::Finished);
    assert!(!station.controller.visualizer().unwrap().is_running());
}

#[test]
fn test_rejected_playback_banner_expires() {
    let mut station = tune_in(RecordedMedia {
        reject_play: true,
        ..Default::default()
    });
    let mut rng = StdRng::seed_from_u64(3);
    let now = Instant::now();

    station.controller.play(now);
    assert_eq!(station.controller.media().play_calls, 1);
    assert!(!station.controller.is_playing());
    assert_eq!(station.controller.status(), StatusMessage::PlaybackError);
    assert_eq!(
        station.controller.banner().message(),
        Some(BANNER_PLAYBACK_REJECTED)
    );

    station
        .controller
        .tick(now + Duration::from_millis(4999), &mut rng);
    assert!(station.controller.banner().is_visible());

    station
        .controller
        .tick(now + Duration::from_millis(5000), &mut rng);
    assert!(!station.controller.banner().is_visible());
}

#[test]
fn test_volume_icon_bands() {
    let mut station = tune_in(RecordedMedia::default());
    assert_eq!(station.controller.volume_icon(), VolumeIcon::High);

    for (level, icon) in [
        (0, VolumeIcon::Muted),
        (29, VolumeIcon::Low),
        (30, VolumeIcon::Medium),
        (69, VolumeIcon::Medium),
        (70, VolumeIcon::High),
        (100, VolumeIcon::High),
    ] {
        station.controller.set_volume(level);
        assert_eq!(station.controller.volume_icon(), icon, "level {level}");
        assert_eq!(station.controller.media().volume, level as f32 / 100.0);
    }
}

#[test]
fn test_invalid_analyser_keeps_audio() {
    let mut config = Config::new();
    config.fft_size = 1000;
    let (_tx, rx) = mpsc::channel();
    let pipeline = build_pipeline(&config, rx, MonitorGate::new());
    let mut controller =
        TransportController::new(RecordedMedia::default(), pipeline, 70, Duration::from_secs(5));

    assert_eq!(controller.status(), StatusMessage::VisualizationUnavailable);
    controller.play(Instant::now());
    assert_eq!(controller.state(), PlaybackState::Playing);
    assert!(controller.visualizer().is_none());
}
