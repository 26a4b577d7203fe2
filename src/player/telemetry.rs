//! Visualizer telemetry for debugging playback and animation behaviour.
//!
//! When enabled, a snapshot of the transport and the visualization loop is
//! captured at most once per interval into a bounded history. Each capture is
//! also written to the log in the configured format, and the whole history
//! can be exported as JSON or CSV.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::frames::FrameScheduler;
use super::transport::{MediaElement, TransportController};

/// Configuration for telemetry collection and output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub enabled: bool,
    /// Number of snapshots kept in memory
    pub buffer_size: usize,
    /// Minimum interval between captures (ms)
    pub capture_interval_ms: u64,
    /// Output format: "json", "csv", "log"
    pub output_format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            buffer_size: 1000,
            capture_interval_ms: 100,
            output_format: "log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameSnapshot {
    pub timestamp: String,
    pub playback_state: String,
    pub status: String,
    pub volume: f32,
    pub mean_intensity: f32,
    pub max_smoothed: f32,
    pub active_bars: usize,
    pub peak_bars: usize,
    pub particles: usize,
    pub banner_visible: bool,
}

impl FrameSnapshot {
    pub fn observe<M: MediaElement, S: FrameScheduler>(
        controller: &TransportController<M, S>,
        timestamp: DateTime<Local>,
    ) -> Self {
        let mut snapshot = Self {
            timestamp: timestamp.to_rfc3339(),
            playback_state: controller.state().as_str().to_string(),
            status: controller.status().text().to_string(),
            volume: controller.volume(),
            mean_intensity: 0.0,
            max_smoothed: 0.0,
            active_bars: 0,
            peak_bars: 0,
            particles: 0,
            banner_visible: controller.banner().is_visible(),
        };

        if let Some(visualizer) = controller.visualizer() {
            let bars = visualizer.bars();
            snapshot.mean_intensity = visualizer.last_frame().mean_intensity;
            snapshot.max_smoothed = bars.iter().map(|b| b.smoothed).fold(0.0, f32::max);
            snapshot.active_bars = bars.iter().filter(|b| b.active).count();
            snapshot.peak_bars = bars.iter().filter(|b| b.peak).count();
            snapshot.particles = visualizer.particles().len();
        }

        snapshot
    }
}

pub struct VisualizerTelemetry {
    config: TelemetryConfig,
    snapshots: VecDeque<FrameSnapshot>,
    last_capture: Option<Instant>,
}

impl Default for VisualizerTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualizerTelemetry {
    pub fn new() -> Self {
        Self::with_config(TelemetryConfig::default())
    }

    pub fn with_config(config: TelemetryConfig) -> Self {
        let buffer_size = config.buffer_size;
        Self {
            config,
            snapshots: VecDeque::with_capacity(buffer_size),
            last_capture: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Flip collection on or off; returns the new setting.
    pub fn toggle(&mut self) -> bool {
        self.config.enabled = !self.config.enabled;
        log::info!(
            "Telemetry {}",
            if self.config.enabled { "enabled" } else { "disabled" }
        );
        self.config.enabled
    }

    /// Capture a snapshot if the interval has elapsed since the last one
    pub fn maybe_capture<M: MediaElement, S: FrameScheduler>(
        &mut self,
        controller: &TransportController<M, S>,
        now: Instant,
    ) {
        if !self.config.enabled {
            return;
        }

        let interval = Duration::from_millis(self.config.capture_interval_ms);
        if let Some(last) = self.last_capture
            && now.duration_since(last) < interval
        {
            return;
        }

        self.add_snapshot(FrameSnapshot::observe(controller, Local::now()));
        self.last_capture = Some(now);
    }

    pub fn force_capture<M: MediaElement, S: FrameScheduler>(
        &mut self,
        controller: &TransportController<M, S>,
    ) {
        if !self.config.enabled {
            return;
        }
        self.add_snapshot(FrameSnapshot::observe(controller, Local::now()));
    }

    fn add_snapshot(&mut self, snapshot: FrameSnapshot) {
        if self.snapshots.len() >= self.config.buffer_size {
            self.snapshots.pop_front();
        }
        self.output_snapshot(&snapshot);
        self.snapshots.push_back(snapshot);
    }

    fn output_snapshot(&self, snapshot: &FrameSnapshot) {
        match self.config.output_format.as_str() {
            "json" => {
                if let Ok(json) = serde_json::to_string(snapshot) {
                    log::debug!("TELEMETRY_JSON: {json}");
                }
            }
            "csv" => log::debug!("TELEMETRY_CSV: {}", csv_line(snapshot)),
            _ => log::debug!(
                "VISUALIZER: state:{} mean:{:.1} max:{:.1} active:{} peaks:{} particles:{} vol:{:.2}",
                snapshot.playback_state,
                snapshot.mean_intensity,
                snapshot.max_smoothed,
                snapshot.active_bars,
                snapshot.peak_bars,
                snapshot.particles,
                snapshot.volume
            ),
        }
    }

    pub fn snapshots(&self) -> &VecDeque<FrameSnapshot> {
        &self.snapshots
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshots)
    }

    pub fn export_csv(&self) -> String {
        let mut csv = String::from(
            "timestamp,state,volume,mean_intensity,max_smoothed,active_bars,peak_bars,particles,banner\n",
        );
        for snapshot in &self.snapshots {
            csv.push_str(&csv_line(snapshot));
            csv.push('\n');
        }
        csv
    }

    /// Write the history into `dir`, as CSV when that is the output format
    /// and as JSON otherwise.
    pub fn export_to_dir(&self, dir: &Path) -> io::Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let (extension, contents) = if self.config.output_format == "csv" {
            ("csv", self.export_csv())
        } else {
            ("json", self.export_json().map_err(io::Error::other)?)
        };

        let path = dir.join(format!("campo-telemetry-{stamp}.{extension}"));
        fs::write(&path, contents)?;
        log::info!(
            "Exported {} telemetry snapshots to {}",
            self.snapshots.len(),
            path.display()
        );
        Ok(path)
    }
}

fn csv_line(snapshot: &FrameSnapshot) -> String {
    format!(
        "{},{},{:.2},{:.1},{:.1},{},{},{},{}",
        snapshot.timestamp,
        snapshot.playback_state,
        snapshot.volume,
        snapshot.mean_intensity,
        snapshot.max_smoothed,
        snapshot.active_bars,
        snapshot.peak_bars,
        snapshot.particles,
        snapshot.banner_visible
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlayerError;
    use crate::player::frames::TickScheduler;
    use crate::player::transport::AnalysisPipeline;
    use tempfile::TempDir;

    struct SilentMedia;

    impl MediaElement for SilentMedia {
        fn play(&mut self) -> Result<(), PlayerError> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn seek_to_start(&mut self) {}
        fn set_volume(&mut self, _volume: f32) {}
    }

    fn controller() -> TransportController<SilentMedia, TickScheduler> {
        let pipeline: Result<AnalysisPipeline, PlayerError> =
            Err(PlayerError::VisualizationUnavailable("test".into()));
        TransportController::new(SilentMedia, pipeline, 40, Duration::from_secs(5))
    }

    fn enabled(buffer_size: usize, interval_ms: u64) -> VisualizerTelemetry {
        VisualizerTelemetry::with_config(TelemetryConfig {
            enabled: true,
            buffer_size,
            capture_interval_ms: interval_ms,
            ..Default::default()
        })
    }

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.buffer_size, 1000);
        assert_eq!(config.capture_interval_ms, 100);
        assert_eq!(config.output_format, "log");
    }

    #[test]
    fn test_disabled_does_not_capture() {
        let mut telemetry = VisualizerTelemetry::new();
        telemetry.maybe_capture(&controller(), Instant::now());
        telemetry.force_capture(&controller());
        assert!(telemetry.snapshots().is_empty());
    }

    #[test]
    fn test_capture_respects_interval() {
        let mut telemetry = enabled(10, 100);
        let controller = controller();
        let now = Instant::now();

        telemetry.maybe_capture(&controller, now);
        telemetry.maybe_capture(&controller, now + Duration::from_millis(50));
        assert_eq!(telemetry.snapshots().len(), 1);

        telemetry.maybe_capture(&controller, now + Duration::from_millis(100));
        assert_eq!(telemetry.snapshots().len(), 2);

        let snapshot = &telemetry.snapshots()[0];
        assert_eq!(snapshot.playback_state, "stopped");
        assert_eq!(snapshot.volume, 0.4);
        assert_eq!(snapshot.active_bars, 0);
        assert!(!snapshot.banner_visible);
    }

    #[test]
    fn test_buffer_size_limit() {
        let mut telemetry = enabled(2, 0);
        let mut controller = controller();

        for level in [10, 20, 30] {
            controller.set_volume(level);
            telemetry.force_capture(&controller);
        }

        assert_eq!(telemetry.snapshots().len(), 2);
        assert_eq!(telemetry.snapshots()[0].volume, 0.2);
        assert_eq!(telemetry.snapshots()[1].volume, 0.3);
    }

    #[test]
    fn test_toggle() {
        let mut telemetry = VisualizerTelemetry::new();
        assert!(telemetry.toggle());
        assert!(telemetry.is_enabled());
        assert!(!telemetry.toggle());
    }

    #[test]
    fn test_export_formats() {
        let mut telemetry = enabled(10, 0);
        let mut controller = controller();
        controller.play(Instant::now());
        telemetry.force_capture(&controller);

        let json = telemetry.export_json().unwrap();
        assert!(json.contains("playback_state"));
        assert!(json.contains("playing"));

        let csv = telemetry.export_csv();
        assert!(csv.starts_with("timestamp,state,volume"));
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains(",playing,0.40,"));
    }

    #[test]
    fn test_export_to_dir() {
        let dir = TempDir::new().unwrap();
        let mut telemetry = enabled(10, 0);
        telemetry.force_capture(&controller());

        let path = telemetry.export_to_dir(dir.path()).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
        let written = fs::read_to_string(path).unwrap();
        let parsed: Vec<FrameSnapshot> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.len(), 1);
    }
}
