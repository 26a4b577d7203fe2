//! Real-time spectral analysis feeding the visualizer.
//!
//! `FrequencyAnalyser` behaves like a browser analyser node: it keeps the most
//! recent `fft_size` mono samples, applies a Blackman window, runs a forward
//! FFT, smooths the normalised magnitudes over time and maps them from the
//! configured decibel range onto bytes. `StreamAnalyser` pulls the sample
//! chunks the audio monitor sends over a channel before every snapshot.
//!
//! The monitor is gated by a `MonitorGate`, which plays the role of an audio
//! context: it starts suspended and drops samples until resumed.

use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::collections::VecDeque;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
    mpsc,
};

use super::frames::FrequencySource;
use crate::config::Config;
use crate::error::PlayerError;

pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32768;

/// An audio context that may need resuming before analysis can run
pub trait AnalysisContext {
    fn is_suspended(&self) -> bool;
    fn resume(&mut self) -> Result<(), PlayerError>;
    /// Stop feeding the analyser until the next resume.
    fn suspend(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyserSettings {
    pub fft_size: usize,
    pub smoothing_time_constant: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self {
            fft_size: 512,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fft_size: config.fft_size,
            smoothing_time_constant: config.smoothing_time_constant,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
        }
    }

    pub fn validate(&self) -> Result<(), PlayerError> {
        if !self.fft_size.is_power_of_two()
            || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(PlayerError::VisualizationUnavailable(format!(
                "fft size {} must be a power of two between {MIN_FFT_SIZE} and {MAX_FFT_SIZE}",
                self.fft_size
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(PlayerError::VisualizationUnavailable(format!(
                "smoothing time constant {} outside [0, 1]",
                self.smoothing_time_constant
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(PlayerError::VisualizationUnavailable(format!(
                "decibel range [{}, {}] is empty",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

pub struct FrequencyAnalyser {
    settings: AnalyserSettings,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    samples: VecDeque<f32>,
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl FrequencyAnalyser {
    pub fn new(settings: AnalyserSettings) -> Result<Self, PlayerError> {
        settings.validate()?;

        let size = settings.fft_size;
        let fft = FftPlanner::<f32>::new().plan_fft_forward(size);

        // Blackman window
        let window = (0..size)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
                0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
            })
            .collect();

        Ok(Self {
            fft,
            window,
            samples: VecDeque::from(vec![0.0; size]),
            smoothed: vec![0.0; size / 2],
            scratch: vec![Complex::new(0.0, 0.0); size],
            settings,
        })
    }

    pub fn settings(&self) -> &AnalyserSettings {
        &self.settings
    }

    /// Append mono samples, keeping only the newest `fft_size`.
    pub fn push_samples(&mut self, new_samples: &[f32]) {
        for &sample in new_samples {
            self.samples.push_back(sample);
        }
        while self.samples.len() > self.settings.fft_size {
            self.samples.pop_front();
        }
    }

    fn update_spectrum(&mut self) {
        for ((slot, &sample), &w) in self
            .scratch
            .iter_mut()
            .zip(self.samples.iter())
            .zip(self.window.iter())
        {
            *slot = Complex::new(sample * w, 0.0);
        }

        self.fft.process(&mut self.scratch);

        let tau = self.settings.smoothing_time_constant;
        let scale = 1.0 / self.settings.fft_size as f32;
        for (smoothed, bin) in self.smoothed.iter_mut().zip(self.scratch.iter()) {
            let magnitude = bin.norm() * scale;
            let value = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if value.is_finite() { value } else { 0.0 };
        }
    }

    /// Compute a fresh snapshot into `out` (one byte per bin).
    pub fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.update_spectrum();

        let min = self.settings.min_decibels;
        let range = self.settings.max_decibels - min;
        for (byte, &magnitude) in out.iter_mut().zip(self.smoothed.iter()) {
            let db = 20.0 * magnitude.log10();
            let scaled = 255.0 / range * (db - min);
            *byte = if scaled.is_finite() {
                scaled.clamp(0.0, 255.0) as u8
            } else {
                0
            };
        }
    }
}

/// Analyser fed by the audio monitor's sample channel
pub struct StreamAnalyser {
    analyser: FrequencyAnalyser,
    samples_rx: mpsc::Receiver<Vec<f32>>,
}

impl StreamAnalyser {
    pub fn new(analyser: FrequencyAnalyser, samples_rx: mpsc::Receiver<Vec<f32>>) -> Self {
        Self {
            analyser,
            samples_rx,
        }
    }
}

impl FrequencySource for StreamAnalyser {
    fn bin_count(&self) -> usize {
        self.analyser.settings.fft_size / 2
    }

    fn fill_byte_frequency_data(&mut self, out: &mut [u8]) {
        while let Ok(chunk) = self.samples_rx.try_recv() {
            self.analyser.push_samples(&chunk);
        }
        self.analyser.byte_frequency_data(out);
    }
}

/// Shared switch between the UI thread and the audio monitor
#[derive(Debug, Clone)]
pub struct MonitorGate {
    open: Arc<AtomicBool>,
}

impl Default for MonitorGate {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorGate {
    /// Starts suspended, like an audio context before a user gesture
    pub fn new() -> Self {
        Self {
            open: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }
}

impl AnalysisContext for MonitorGate {
    fn is_suspended(&self) -> bool {
        !self.is_open()
    }

    fn resume(&mut self) -> Result<(), PlayerError> {
        self.open.store(true, Ordering::Relaxed);
        log::debug!("Analysis context resumed");
        Ok(())
    }

    fn suspend(&mut self) {
        self.open.store(false, Ordering::Relaxed);
        log::debug!("Analysis context suspended");
    }
}
