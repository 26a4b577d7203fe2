//! Frequency bar visualization loop.
//!
//! Each animation frame pulls one magnitude snapshot from the analysis node,
//! folds three nearby bins into every bar, runs them through an exponential
//! moving average and eases the rendered height towards the result. Colour,
//! glow and opacity follow the smoothed magnitude. While the overall
//! intensity is high the loop also rolls for decorative particles.
//!
//! Stopping the loop cancels the pending frame and walks the bars back to
//! their baseline one after another, 50ms apart. All deferred work (bar
//! resets, peak hold, particle expiry) is kept as instants and swept on every
//! host frame, whether or not the loop is running.

use rand::Rng;
use std::time::{Duration, Instant};

use super::color::{self, BarColor};
use super::frames::{FrameId, FrameScheduler, FrequencySource, TickScheduler};
use super::particles::ParticleField;

/// Height floor in percent; keeps bars visible at silence
pub const BASELINE_HEIGHT: f32 = 8.0;
/// Weight of the previous value in the per-bar moving average
pub const SMOOTHING_FACTOR: f32 = 0.6;
/// Fraction of the remaining distance covered per frame
pub const HEIGHT_EASING: f32 = 0.2;
pub const PEAK_THRESHOLD: f32 = 200.0;
pub const ACTIVE_THRESHOLD: f32 = 30.0;
pub const PEAK_HOLD: Duration = Duration::from_millis(100);
pub const RESET_STAGGER: Duration = Duration::from_millis(50);
/// Mean magnitude above which particles may spawn
pub const INTENSITY_THRESHOLD: f32 = 80.0;

const SAMPLES_PER_BAR: usize = 3;
const SAMPLE_SPACING: usize = 2;

/// One step of the per-bar exponential moving average.
pub fn smooth(previous: f32, sample: f32) -> f32 {
    previous * SMOOTHING_FACTOR + sample * (1.0 - SMOOTHING_FACTOR)
}

/// Height percentage a smoothed magnitude asks for.
pub fn target_height(smoothed: f32) -> f32 {
    BASELINE_HEIGHT.max((smoothed / 255.0) * 100.0)
}

/// Move `current` a fixed fraction of the way to `target`.
pub fn ease_height(current: f32, target: f32) -> f32 {
    current + (target - current) * HEIGHT_EASING
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualBar {
    pub smoothed: f32,
    pub height: f32,
    /// `None` renders with the theme's resting colours
    pub color: Option<BarColor>,
    pub glow: f32,
    pub opacity: f32,
    pub active: bool,
    pub peak: bool,
    peak_until: Option<Instant>,
    reset_at: Option<Instant>,
}

impl Default for VisualBar {
    fn default() -> Self {
        Self::baseline()
    }
}

impl VisualBar {
    pub fn baseline() -> Self {
        Self {
            smoothed: 0.0,
            height: BASELINE_HEIGHT,
            color: None,
            glow: 0.0,
            opacity: 1.0,
            active: false,
            peak: false,
            peak_until: None,
            reset_at: None,
        }
    }

    fn apply(&mut self, average: f32, now: Instant) {
        self.smoothed = smooth(self.smoothed, average);
        let value = self.smoothed;

        self.height = ease_height(self.height, target_height(value));
        self.color = Some(BarColor::from_magnitude(value));
        self.glow = color::glow_radius(value);
        self.opacity = color::opacity(value);
        self.active = value > ACTIVE_THRESHOLD;

        if value > PEAK_THRESHOLD {
            self.peak = true;
            self.peak_until = Some(now + PEAK_HOLD);
        }
    }

    fn reset(&mut self) {
        *self = Self::baseline();
    }

    fn sweep(&mut self, now: Instant) {
        if let Some(until) = self.peak_until
            && now >= until
        {
            self.peak = false;
            self.peak_until = None;
        }
        if let Some(at) = self.reset_at
            && now >= at
        {
            self.reset();
        }
    }

    pub fn reset_pending(&self) -> bool {
        self.reset_at.is_some()
    }
}

/// Summary of the last rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub mean_intensity: f32,
    pub spawned_particle: bool,
}

pub struct Visualizer<S: FrameScheduler = TickScheduler> {
    bars: Vec<VisualBar>,
    source: Box<dyn FrequencySource>,
    scheduler: S,
    frame: Option<FrameId>,
    data: Vec<u8>,
    particles: ParticleField,
    last_frame: FrameStats,
}

impl<S: FrameScheduler> Visualizer<S> {
    pub fn new(
        bar_count: usize,
        source: Box<dyn FrequencySource>,
        scheduler: S,
        spawn_probability: f64,
    ) -> Self {
        let bins = source.bin_count();
        Self {
            bars: vec![VisualBar::baseline(); bar_count.max(1)],
            source,
            scheduler,
            frame: None,
            data: vec![0; bins],
            particles: ParticleField::new(spawn_probability),
            last_frame: FrameStats::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.frame.is_some()
    }

    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        // Resets still walking back from a previous stop would fight the loop
        for bar in &mut self.bars {
            bar.reset_at = None;
        }
        self.frame = Some(self.scheduler.request_frame());
        log::debug!("Visualization loop started with {} bars", self.bars.len());
    }

    pub fn stop(&mut self, now: Instant) {
        if let Some(id) = self.frame.take() {
            self.scheduler.cancel_frame(id);
            log::debug!("Visualization loop stopped");
        }

        for (index, bar) in self.bars.iter_mut().enumerate() {
            bar.reset_at = Some(now + RESET_STAGGER * index as u32);
        }
    }

    /// Run the frame callback if the host says one is due, then sweep
    /// deferred work. Returns true when a frame was rendered.
    pub fn poll<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> bool {
        let mut rendered = false;

        if let Some(id) = self.scheduler.next_due()
            && self.frame == Some(id)
        {
            self.frame = Some(self.scheduler.request_frame());
            self.render_frame(now, rng);
            rendered = true;
        }

        self.sweep(now);
        rendered
    }

    fn render_frame<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) {
        self.source.fill_byte_frequency_data(&mut self.data);

        let bins = self.data.len();
        if bins == 0 {
            return;
        }
        let stride = bins / self.bars.len();

        for (index, bar) in self.bars.iter_mut().enumerate() {
            let sum: f32 = (0..SAMPLES_PER_BAR)
                .map(|k| {
                    let bin = (index * stride + k * SAMPLE_SPACING).min(bins - 1);
                    self.data[bin] as f32
                })
                .sum();
            bar.apply(sum / SAMPLES_PER_BAR as f32, now);
        }

        let mean = self.data.iter().map(|&b| b as u32).sum::<u32>() as f32 / bins as f32;
        let spawned = mean > INTENSITY_THRESHOLD && self.particles.maybe_spawn(now, rng);

        self.last_frame = FrameStats {
            mean_intensity: mean,
            spawned_particle: spawned,
        };
    }

    pub fn sweep(&mut self, now: Instant) {
        for bar in &mut self.bars {
            bar.sweep(now);
        }
        self.particles.sweep(now);
    }

    pub fn bars(&self) -> &[VisualBar] {
        &self.bars
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleField {
        &mut self.particles
    }

    pub fn last_frame(&self) -> FrameStats {
        self.last_frame
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}
