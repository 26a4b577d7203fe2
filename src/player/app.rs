//! Main application state and control flow for the radio player.
//!
//! The app owns the transport controller, drains the media event channel,
//! drives the per-frame visualization callback and maps key presses to
//! transport commands. The terminal is set up and restored around the event
//! loop, and everything worth knowing goes to the log file instead of the
//! screen.

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use std::{error::Error, io, path::Path};

use super::analyser::{AnalyserSettings, FrequencyAnalyser, MonitorGate, StreamAnalyser};
use super::audio::AudioEngine;
use super::frames::TickScheduler;
use super::state::MediaEvent;
use super::telemetry::VisualizerTelemetry;
use super::transport::{AnalysisPipeline, MediaElement, TransportController, VOLUME_STEP};
use super::ui;
use super::visualizer::Visualizer;
use crate::config::Config;
use crate::error::PlayerError;

/// Leaves that drift over the bars whether or not anything is playing
pub const AMBIENT_PARTICLES: usize = 12;
const NOTICE_TIMEOUT: Duration = Duration::from_secs(3);

pub struct App<M: MediaElement = AudioEngine> {
    pub should_quit: bool,
    pub controller: TransportController<M>,
    pub telemetry: VisualizerTelemetry,
    pub source: String,
    events_rx: mpsc::Receiver<MediaEvent>,
    rng: StdRng,
    spinner_frame: usize,
    notice: Option<String>,
    notice_until: Option<Instant>,
    now: Instant,
}

impl<M: MediaElement> App<M> {
    pub fn new(
        controller: TransportController<M>,
        events_rx: mpsc::Receiver<MediaEvent>,
        source: &str,
    ) -> Self {
        Self::with_rng(controller, events_rx, source, StdRng::from_os_rng())
    }

    pub fn with_rng(
        controller: TransportController<M>,
        events_rx: mpsc::Receiver<MediaEvent>,
        source: &str,
        rng: StdRng,
    ) -> Self {
        Self {
            should_quit: false,
            controller,
            telemetry: VisualizerTelemetry::new(),
            source: source.to_string(),
            events_rx,
            rng,
            spinner_frame: 0,
            notice: None,
            notice_until: None,
            now: Instant::now(),
        }
    }

    /// One host frame: media events first, then the visualizer and sweeps.
    pub fn on_frame(&mut self, now: Instant) {
        self.now = now;

        while let Ok(event) = self.events_rx.try_recv() {
            self.controller.handle_media_event(event, now);
        }
        if let Some(event) = self.controller.media_mut().poll_event() {
            self.controller.handle_media_event(event, now);
        }

        self.controller.tick(now, &mut self.rng);
        self.telemetry.maybe_capture(&self.controller, now);

        if let Some(until) = self.notice_until
            && now >= until
        {
            self.notice = None;
            self.notice_until.take();
        }

        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => self.controller.toggle_play(now),
            KeyCode::Up => self.controller.nudge_volume(VOLUME_STEP),
            KeyCode::Down => self.controller.nudge_volume(-VOLUME_STEP),
            KeyCode::Char('s') => self.controller.stop(now),
            KeyCode::Char('t') => {
                let enabled = self.telemetry.toggle();
                self.show_notice(
                    if enabled {
                        "Telemetry on"
                    } else {
                        "Telemetry off"
                    },
                    now,
                );
            }
            KeyCode::Char('x') => self.export_telemetry(now),
            _ => {}
        }
    }

    fn export_telemetry(&mut self, now: Instant) {
        match self.telemetry.export_to_dir(&std::env::temp_dir()) {
            Ok(path) => self.show_notice(&format!("Telemetry saved to {}", path.display()), now),
            Err(e) => {
                error!("Telemetry export failed: {e}");
                self.show_notice("Telemetry export failed", now);
            }
        }
    }

    fn show_notice(&mut self, message: &str, now: Instant) {
        self.notice = Some(message.to_string());
        self.notice_until = Some(now + NOTICE_TIMEOUT);
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    /// Instant of the frame being drawn
    pub fn now(&self) -> Instant {
        self.now
    }
}

/// Wire the analyser to the engine's sample channel. Failure here only
/// disables the visualizer.
pub fn build_pipeline(
    config: &Config,
    samples_rx: mpsc::Receiver<Vec<f32>>,
    gate: MonitorGate,
) -> Result<AnalysisPipeline, PlayerError> {
    let analyser = FrequencyAnalyser::new(AnalyserSettings::from_config(config))?;
    let source = StreamAnalyser::new(analyser, samples_rx);

    let mut visualizer = Visualizer::new(
        config.bar_count,
        Box::new(source),
        TickScheduler::new(),
        config.particle_spawn_probability,
    );
    visualizer
        .particles_mut()
        .seed_ambient(AMBIENT_PARTICLES, Instant::now(), &mut rand::rng());

    Ok(AnalysisPipeline {
        visualizer,
        context: Box::new(gate),
    })
}

pub fn run(source: &str, initial_volume: Option<u8>) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    init_logging(&config.log_file)?;
    info!("Starting campo radio with {source}");

    let gate = MonitorGate::new();
    let (mut engine, channels) = AudioEngine::new(source, gate.clone())?;
    engine.load();

    let pipeline = build_pipeline(&config, channels.samples, gate);
    let controller = TransportController::new(
        engine,
        pipeline,
        initial_volume.unwrap_or(config.initial_volume),
        Duration::from_millis(config.error_banner_timeout_ms),
    );
    let mut app = App::new(controller, channels.events, source);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(
        &mut terminal,
        &mut app,
        Duration::from_millis(config.frame_interval_ms.max(1)),
    );

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &res {
        eprintln!("Error: {e}");
    }
    info!("Player closed");
    res
}

fn run_app<B: ratatui::backend::Backend, M: MediaElement>(
    terminal: &mut Terminal<B>,
    app: &mut App<M>,
    frame_interval: Duration,
) -> Result<(), Box<dyn Error>> {
    loop {
        app.on_frame(Instant::now());

        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for events with a short timeout to keep the animation going
        if event::poll(frame_interval)?
            && let Event::Key(key) = event::read()?
        {
            app.handle_key(key, Instant::now());
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn init_logging(log_file: &str) -> Result<(), Box<dyn Error>> {
    use simplelog::{CombinedLogger, LevelFilter, WriteLogger};
    use std::fs::File;

    let path = shellexpand::tilde(log_file);
    if let Some(parent) = Path::new(path.as_ref()).parent() {
        std::fs::create_dir_all(parent)?;
    }

    CombinedLogger::init(vec![WriteLogger::new(
        LevelFilter::Debug,
        simplelog::Config::default(),
        File::create(path.as_ref())?,
    )])?;

    Ok(())
}
