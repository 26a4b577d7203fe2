//! Audio playback engine with real-time sample monitoring.
//!
//! The engine owns the rodio output stream and sink. Loading happens on a
//! background thread: it connects (or opens the local file), builds the
//! decoder and appends a monitoring source to the paused sink, reporting
//! lifecycle events over a channel as it goes. The monitoring source
//! downmixes what is being played to mono and forwards it in chunks to the
//! frequency analyser while the monitor gate is open.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use super::analyser::MonitorGate;
use super::state::MediaEvent;
use super::transport::MediaElement;
use crate::error::PlayerError;
use crate::stream::{self, EventHook, StreamBuffer, StreamControl, StreamEvent};

/// Mono samples per chunk sent to the analyser
pub const MONITOR_CHUNK: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
    /// The stream broke after it was ready; the next play reconnects
    Interrupted(String),
}

/// Load progress shared with the loader thread. A loader from an earlier
/// generation (superseded by a reload) may no longer write to it.
#[derive(Debug)]
struct LoadSlot {
    generation: u64,
    state: LoadState,
    control: Option<StreamControl>,
}

pub struct EngineChannels {
    pub samples: mpsc::Receiver<Vec<f32>>,
    pub events: mpsc::Receiver<MediaEvent>,
}

pub struct AudioEngine {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Arc<Sink>,
    source: String,
    samples_tx: mpsc::Sender<Vec<f32>>,
    events_tx: mpsc::Sender<MediaEvent>,
    gate: MonitorGate,
    load: Arc<Mutex<LoadSlot>>,
    needs_reload: bool,
    playing: bool,
    ended_reported: bool,
    volume: f32,
}

impl AudioEngine {
    pub fn new(source: &str, gate: MonitorGate) -> Result<(Self, EngineChannels), PlayerError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| PlayerError::Output(e.to_string()))?;
        let sink = new_sink(&stream_handle)?;
        let (samples_tx, samples_rx) = mpsc::channel();
        let (events_tx, events_rx) = mpsc::channel();

        Ok((
            Self {
                _stream: stream,
                stream_handle,
                sink: Arc::new(sink),
                source: source.to_string(),
                samples_tx,
                events_tx,
                gate,
                load: Arc::new(Mutex::new(LoadSlot {
                    generation: 0,
                    state: LoadState::Loading,
                    control: None,
                })),
                needs_reload: false,
                playing: false,
                ended_reported: false,
                volume: 1.0,
            },
            EngineChannels {
                samples: samples_rx,
                events: events_rx,
            },
        ))
    }

    /// Start loading the source in the background.
    pub fn load(&mut self) {
        let generation = match self.load.lock() {
            Ok(mut slot) => {
                slot.generation += 1;
                slot.state = LoadState::Loading;
                slot.control = None;
                slot.generation
            }
            Err(_) => return,
        };

        let loader = Loader {
            generation,
            source: self.source.clone(),
            sink: self.sink.clone(),
            samples_tx: self.samples_tx.clone(),
            events_tx: self.events_tx.clone(),
            gate: self.gate.clone(),
            load: self.load.clone(),
        };

        log::info!("Loading {} (generation {generation})", self.source);
        thread::spawn(move || loader.run());
    }

    fn reload(&mut self) -> Result<(), PlayerError> {
        self.sink.stop();
        let sink = new_sink(&self.stream_handle)?;
        sink.set_volume(self.volume);
        self.sink = Arc::new(sink);
        self.needs_reload = false;
        self.load();
        Ok(())
    }

    pub fn load_state(&self) -> LoadState {
        self.load
            .lock()
            .map(|slot| slot.state.clone())
            .unwrap_or_else(|_| LoadState::Failed("load state poisoned".to_string()))
    }

    fn stream_control(&self) -> Option<StreamControl> {
        self.load.lock().ok().and_then(|slot| slot.control.clone())
    }

}

impl MediaElement for AudioEngine {
    fn play(&mut self) -> Result<(), PlayerError> {
        // After a stop the source is reloaded, which also retries a failed load
        if self.needs_reload || matches!(self.load_state(), LoadState::Interrupted(_)) {
            self.reload()
                .map_err(|e| PlayerError::PlaybackRejected(e.to_string()))?;
        } else if let LoadState::Failed(reason) = self.load_state() {
            return Err(PlayerError::PlaybackRejected(reason));
        }

        self.sink.play();
        if let Some(control) = self.stream_control() {
            control.arm();
        }
        self.playing = true;
        self.ended_reported = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
        if let Some(control) = self.stream_control() {
            control.disarm();
        }
        self.playing = false;
    }

    fn seek_to_start(&mut self) {
        // Live streams cannot rewind; the next play reconnects from scratch
        self.sink.stop();
        self.needs_reload = true;
        self.playing = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.sink.set_volume(volume);
    }

    /// Report the end of the media once a ready, playing sink runs dry.
    fn poll_event(&mut self) -> Option<MediaEvent> {
        if !self.playing || self.ended_reported || self.load_state() != LoadState::Ready {
            return None;
        }
        if self.sink.empty() {
            self.ended_reported = true;
            self.playing = false;
            self.needs_reload = true;
            log::info!("Playback reached the end of {}", self.source);
            return Some(MediaEvent::Ended);
        }
        None
    }
}

fn new_sink(handle: &OutputStreamHandle) -> Result<Sink, PlayerError> {
    let sink = Sink::try_new(handle).map_err(|e| PlayerError::Output(e.to_string()))?;
    sink.pause();
    Ok(sink)
}

struct Loader {
    generation: u64,
    source: String,
    sink: Arc<Sink>,
    samples_tx: mpsc::Sender<Vec<f32>>,
    events_tx: mpsc::Sender<MediaEvent>,
    gate: MonitorGate,
    load: Arc<Mutex<LoadSlot>>,
}

impl Loader {
    fn is_current(&self) -> bool {
        self.load
            .lock()
            .map(|slot| slot.generation == self.generation)
            .unwrap_or(false)
    }

    fn emit(&self, event: MediaEvent) {
        if self.is_current() {
            let _ = self.events_tx.send(event);
        }
    }

    fn run(self) {
        self.emit(MediaEvent::LoadStart);

        let result = if stream::is_remote(&self.source) {
            self.open_remote().map(|decoder| self.attach(decoder))
        } else {
            decode_local(&self.source).map(|decoder| self.attach(decoder))
        };

        let Ok(mut slot) = self.load.lock() else {
            return;
        };
        if slot.generation != self.generation {
            log::debug!("Discarding superseded load of {}", self.source);
            return;
        }

        match result {
            Ok(()) => {
                slot.state = LoadState::Ready;
                drop(slot);
                log::info!("Ready to play {}", self.source);
                let _ = self.events_tx.send(MediaEvent::CanPlay);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", self.source);
                slot.state = LoadState::Failed(e.to_string());
                drop(slot);
                let _ = self.events_tx.send(MediaEvent::Error(e.to_string()));
            }
        }
    }

    fn open_remote(&self) -> Result<Decoder<stream::StreamReader>, PlayerError> {
        let hook = stream_hook(self.events_tx.clone(), self.load.clone(), self.generation);
        let (reader, info) = StreamBuffer::open(&self.source, hook)?;
        if let Some(name) = &info.station_name {
            log::info!("Station: {name}");
        }

        let control = reader.control();
        // play() may have been pressed while we were still connecting
        if !self.sink.is_paused() {
            control.arm();
        }
        if let Ok(mut slot) = self.load.lock()
            && slot.generation == self.generation
        {
            slot.control = Some(control);
        }

        Decoder::new(reader).map_err(|e| PlayerError::Decode(e.to_string()))
    }

    fn attach<R>(&self, decoder: Decoder<R>)
    where
        R: std::io::Read + std::io::Seek + Send + Sync + 'static,
    {
        log::info!(
            "Decoded {}: {} Hz, {} channels",
            self.source,
            decoder.sample_rate(),
            decoder.channels()
        );
        let monitored = MonitoredSource::new(
            decoder.convert_samples::<f32>(),
            self.samples_tx.clone(),
            self.gate.clone(),
        );
        self.sink.append(monitored);
    }
}

/// Translate stream conditions into media events. A failure also marks the
/// load interrupted so the drained sink is not mistaken for the end.
fn stream_hook(
    events_tx: mpsc::Sender<MediaEvent>,
    load: Arc<Mutex<LoadSlot>>,
    generation: u64,
) -> EventHook {
    Arc::new(move |event: StreamEvent| {
        let media_event = match event {
            StreamEvent::Starved => MediaEvent::Waiting,
            StreamEvent::Resumed => MediaEvent::Playing,
            StreamEvent::Failed(reason) => {
                match load.lock() {
                    Ok(mut slot) if slot.generation == generation => {
                        slot.state = LoadState::Interrupted(reason.clone());
                    }
                    _ => return,
                }
                MediaEvent::Error(reason)
            }
        };
        let _ = events_tx.send(media_event);
    })
}

/// Open a local file (with `~` expanded) and build its decoder.
pub fn decode_local(path: &str) -> Result<Decoder<BufReader<File>>, PlayerError> {
    let expanded = shellexpand::tilde(path);
    let file = File::open(expanded.as_ref())
        .map_err(|e| PlayerError::Stream(format!("{expanded}: {e}")))?;
    Decoder::new(BufReader::new(file)).map_err(|e| PlayerError::Decode(e.to_string()))
}

/// Pass-through source that copies a mono mix of what it plays to the
/// analyser channel
pub struct MonitoredSource<S> {
    inner: S,
    samples_tx: mpsc::Sender<Vec<f32>>,
    gate: MonitorGate,
    frame_sum: f32,
    frame_len: u16,
    frame_channels: u16,
    chunk: Vec<f32>,
}

impl<S> MonitoredSource<S>
where
    S: Source<Item = f32>,
{
    pub fn new(inner: S, samples_tx: mpsc::Sender<Vec<f32>>, gate: MonitorGate) -> Self {
        Self {
            inner,
            samples_tx,
            gate,
            frame_sum: 0.0,
            frame_len: 0,
            frame_channels: 1,
            chunk: Vec::with_capacity(MONITOR_CHUNK),
        }
    }

    fn monitor(&mut self, sample: f32) {
        if !self.gate.is_open() {
            return;
        }

        if self.frame_len == 0 {
            self.frame_channels = self.inner.channels().max(1);
        }
        self.frame_sum += sample;
        self.frame_len += 1;

        if self.frame_len >= self.frame_channels {
            self.chunk.push(self.frame_sum / self.frame_channels as f32);
            self.frame_sum = 0.0;
            self.frame_len = 0;

            if self.chunk.len() >= MONITOR_CHUNK {
                let full = std::mem::replace(&mut self.chunk, Vec::with_capacity(MONITOR_CHUNK));
                let _ = self.samples_tx.send(full);
            }
        }
    }
}

impl<S> Iterator for MonitoredSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.inner.next()?;
        self.monitor(sample);
        Some(sample)
    }
}

impl<S> Source for MonitoredSource<S>
where
    S: Source<Item = f32>,
{
    fn current_frame_len(&self) -> Option<usize> {
        self.inner.current_frame_len()
    }

    fn channels(&self) -> u16 {
        self.inner.channels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}
