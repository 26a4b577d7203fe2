//! HTTP radio streams.
//!
//! A `StreamBuffer` downloads the response body on a background thread into
//! a shared buffer. `StreamReader` hands that buffer to the decoder as a
//! blocking `Read + Seek`: when the decoder outruns the network the reader
//! waits and reports that it starved, then reports again once data is back.
//! Bytes the decoder has moved past are trimmed, keeping a look-behind window
//! for the short backwards seeks format probing does. The fetch thread stops
//! reading while the decoder is far behind, so a paused station holds at
//! most `MAX_AHEAD` unread bytes.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::{
    Arc, Condvar, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use ureq::http::HeaderMap;

use crate::constants::USER_AGENT;
use crate::error::PlayerError;

const READ_CHUNK: usize = 16 * 1024;
const LOOK_BEHIND: usize = 512 * 1024;
/// Unread bytes buffered before the fetch thread waits for the decoder
const MAX_AHEAD: usize = 512 * 1024;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(15);

/// Stream conditions the player cares about
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The decoder is waiting for bytes that have not arrived
    Starved,
    /// Data arrived after a starvation
    Resumed,
    Failed(String),
}

pub type EventHook = Arc<dyn Fn(StreamEvent) + Send + Sync>;

/// Station details announced in the response headers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamInfo {
    pub url: String,
    pub content_type: Option<String>,
    pub station_name: Option<String>,
    pub genre: Option<String>,
    pub bitrate_kbps: Option<u32>,
    pub description: Option<String>,
}

impl StreamInfo {
    pub fn from_headers(url: &str, headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            url: url.to_string(),
            content_type: text("content-type"),
            station_name: text("icy-name"),
            genre: text("icy-genre"),
            bitrate_kbps: text("icy-br").and_then(|v| v.split(',').next()?.trim().parse().ok()),
            description: text("icy-description"),
        }
    }
}

pub fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_connect(Some(CONNECT_TIMEOUT))
        .timeout_recv_response(Some(RESPONSE_TIMEOUT))
        .build()
        .into()
}

fn request(url: &str) -> Result<ureq::http::Response<ureq::Body>, PlayerError> {
    agent()
        .get(url)
        .header("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| PlayerError::Stream(format!("{url}: {e}")))
}

/// Connect and read the station headers without keeping the stream.
pub fn probe(url: &str) -> Result<StreamInfo, PlayerError> {
    let response = request(url)?;
    Ok(StreamInfo::from_headers(url, response.headers()))
}

#[derive(Debug, Default)]
struct Buffer {
    data: Vec<u8>,
    /// Absolute stream position of `data[0]`
    offset: u64,
    /// Absolute position the reader has consumed up to
    read_position: u64,
    finished: bool,
    error: Option<String>,
    closed: bool,
}

impl Buffer {
    fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }

    fn unread(&self) -> u64 {
        self.end().saturating_sub(self.read_position)
    }
}

#[derive(Debug, Default)]
struct Shared {
    buffer: Mutex<Buffer>,
    /// Signalled when data arrives or the body ends
    ready: Condvar,
    /// Signalled when the reader consumes data or goes away
    space: Condvar,
}

pub struct StreamBuffer;

impl StreamBuffer {
    /// Connect to `url` and start downloading in the background.
    pub fn open(url: &str, hook: EventHook) -> Result<(StreamReader, StreamInfo), PlayerError> {
        let response = request(url)?;
        let info = StreamInfo::from_headers(url, response.headers());
        log::info!(
            "Connected to {url} ({})",
            info.content_type.as_deref().unwrap_or("unknown type")
        );

        let body = response.into_body().into_reader();
        Ok((Self::spawn(body, hook), info))
    }

    /// Buffer any byte source on a fetch thread.
    pub fn spawn<R: Read + Send + 'static>(body: R, hook: EventHook) -> StreamReader {
        let shared = Arc::new(Shared::default());
        let fetch_shared = shared.clone();
        let fetch_hook = hook.clone();

        thread::spawn(move || fetch(body, &fetch_shared, &fetch_hook));

        StreamReader {
            shared,
            position: 0,
            hook,
            armed: Arc::new(AtomicBool::new(false)),
            starved: false,
        }
    }
}

fn fetch<R: Read>(mut body: R, shared: &Shared, hook: &EventHook) {
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        if !wait_for_space(shared) {
            log::debug!("Stream closed, fetch thread exiting");
            return;
        }

        let result = body.read(&mut chunk);

        let Ok(mut buffer) = shared.buffer.lock() else {
            return;
        };
        if buffer.closed {
            log::debug!("Stream closed, fetch thread exiting");
            return;
        }

        match result {
            Ok(0) => {
                buffer.finished = true;
                shared.ready.notify_all();
                log::info!("Stream body finished after {} bytes", buffer.end());
                return;
            }
            Ok(n) => {
                buffer.data.extend_from_slice(&chunk[..n]);
                shared.ready.notify_all();
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::error!("Stream read failed: {e}");
                buffer.error = Some(e.to_string());
                shared.ready.notify_all();
                drop(buffer);
                hook(StreamEvent::Failed(e.to_string()));
                return;
            }
        }
    }
}

/// Block until the reader has room for another chunk. False once it is gone.
fn wait_for_space(shared: &Shared) -> bool {
    let Ok(mut buffer) = shared.buffer.lock() else {
        return false;
    };
    while !buffer.closed && buffer.unread() >= MAX_AHEAD as u64 {
        buffer = match shared.space.wait(buffer) {
            Ok(buffer) => buffer,
            Err(_) => return false,
        };
    }
    !buffer.closed
}

/// Lets the engine decide when starvation counts as buffering
#[derive(Debug, Clone)]
pub struct StreamControl {
    armed: Arc<AtomicBool>,
}

impl StreamControl {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::Relaxed);
    }

    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Relaxed);
    }
}

pub struct StreamReader {
    shared: Arc<Shared>,
    position: u64,
    hook: EventHook,
    armed: Arc<AtomicBool>,
    starved: bool,
}

impl StreamReader {
    pub fn control(&self) -> StreamControl {
        StreamControl {
            armed: self.armed.clone(),
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    fn notify(&self, event: StreamEvent) {
        if self.armed.load(Ordering::Relaxed) {
            (self.hook)(event);
        }
    }
}

impl Read for StreamReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        let shared = self.shared.clone();
        let mut buffer = shared
            .buffer
            .lock()
            .map_err(|_| io::Error::other("stream buffer poisoned"))?;

        loop {
            if self.position < buffer.offset {
                return Err(io::Error::other("read position was trimmed"));
            }

            let start = (self.position - buffer.offset) as usize;
            if start < buffer.data.len() {
                let n = out.len().min(buffer.data.len() - start);
                out[..n].copy_from_slice(&buffer.data[start..start + n]);
                self.position += n as u64;

                let behind = (self.position - buffer.offset) as usize;
                if behind > LOOK_BEHIND * 2 {
                    buffer.data.drain(..behind - LOOK_BEHIND);
                    buffer.offset = self.position - LOOK_BEHIND as u64;
                }
                buffer.read_position = self.position;
                shared.space.notify_all();

                if self.starved {
                    self.starved = false;
                    drop(buffer);
                    self.notify(StreamEvent::Resumed);
                }
                return Ok(n);
            }

            if let Some(error) = &buffer.error {
                return Err(io::Error::other(error.clone()));
            }
            if buffer.finished {
                return Ok(0);
            }

            if !self.starved {
                self.starved = true;
                if self.armed.load(Ordering::Relaxed) {
                    log::debug!("Stream starved at byte {}", self.position);
                    (self.hook)(StreamEvent::Starved);
                }
            }

            buffer = shared
                .ready
                .wait(buffer)
                .map_err(|_| io::Error::other("stream buffer poisoned"))?;
        }
    }
}

impl Seek for StreamReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::Current(delta) => self.position as i128 + delta as i128,
            SeekFrom::End(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "live streams have no end",
                ));
            }
        };

        let mut buffer = self
            .shared
            .buffer
            .lock()
            .map_err(|_| io::Error::other("stream buffer poisoned"))?;

        if target < buffer.offset as i128 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before buffered window",
            ));
        }

        self.position = target as u64;
        buffer.read_position = self.position;
        self.shared.space.notify_all();
        Ok(self.position)
    }
}

impl Drop for StreamReader {
    fn drop(&mut self) {
        if let Ok(mut buffer) = self.shared.buffer.lock() {
            buffer.closed = true;
            buffer.data.clear();
        }
        self.shared.ready.notify_all();
        self.shared.space.notify_all();
    }
}
