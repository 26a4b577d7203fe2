//! Host capabilities the visualization loop depends on: a per-frame callback
//! scheduler and a source of frequency-domain snapshots.

/// Handle for one requested animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub u64);

pub trait FrameScheduler {
    /// Ask the host to run the frame callback once more.
    fn request_frame(&mut self) -> FrameId;
    /// Withdraw a request; a stale id is ignored.
    fn cancel_frame(&mut self, id: FrameId);
    /// The frame the host is ready to run now, if any.
    fn next_due(&mut self) -> Option<FrameId>;
}

pub trait FrequencySource {
    /// Number of magnitude bins in one snapshot
    fn bin_count(&self) -> usize;
    /// Overwrite `out` with the current magnitude bytes (0-255).
    fn fill_byte_frequency_data(&mut self, out: &mut [u8]);
}

/// Scheduler for the terminal event loop: at most one outstanding request,
/// handed out on the next loop iteration.
#[derive(Debug, Default)]
pub struct TickScheduler {
    next_id: u64,
    pending: Option<FrameId>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl FrameScheduler for TickScheduler {
    fn request_frame(&mut self) -> FrameId {
        self.next_id += 1;
        let id = FrameId(self.next_id);
        self.pending = Some(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }

    fn next_due(&mut self) -> Option<FrameId> {
        self.pending.take()
    }
}
