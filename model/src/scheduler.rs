use std::collections::BTreeSet;

/// Identifies one "call me before the next repaint" request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameRequest(pub u64);

/// The host's display-refresh hook. Whoever implements this is responsible for eventually
/// delivering each outstanding request back to the animator, exactly once, unless it's cancelled
/// first.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequest;
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Collects frame requests until the host drains them on its next tick.
#[derive(Default)]
pub struct FrameQueue {
    next_id: u64,
    pending: BTreeSet<FrameRequest>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything requested since the last drain, oldest first
    pub fn drain(&mut self) -> Vec<FrameRequest> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameRequest {
        let request = FrameRequest(self.next_id);
        self.next_id += 1;
        self.pending.insert(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.pending.remove(&request);
    }
}
