//! Redraw scheduling.
//!
//! The engine never renders inline. Mutations call `request_redraw`, which
//! cancels any pending frame and asks the scheduler for a new one, so a burst
//! of mutations between two display refreshes costs one render.

#[cfg(test)]
#[path = "frame_test.rs"]
mod frame_test;

use std::cell::RefCell;
use std::rc::Rc;

/// Opaque handle of a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Something that can run the render callback on the next display refresh.
pub trait FrameScheduler {
    /// Schedule one frame. `None` when scheduling is unavailable.
    fn request(&mut self) -> Option<FrameHandle>;

    fn cancel(&mut self, handle: FrameHandle);
}

#[derive(Debug, Default)]
struct QueueState {
    next: i32,
    live: Vec<FrameHandle>,
    requested: usize,
    canceled: usize,
}

/// Headless scheduler that only records requests. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FrameQueue {
    state: Rc<RefCell<QueueState>>,
}

impl FrameQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total frames ever requested.
    #[must_use]
    pub fn requested(&self) -> usize {
        self.state.borrow().requested
    }

    /// Total frames canceled before they ran.
    #[must_use]
    pub fn canceled(&self) -> usize {
        self.state.borrow().canceled
    }

    /// Frames currently scheduled and not canceled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.borrow().live.len()
    }

    /// Mark every pending frame as run, returning how many there were.
    pub fn drain(&self) -> usize {
        let mut state = self.state.borrow_mut();
        let n = state.live.len();
        state.live.clear();
        n
    }
}

impl FrameScheduler for FrameQueue {
    fn request(&mut self) -> Option<FrameHandle> {
        let mut state = self.state.borrow_mut();
        state.next += 1;
        let handle = FrameHandle(state.next);
        state.live.push(handle);
        state.requested += 1;
        Some(handle)
    }

    fn cancel(&mut self, handle: FrameHandle) {
        let mut state = self.state.borrow_mut();
        let before = state.live.len();
        state.live.retain(|h| *h != handle);
        if state.live.len() != before {
            state.canceled += 1;
        }
    }
}
