use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Observable state of a [`SamplingGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Free,
    Busy,
}

/// Single-flight gate admitting at most one sampling cycle at a time.
///
/// Acquisition never waits: a caller either gets a permit immediately or is
/// turned away.
#[derive(Debug, Default)]
pub struct SamplingGate {
    busy: AtomicBool,
}

impl SamplingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to move the gate from FREE to BUSY.
    ///
    /// The returned permit moves the gate back to FREE when dropped, on every
    /// exit path of the cycle that holds it.
    pub fn try_acquire(self: &Arc<Self>) -> Option<GatePermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GatePermit {
                gate: Arc::clone(self),
            })
    }

    pub fn state(&self) -> GateState {
        if self.busy.load(Ordering::Acquire) {
            GateState::Busy
        } else {
            GateState::Free
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state() == GateState::Busy
    }
}

/// Proof of holding the gate. Releases it on drop.
#[derive(Debug)]
pub struct GatePermit {
    gate: Arc<SamplingGate>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}
