use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// The cooperative environment a protocol operation runs in.
///
/// `should_abort` is consulted on every iteration of every polling loop; once
/// it returns `true` the operation unwinds with a `Reset` outcome. `yield_now`
/// is called whenever a loop has nothing to do.
pub trait LinkContext {
    /// Whether the in-progress operation must stop now.
    fn should_abort(&self) -> bool;

    /// Hand off to other pending work before polling again.
    fn yield_now(&self) {}
}

impl<C: LinkContext + ?Sized> LinkContext for &C {
    fn should_abort(&self) -> bool {
        (**self).should_abort()
    }

    fn yield_now(&self) {
        (**self).yield_now()
    }
}

/// What a context does when asked to yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Idle {
    /// Busy-wait with a spin hint.
    Spin,
    /// Give the rest of the time slice to the OS scheduler.
    #[default]
    ThreadYield,
    /// Sleep for a fixed interval.
    Sleep(Duration),
}

impl Idle {
    pub fn idle(&self) {
        match self {
            Idle::Spin => std::hint::spin_loop(),
            Idle::ThreadYield => std::thread::yield_now(),
            Idle::Sleep(interval) => std::thread::sleep(*interval),
        }
    }
}

/// A shareable reset line.
///
/// Clones observe the same flag, so one clone can be handed to a signal
/// handler or another thread while the protocol polls another.
#[derive(Debug, Clone, Default)]
pub struct ResetSignal {
    flag: Arc<AtomicBool>,
    idle: Idle,
}

impl ResetSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle(idle: Idle) -> Self {
        Self {
            flag: Arc::default(),
            idle,
        }
    }

    /// Raise the reset line.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Lower the reset line so new operations can run.
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl LinkContext for ResetSignal {
    fn should_abort(&self) -> bool {
        self.is_set()
    }

    fn yield_now(&self) {
        self.idle.idle();
    }
}

/// Context for nodes without a reset line: never aborts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverAbort {
    pub idle: Idle,
}

impl LinkContext for NeverAbort {
    fn should_abort(&self) -> bool {
        false
    }

    fn yield_now(&self) {
        self.idle.idle();
    }
}

#[cfg(feature = "tokio")]
impl LinkContext for tokio_util::sync::CancellationToken {
    fn should_abort(&self) -> bool {
        self.is_cancelled()
    }

    fn yield_now(&self) {
        std::thread::yield_now();
    }
}
