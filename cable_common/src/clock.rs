//! Monotonic clock abstraction for blocking sequences.
//!
//! Shutdown and homing poll in bounded retry loops: read `now()`, check the
//! condition, `sleep()` one poll interval. [`SystemClock`] does this in real
//! time; [`ManualClock`] advances virtual time on every `sleep()` so tests
//! and simulations never wait.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source with a blocking sleep.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's epoch.
    fn now(&self) -> Duration;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by `Instant` and `thread::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    #[inline]
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Hook run after every virtual sleep, with the new virtual time.
pub type SleepHook = Box<dyn Fn(Duration) + Send + Sync>;

/// Virtual clock: `sleep()` advances time instantly.
///
/// Shared between a controller and a simulated device through `Arc`, so the
/// device sees time pass exactly when the controller waits.
#[derive(Default)]
pub struct ManualClock {
    nanos: AtomicU64,
    hook: Mutex<Option<SleepHook>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor returning a shared handle.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Advance virtual time without running the sleep hook.
    pub fn advance(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Install a hook invoked after every `sleep()`.
    pub fn set_sleep_hook(&self, hook: SleepHook) {
        if let Ok(mut slot) = self.hook.lock() {
            *slot = Some(hook);
        }
    }
}

impl std::fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualClock")
            .field("now", &self.now())
            .finish_non_exhaustive()
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
        let now = self.now();
        if let Ok(slot) = self.hook.lock() {
            if let Some(hook) = slot.as_ref() {
                hook(now);
            }
        }
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now(&self) -> Duration {
        (**self).now()
    }

    #[inline]
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}
