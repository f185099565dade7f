//! Time source and sleep primitive used to pace the run loop.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Wall-clock reads and blocking sleep.
///
/// The runner reads `now()` at the start of each iteration and again after
/// the handler returns, then calls `sleep` with whatever remains of the
/// loop period.
pub trait Clock: Send {
    fn now(&self) -> Instant;

    fn sleep(&self, duration: Duration);
}

/// Monotonic system clock backed by `std::thread::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Default)]
struct FakeClockInner {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

/// Manually driven clock for tests.
///
/// Time only moves when `advance` or `sleep` is called. Clones share the
/// same timeline, so a handler holding a clone can simulate work by
/// advancing it while the runner owns another clone.
///
/// # Example
///
/// ```rust
/// use cadence_fsm::runner::{Clock, FakeClock};
/// use std::time::Duration;
///
/// let clock = FakeClock::new();
/// let start = clock.now();
///
/// clock.advance(Duration::from_millis(30));
/// clock.sleep(Duration::from_millis(70));
///
/// assert_eq!(clock.now() - start, Duration::from_millis(100));
/// assert_eq!(clock.sleeps(), vec![Duration::from_millis(70)]);
/// ```
#[derive(Clone, Debug)]
pub struct FakeClock {
    origin: Instant,
    inner: Arc<Mutex<FakeClockInner>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            inner: Arc::new(Mutex::new(FakeClockInner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeClockInner> {
        // A panicking test thread must not wedge every other clone.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        self.lock().elapsed += duration;
    }

    /// Total time elapsed since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.origin + self.lock().elapsed
    }

    fn sleep(&self, duration: Duration) {
        let mut inner = self.lock();
        inner.elapsed += duration;
        inner.sleeps.push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_starts_at_zero() {
        let clock = FakeClock::new();
        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn advance_does_not_record_sleep() {
        let clock = FakeClock::new();
        let start = clock.now();

        clock.advance(Duration::from_millis(5));

        assert_eq!(clock.now() - start, Duration::from_millis(5));
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn clones_share_timeline() {
        let clock = FakeClock::new();
        let handle = clock.clone();

        handle.advance(Duration::from_secs(1));
        clock.sleep(Duration::from_secs(2));

        assert_eq!(handle.elapsed(), Duration::from_secs(3));
        assert_eq!(handle.sleeps(), vec![Duration::from_secs(2)]);
    }

    #[test]
    fn system_clock_sleep_blocks() {
        let clock = SystemClock;
        let start = clock.now();

        clock.sleep(Duration::from_millis(5));

        assert!(clock.now() - start >= Duration::from_millis(5));
    }
}
