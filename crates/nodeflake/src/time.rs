use core::time::Duration;
use portable_atomic::{AtomicI64, Ordering};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

/// Default epoch: Sunday, January 1, 2023 00:00:00 UTC+8
///
/// With the reference 41-bit timestamp field this leaves roughly 69 years of
/// headroom.
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_672_502_400_000);

/// A source of wall-clock time in milliseconds since the Unix epoch.
///
/// The generator subtracts its configured epoch itself, so implementations
/// report absolute Unix milliseconds. Swap in a [`ManualClock`] (or any custom
/// type) to simulate rollback and overflow deterministically.
///
/// # Example
///
/// ```
/// use nodeflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> i64 {
///         1_700_000_000_000
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1_700_000_000_000);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since 1970-01-01 UTC.
    fn current_millis(&self) -> i64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> i64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> i64 {
        (**self).current_millis()
    }
}

/// The operating system's wall clock.
///
/// Every call reads [`SystemTime::now`], so clock steps (NTP corrections,
/// manual changes) are visible to the generator and trip its rollback check.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since) => i64::try_from(since.as_millis()).unwrap_or(i64::MAX),
            // Pre-1970 clocks are reported as negative offsets.
            Err(e) => -i64::try_from(e.duration().as_millis()).unwrap_or(i64::MAX),
        }
    }
}

/// A clock that only moves when told to.
///
/// Cloning shares the underlying reading, so a test can keep one handle and
/// hand another to the generator.
///
/// ```
/// use nodeflake::{ManualClock, TimeSource};
///
/// let clock = ManualClock::new(1_000);
/// let handle = clock.clone();
/// handle.advance(5);
/// assert_eq!(clock.current_millis(), 1_005);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    /// Creates a clock reading `millis` since the Unix epoch.
    pub fn new(millis: i64) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(millis)),
        }
    }

    /// Sets the current reading, which may move backwards.
    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::Release);
    }

    /// Moves the clock forward (or backward, for negative `delta`).
    pub fn advance(&self, delta: i64) {
        self.millis.fetch_add(delta, Ordering::AcqRel);
    }
}

impl TimeSource for ManualClock {
    fn current_millis(&self) -> i64 {
        self.millis.load(Ordering::Acquire)
    }
}
