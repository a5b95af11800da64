#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    BitLayout, DecodedId, Error, GeneratorConfig, NextId, NodeIdentity, Result, SystemClock,
    TimeSource,
    generator::mutex::{State, new_state},
};
use core::time::Duration;

/// Mutable part of a generator, guarded by its lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeneratorState {
    /// Wall-clock millisecond of the last successful generation, or `-1`
    /// before the first one.
    pub last_timestamp: i64,
    /// Sequence number issued within `last_timestamp`.
    pub sequence: i64,
}

impl GeneratorState {
    /// State of a generator that has never issued an ID.
    pub const INITIAL: Self = Self {
        last_timestamp: -1,
        sequence: 0,
    };
}

impl Default for GeneratorState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// A lock-based Snowflake ID generator shared by every caller in a process.
///
/// Each ID packs the milliseconds elapsed since the configured epoch, the
/// node's datacenter and worker IDs, and a per-millisecond sequence into a
/// non-negative `i64`. All reads and writes of the generator state happen
/// under one [`parking_lot::Mutex`], so concurrent callers are served one at
/// a time in lock-acquisition order.
///
/// Build one instance at start-up and share it (`Arc<IdGenerator>` or
/// `&'static`) with everything that needs IDs.
///
/// ## Clock safety
/// - A clock reading earlier than the last generation fails with
///   [`Error::ClockRollback`].
/// - A reading past the timestamp field's capacity fails with
///   [`Error::EpochOverflow`].
/// - Exhausting the sequence within one millisecond spins until the clock
///   moves on (about one millisecond at most).
///
/// Failed calls leave the state untouched.
///
/// # Example
/// ```
/// use nodeflake::{GeneratorConfig, IdGenerator, NodeIdentity, SystemClock};
///
/// let config = GeneratorConfig::default();
/// let identity = NodeIdentity::fixed(3, 17);
/// let generator = IdGenerator::new(config, identity, SystemClock).unwrap();
///
/// let id = generator.next_id().unwrap();
/// let decoded = generator.decode(id);
/// assert!(id > 0);
/// assert_eq!(decoded.datacenter_id, 3);
/// assert_eq!(decoded.worker_id, 17);
/// ```
pub struct IdGenerator<T = SystemClock>
where
    T: TimeSource,
{
    layout: BitLayout,
    epoch_millis: i64,
    identity: NodeIdentity,
    state: State<GeneratorState>,
    time: T,
}

impl IdGenerator<SystemClock> {
    /// Resolves the node identity from the host and builds a generator on
    /// the system wall clock.
    ///
    /// Check [`NodeIdentity::is_fallback`] on [`Self::identity`] to find out
    /// whether the shared fallback datacenter ID was used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayout`] if the configured layout does not fit
    /// in 63 bits.
    pub fn from_host(config: GeneratorConfig) -> Result<Self> {
        config.layout.validate()?;
        let identity = NodeIdentity::resolve(&config.layout);
        Self::new(config, identity, SystemClock)
    }
}

impl<T> IdGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator that has not issued any IDs yet.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidLayout`] if the layout does not fit in 63 bits.
    /// - [`Error::IdOutOfRange`] if either identifier does not fit its field.
    pub fn new(config: GeneratorConfig, identity: NodeIdentity, time: T) -> Result<Self> {
        Self::from_components(config, identity, GeneratorState::INITIAL, time)
    }

    /// Creates a generator with explicit starting state.
    ///
    /// Mostly useful in tests that need a generator which has already issued
    /// IDs at a given millisecond. Prefer [`Self::new`] otherwise.
    ///
    /// # Errors
    ///
    /// As [`Self::new`], plus [`Error::IdOutOfRange`] for a sequence that
    /// does not fit its field.
    pub fn from_components(
        config: GeneratorConfig,
        identity: NodeIdentity,
        state: GeneratorState,
        time: T,
    ) -> Result<Self> {
        let layout = config.layout;
        layout.validate()?;
        check_range("datacenter_id", identity.datacenter_id, layout.max_datacenter_id())?;
        check_range("worker_id", identity.worker_id, layout.max_worker_id())?;
        check_range("sequence", state.sequence, layout.max_sequence())?;

        Ok(Self {
            layout,
            epoch_millis: config.epoch_millis(),
            identity,
            state: new_state(state),
            time,
        })
    }

    /// Generates the next ID.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRollback`] if the clock reads earlier than the last
    ///   successful generation.
    /// - [`Error::EpochOverflow`] if the elapsed time no longer fits the
    ///   timestamp field.
    /// - [`Error::ClockBeforeEpoch`] if the clock reads earlier than the
    ///   epoch.
    ///
    /// None of these are retried internally.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<i64> {
        let mut state = self.state.lock();

        let mut now = self.time.current_millis();
        if now < state.last_timestamp {
            return Err(Self::cold_clock_behind(now, state.last_timestamp));
        }
        let mut elapsed = self.elapsed_since_epoch(now)?;

        let sequence = if now == state.last_timestamp {
            let sequence = (state.sequence + 1) & self.layout.max_sequence();
            if sequence == 0 {
                now = self.wait_until_after(state.last_timestamp);
                elapsed = self.elapsed_since_epoch(now)?;
            }
            sequence
        } else {
            0
        };

        state.last_timestamp = now;
        state.sequence = sequence;

        Ok(self.layout.compose(
            elapsed,
            self.identity.datacenter_id,
            self.identity.worker_id,
            sequence,
        ))
    }

    fn elapsed_since_epoch(&self, now: i64) -> Result<i64> {
        let elapsed = now.saturating_sub(self.epoch_millis);
        if elapsed < 0 {
            return Err(Error::ClockBeforeEpoch {
                millis: elapsed.saturating_neg(),
            });
        }
        let max = self.layout.max_timestamp();
        if elapsed > max {
            return Err(Error::EpochOverflow { elapsed, max });
        }
        Ok(elapsed)
    }

    /// Spins until the clock reads strictly later than `last_timestamp`.
    fn wait_until_after(&self, last_timestamp: i64) -> i64 {
        loop {
            let now = self.time.current_millis();
            if now > last_timestamp {
                return now;
            }
            core::hint::spin_loop();
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: i64, last_timestamp: i64) -> Error {
        let millis = last_timestamp - now;
        debug_assert!(millis > 0);
        #[cfg(feature = "tracing")]
        tracing::error!(millis, "clock moved backwards");
        Error::ClockRollback { millis }
    }

    /// Splits an ID issued under this generator's layout into its fields.
    pub fn decode(&self, id: i64) -> DecodedId {
        self.layout.decode(id)
    }

    /// Absolute Unix milliseconds at which `id` was generated.
    pub fn unix_millis(&self, id: i64) -> i64 {
        self.decode(id).timestamp.saturating_add(self.epoch_millis)
    }

    pub fn layout(&self) -> &BitLayout {
        &self.layout
    }

    pub fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch_millis.unsigned_abs())
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Snapshot of the mutable state. Briefly takes the lock.
    pub fn state(&self) -> GeneratorState {
        *self.state.lock()
    }
}

impl<T> NextId for IdGenerator<T>
where
    T: TimeSource,
{
    fn next_id(&self) -> Result<i64> {
        self.next_id()
    }
}

impl<T> core::fmt::Debug for IdGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdGenerator")
            .field("layout", &self.layout)
            .field("epoch_millis", &self.epoch_millis)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

fn check_range(field: &'static str, value: i64, max: i64) -> Result<()> {
    if (0..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::IdOutOfRange { field, value, max })
    }
}
