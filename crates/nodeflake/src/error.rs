/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `nodeflake` can emit.
///
/// The first three variants are raised by [`IdGenerator::next_id`] and leave
/// the generator state untouched, so a later call succeeds once the clock
/// recovers. The remaining variants are only raised while constructing a
/// generator.
///
/// [`IdGenerator::next_id`]: crate::IdGenerator::next_id
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The wall clock reads earlier than the last successful generation.
    ///
    /// Usually caused by an NTP step or a manual clock change. The generator
    /// refuses to issue IDs until the clock catches up again; callers should
    /// surface this as an operational alert.
    #[error("clock moved backwards, refusing to generate an ID for {millis} milliseconds")]
    ClockRollback {
        /// Magnitude of the rollback in milliseconds.
        millis: i64,
    },

    /// The time elapsed since the epoch no longer fits in the timestamp
    /// field. Requires redeploying with a later epoch or a wider field.
    #[error("elapsed time {elapsed} ms exceeds the timestamp field capacity of {max} ms")]
    EpochOverflow {
        /// Milliseconds elapsed since the configured epoch.
        elapsed: i64,
        /// Largest value the timestamp field can hold.
        max: i64,
    },

    /// The wall clock reads earlier than the configured epoch.
    #[error("clock is {millis} milliseconds before the configured epoch")]
    ClockBeforeEpoch {
        /// How far the clock lags behind the epoch, in milliseconds.
        millis: i64,
    },

    /// The field widths do not fit in 63 bits.
    #[error("bit layout uses {total} bits, at most 63 are available")]
    InvalidLayout {
        /// Sum of all configured widths.
        total: u32,
    },

    /// A node identifier does not fit in its field.
    #[error("{field} {value} is out of range (max = {max})")]
    IdOutOfRange {
        /// Which identifier was rejected.
        field: &'static str,
        /// The rejected value.
        value: i64,
        /// Largest value the field can hold.
        max: i64,
    },
}
