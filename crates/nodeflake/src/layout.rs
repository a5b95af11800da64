use crate::{Error, Result};
use core::{fmt, time::Duration};

/// Field widths of a 63-bit ID.
///
/// The sign bit is always reserved, so every ID is a non-negative `i64`.
/// Fields are packed from the least significant end in the order sequence,
/// worker ID, datacenter ID, timestamp:
///
/// ```text
///  Bit Index:  63           63 62            22 21         17 16       12 11             0
///              +--------------+----------------+-------------+-----------+---------------+
///  Field:      | reserved (1) | timestamp (41) | datacenter  | worker    | sequence (12) |
///              |              |                | ID (5)      | ID (5)    |               |
///              +--------------+----------------+-------------+-----------+---------------+
/// ```
///
/// Changing a layout after IDs have been persisted makes those IDs
/// undecodable; treat it as fixed for the life of a deployment.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BitLayout {
    timestamp_bits: u32,
    datacenter_id_bits: u32,
    worker_id_bits: u32,
    sequence_bits: u32,
}

impl Default for BitLayout {
    fn default() -> Self {
        Self::REFERENCE
    }
}

impl BitLayout {
    /// Total bits available once the sign bit is reserved.
    pub const MAX_BITS: u32 = 63;

    /// 41-bit timestamp, 5-bit datacenter ID, 5-bit worker ID, 12-bit
    /// sequence.
    pub const REFERENCE: Self = Self {
        timestamp_bits: 41,
        datacenter_id_bits: 5,
        worker_id_bits: 5,
        sequence_bits: 12,
    };

    /// Creates a layout, rejecting widths that sum past [`Self::MAX_BITS`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayout`] when the widths do not fit.
    pub const fn new(
        timestamp_bits: u32,
        datacenter_id_bits: u32,
        worker_id_bits: u32,
        sequence_bits: u32,
    ) -> Result<Self> {
        let layout = Self {
            timestamp_bits,
            datacenter_id_bits,
            worker_id_bits,
            sequence_bits,
        };
        match layout.validate() {
            Ok(()) => Ok(layout),
            Err(e) => Err(e),
        }
    }

    /// Checks that the widths fit in 63 bits.
    ///
    /// Layouts built through [`Self::new`] are always valid; this exists for
    /// layouts that arrive through deserialization.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLayout`] when the widths do not fit.
    pub const fn validate(&self) -> Result<()> {
        let total = self.timestamp_bits as u64
            + self.datacenter_id_bits as u64
            + self.worker_id_bits as u64
            + self.sequence_bits as u64;
        if total > Self::MAX_BITS as u64 {
            return Err(Error::InvalidLayout {
                total: if total > u32::MAX as u64 {
                    u32::MAX
                } else {
                    total as u32
                },
            });
        }
        Ok(())
    }

    pub const fn timestamp_bits(&self) -> u32 {
        self.timestamp_bits
    }

    pub const fn datacenter_id_bits(&self) -> u32 {
        self.datacenter_id_bits
    }

    pub const fn worker_id_bits(&self) -> u32 {
        self.worker_id_bits
    }

    pub const fn sequence_bits(&self) -> u32 {
        self.sequence_bits
    }

    /// Number of bits to shift the worker ID to its position.
    pub const fn worker_id_shift(&self) -> u32 {
        self.sequence_bits
    }

    /// Number of bits to shift the datacenter ID to its position.
    pub const fn datacenter_id_shift(&self) -> u32 {
        self.sequence_bits + self.worker_id_bits
    }

    /// Number of bits to shift the timestamp to its position.
    pub const fn timestamp_shift(&self) -> u32 {
        self.sequence_bits + self.worker_id_bits + self.datacenter_id_bits
    }

    /// Largest elapsed-milliseconds value the timestamp field can hold.
    pub const fn max_timestamp(&self) -> i64 {
        mask(self.timestamp_bits)
    }

    pub const fn max_datacenter_id(&self) -> i64 {
        mask(self.datacenter_id_bits)
    }

    pub const fn max_worker_id(&self) -> i64 {
        mask(self.worker_id_bits)
    }

    /// Largest sequence value; also the mask applied when the sequence
    /// increments.
    pub const fn max_sequence(&self) -> i64 {
        mask(self.sequence_bits)
    }

    /// Packs the four fields into an ID.
    ///
    /// Each component is masked to its width, so out-of-range inputs cannot
    /// bleed into neighbouring fields.
    pub const fn compose(
        &self,
        timestamp: i64,
        datacenter_id: i64,
        worker_id: i64,
        sequence: i64,
    ) -> i64 {
        ((timestamp & self.max_timestamp()) << self.timestamp_shift())
            | ((datacenter_id & self.max_datacenter_id()) << self.datacenter_id_shift())
            | ((worker_id & self.max_worker_id()) << self.worker_id_shift())
            | (sequence & self.max_sequence())
    }

    /// Splits an ID back into its fields.
    ///
    /// ```
    /// use nodeflake::BitLayout;
    ///
    /// let layout = BitLayout::REFERENCE;
    /// let id = layout.compose(1_000, 3, 17, 42);
    /// let decoded = layout.decode(id);
    /// assert_eq!(decoded.timestamp, 1_000);
    /// assert_eq!(decoded.datacenter_id, 3);
    /// assert_eq!(decoded.worker_id, 17);
    /// assert_eq!(decoded.sequence, 42);
    /// ```
    pub const fn decode(&self, id: i64) -> DecodedId {
        DecodedId {
            timestamp: (id >> self.timestamp_shift()) & self.max_timestamp(),
            datacenter_id: (id >> self.datacenter_id_shift()) & self.max_datacenter_id(),
            worker_id: (id >> self.worker_id_shift()) & self.max_worker_id(),
            sequence: id & self.max_sequence(),
        }
    }
}

const fn mask(bits: u32) -> i64 {
    if bits == 0 {
        0
    } else if bits >= BitLayout::MAX_BITS {
        i64::MAX
    } else {
        (u64::MAX >> (64 - bits)) as i64
    }
}

/// The fields of an ID, as recovered by [`BitLayout::decode`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecodedId {
    /// Milliseconds since the generator's epoch.
    pub timestamp: i64,
    pub datacenter_id: i64,
    pub worker_id: i64,
    /// Position within the millisecond.
    pub sequence: i64,
}

impl DecodedId {
    /// Returns the absolute timestamp in milliseconds since the Unix epoch.
    pub fn unix_millis(&self, epoch: Duration) -> i64 {
        let epoch = i64::try_from(epoch.as_millis()).unwrap_or(i64::MAX);
        self.timestamp.saturating_add(epoch)
    }
}

impl fmt::Display for DecodedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timestamp={} datacenter_id={} worker_id={} sequence={}",
            self.timestamp, self.datacenter_id, self.worker_id, self.sequence
        )
    }
}
