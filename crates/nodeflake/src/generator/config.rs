use crate::{BitLayout, DEFAULT_EPOCH};
use core::time::Duration;

/// Fixed parameters of a generator.
///
/// Both values are baked into every ID, so they must stay the same for as
/// long as previously issued IDs need to be decoded.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeneratorConfig {
    /// Origin of the timestamp field, as a [`Duration`] since 1970-01-01 UTC.
    pub epoch: Duration,
    pub layout: BitLayout,
}

impl Default for GeneratorConfig {
    /// [`DEFAULT_EPOCH`] with [`BitLayout::REFERENCE`].
    fn default() -> Self {
        Self {
            epoch: DEFAULT_EPOCH,
            layout: BitLayout::REFERENCE,
        }
    }
}

impl GeneratorConfig {
    pub const fn new(epoch: Duration, layout: BitLayout) -> Self {
        Self { epoch, layout }
    }

    /// The epoch in Unix milliseconds, saturating at `i64::MAX`.
    pub fn epoch_millis(&self) -> i64 {
        i64::try_from(self.epoch.as_millis()).unwrap_or(i64::MAX)
    }
}
