use crate::Result;
use std::sync::Arc;

/// The one operation consumers need from a generator.
///
/// Persistence hooks and request handlers should depend on this trait rather
/// than on [`IdGenerator`] directly, so tests can substitute a stub.
///
/// [`IdGenerator`]: crate::IdGenerator
pub trait NextId {
    /// Returns a fresh, positive 63-bit ID.
    ///
    /// # Errors
    ///
    /// Returns the generator's clock errors unchanged; implementations do not
    /// retry.
    fn next_id(&self) -> Result<i64>;
}

impl<G: NextId + ?Sized> NextId for &G {
    fn next_id(&self) -> Result<i64> {
        (**self).next_id()
    }
}

impl<G: NextId + ?Sized> NextId for Arc<G> {
    fn next_id(&self) -> Result<i64> {
        (**self).next_id()
    }
}
