//! Primary-key assignment for records about to be inserted.
//!
//! Persistence layers call [`assign_id`] (or [`assign_ids`] for a batch) from
//! their before-insert hook. A record that already carries a non-zero ID is
//! left alone. A generator failure aborts the hook: the record keeps its zero
//! ID and the error is handed back so the insert can be abandoned, never
//! completed with a placeholder key.

use crate::{NextId, Result};

/// A record with an `i64` primary key, where `0` means "not yet assigned".
pub trait Entity {
    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
}

/// Fills in the record's ID if it is still `0`.
///
/// Returns whether an ID was assigned.
///
/// # Errors
///
/// Propagates the generator's error; the record is not modified.
///
/// # Example
/// ```
/// use nodeflake::{Entity, GeneratorConfig, IdGenerator, NodeIdentity, SystemClock, assign_id};
///
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl Entity for User {
///     fn id(&self) -> i64 {
///         self.id
///     }
///     fn set_id(&mut self, id: i64) {
///         self.id = id;
///     }
/// }
///
/// let generator =
///     IdGenerator::new(GeneratorConfig::default(), NodeIdentity::fixed(1, 1), SystemClock).unwrap();
/// let mut user = User { id: 0, name: "ada".into() };
/// assert!(assign_id(&generator, &mut user).unwrap());
/// assert!(user.id > 0);
/// ```
#[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip_all))]
pub fn assign_id<G, E>(generator: &G, entity: &mut E) -> Result<bool>
where
    G: NextId + ?Sized,
    E: Entity + ?Sized,
{
    if entity.id() != 0 {
        return Ok(false);
    }
    let id = generator.next_id()?;
    entity.set_id(id);
    #[cfg(feature = "tracing")]
    tracing::debug!(id, "assigned entity id");
    Ok(true)
}

/// Applies [`assign_id`] to every record in order.
///
/// Returns how many IDs were assigned.
///
/// # Errors
///
/// Stops at the first generator error. Records before it keep their new IDs;
/// the failing record and everything after it are untouched.
pub fn assign_ids<G, E>(generator: &G, entities: &mut [E]) -> Result<usize>
where
    G: NextId + ?Sized,
    E: Entity,
{
    let mut assigned = 0;
    for entity in entities {
        if assign_id(generator, entity)? {
            assigned += 1;
        }
    }
    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use core::cell::Cell;

    #[derive(Debug, Default)]
    struct Record {
        id: i64,
    }

    impl Entity for Record {
        fn id(&self) -> i64 {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = id;
        }
    }

    /// Hands out 100, 101, ... and fails once `fail_at` IDs have been issued.
    struct CountingSource {
        issued: Cell<i64>,
        fail_at: i64,
    }

    impl CountingSource {
        fn new(fail_at: i64) -> Self {
            Self {
                issued: Cell::new(0),
                fail_at,
            }
        }
    }

    impl NextId for CountingSource {
        fn next_id(&self) -> Result<i64> {
            let issued = self.issued.get();
            if issued >= self.fail_at {
                return Err(Error::ClockRollback { millis: 3 });
            }
            self.issued.set(issued + 1);
            Ok(100 + issued)
        }
    }

    #[test]
    fn assigns_only_empty_ids() {
        let source = CountingSource::new(i64::MAX);
        let mut fresh = Record::default();
        let mut existing = Record { id: 7 };

        assert_eq!(assign_id(&source, &mut fresh), Ok(true));
        assert_eq!(assign_id(&source, &mut existing), Ok(false));
        assert_eq!(fresh.id, 100);
        assert_eq!(existing.id, 7);
    }

    #[test]
    fn failure_leaves_record_unassigned() {
        let source = CountingSource::new(0);
        let mut record = Record::default();

        assert_eq!(
            assign_id(&source, &mut record),
            Err(Error::ClockRollback { millis: 3 })
        );
        assert_eq!(record.id, 0);
    }

    #[test]
    fn batch_skips_existing_and_counts_assigned() {
        let source = CountingSource::new(i64::MAX);
        let mut records = vec![Record::default(), Record { id: 9 }, Record::default()];

        assert_eq!(assign_ids(&source, &mut records), Ok(2));
        let ids: Vec<_> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, [100, 9, 101]);
    }

    #[test]
    fn batch_stops_at_first_failure() {
        let source = CountingSource::new(1);
        let mut records = vec![Record::default(), Record::default(), Record::default()];

        assert!(assign_ids(&source, &mut records).is_err());
        let ids: Vec<_> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, [100, 0, 0]);
    }
}
