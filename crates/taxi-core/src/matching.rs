//! The nearest-taxi matching algorithm, kept as a pure function of a fleet snapshot
//! so it is independently testable for determinism: given identical state, it
//! always returns identical output.

use std::collections::HashMap;

use crate::model::{manhattan, Position, TaxiId, TaxiRecord};

/// Among eligible records, the one with minimum Manhattan distance to
/// `rider_position`, breaking ties by lowest taxi id. `None` if no record is
/// eligible.
pub fn find_nearest_in(
    fleet: &HashMap<TaxiId, TaxiRecord>,
    rider_position: Position,
    now: i64,
) -> Option<TaxiId> {
    fleet
        .values()
        .filter(|record| record.is_eligible(now))
        .map(|record| (manhattan(record.position, rider_position), record.id))
        .min()
        .map(|(_, id)| id)
}
