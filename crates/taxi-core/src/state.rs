//! Shared dispatcher state: the fleet map plus the `active` flag, behind a single
//! mutex. Both the primary and the standby dispatcher wrap one of these; only the
//! `active` flag's initial value and whether the rider-request endpoint is bound
//! differ between the two roles.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{AssignError, CoreError};
use crate::matching::find_nearest_in;
use crate::model::{Assignment, Position, RiderId, TaxiId, TaxiRecord};

struct Inner {
    fleet: HashMap<TaxiId, TaxiRecord>,
    active: bool,
}

pub struct DispatchState {
    inner: Mutex<Inner>,
}

impl DispatchState {
    /// `born_active` is `true` for the primary, `false` for the standby.
    pub fn new(born_active: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                fleet: HashMap::new(),
                active: born_active,
            }),
        }
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock().unwrap().active
    }

    /// Sets `active = true`. Idempotent: returns whether this call actually flipped
    /// it, so callers can log state-change events without re-deriving them.
    pub fn activate(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let changed = !inner.active;
        inner.active = true;
        changed
    }

    /// `REGISTRO`: upsert, fully replacing any prior record.
    pub fn register(&self, id: TaxiId, position: Position, speed: u32) {
        let mut inner = self.inner.lock().unwrap();
        inner.fleet.insert(id, TaxiRecord::registered(id, position, speed));
    }

    /// `ACTUALIZACION`: unknown taxi is dropped (never creates a ghost record, spec
    /// §5). `services_done` may only increase; an update reporting a lower count is
    /// ignored for the `busy`/`services_done` fields but still moves `position`.
    pub fn apply_update(
        &self,
        id: TaxiId,
        position: Position,
        ocupado: bool,
        servicios: u32,
    ) -> Result<(), CoreError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner.fleet.get_mut(&id).ok_or(CoreError::UnknownTaxi(id))?;
        record.position = position;
        if servicios >= record.services_done {
            record.services_done = servicios;
            record.busy = ocupado;
        }
        Ok(())
    }

    /// Step 3 of the dispatch protocol: find a candidate under the lock, then
    /// release it. A concurrent ingest (e.g. a re-registration) may intervene
    /// before the commit step re-checks eligibility.
    pub fn find_nearest(&self, rider_position: Position, now: i64) -> Option<TaxiId> {
        let inner = self.inner.lock().unwrap();
        find_nearest_in(&inner.fleet, rider_position, now)
    }

    /// Steps 4-5: re-verify the candidate is still eligible, then commit the
    /// assignment, all under one fresh lock acquisition.
    pub fn recheck_and_commit(
        &self,
        candidate: TaxiId,
        rider_id: RiderId,
        rider_position: Position,
        now: i64,
    ) -> Result<Assignment, AssignError> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner.fleet.get_mut(&candidate).ok_or(AssignError::Race)?;
        if !record.is_eligible(now) {
            return Err(AssignError::Race);
        }
        record.busy = true;
        record.services_done += 1;
        record.last_assignment_at = now;
        Ok(Assignment {
            taxi_id: candidate,
            rider_id,
            rider_position,
            taxi_position_at_assignment: record.position,
            assigned_at: now,
        })
    }

    /// Full dispatch protocol: find a candidate, then re-verify and commit,
    /// composing the two steps above into one call for the common case.
    pub fn try_assign(
        &self,
        rider_id: RiderId,
        rider_position: Position,
        now: i64,
    ) -> Result<Assignment, AssignError> {
        if !self.is_active() {
            return Err(AssignError::NotActive);
        }
        let candidate = self.find_nearest(rider_position, now).ok_or(AssignError::NoTaxi)?;
        self.recheck_and_commit(candidate, rider_id, rider_position, now)
    }

    /// Snapshot for tests and status reporting; never held across I/O.
    pub fn snapshot(&self) -> HashMap<TaxiId, TaxiRecord> {
        self.inner.lock().unwrap().fleet.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_update_moves_position() {
        let state = DispatchState::new(true);
        state.register(1, (0, 0), 2);
        state.apply_update(1, (3, 4), false, 0).unwrap();
        let snap = state.snapshot();
        assert_eq!(snap[&1].position, (3, 4));
    }

    #[test]
    fn update_for_unknown_taxi_is_dropped_not_a_ghost_record() {
        let state = DispatchState::new(true);
        let err = state.apply_update(99, (0, 0), false, 0).unwrap_err();
        assert!(matches!(err, CoreError::UnknownTaxi(99)));
        assert!(state.snapshot().is_empty());
    }

    #[test]
    fn update_cannot_decrease_services_done() {
        let state = DispatchState::new(true);
        state.register(1, (0, 0), 1);
        state.try_assign(1, (0, 0), 0).unwrap();
        assert_eq!(state.snapshot()[&1].services_done, 1);

        // A stale update reporting fewer services than we've already committed must
        // not roll services_done backwards, nor resurrect busy=false.
        state.apply_update(1, (0, 0), false, 0).unwrap();
        assert_eq!(state.snapshot()[&1].services_done, 1);
        assert!(state.snapshot()[&1].busy);
    }

    #[test]
    fn try_assign_commits_under_lock_and_taxi_becomes_ineligible() {
        let state = DispatchState::new(true);
        state.register(1, (5, 5), 2);
        let assignment = state.try_assign(0, (5, 7), 0).unwrap();
        assert_eq!(assignment.taxi_id, 1);
        assert_eq!(assignment.taxi_position_at_assignment, (5, 5));

        let err = state.try_assign(1, (5, 7), 0).unwrap_err();
        assert_eq!(err, AssignError::NoTaxi);
    }

    #[test]
    fn try_assign_on_inactive_dispatcher_fails_without_mutating_state() {
        let state = DispatchState::new(false);
        state.register(1, (5, 5), 2);
        let err = state.try_assign(0, (5, 7), 0).unwrap_err();
        assert_eq!(err, AssignError::NotActive);
        assert!(!state.snapshot()[&1].busy);
    }

    #[test]
    fn race_between_find_and_commit_is_caught() {
        let state = DispatchState::new(true);
        state.register(1, (5, 5), 2);
        let candidate = state.find_nearest((5, 7), 0).expect("one eligible taxi");

        // Simulate a concurrent ingest re-registering the chosen taxi (or, more
        // simply, another request committing first) between find and commit.
        state.register(1, (5, 5), 2);
        state.try_assign(0, (5, 7), 0).unwrap(); // steals it first

        let err = state.recheck_and_commit(candidate, 1, (5, 7), 0).unwrap_err();
        assert_eq!(err, AssignError::Race);
    }

    #[test]
    fn activation_is_idempotent() {
        let state = DispatchState::new(false);
        assert!(!state.is_active());
        assert!(state.activate(), "first activation flips the flag");
        assert!(!state.activate(), "second activation is a no-op");
        assert!(state.is_active());
    }

    #[test]
    fn reregistration_resets_counters_and_cooldown() {
        let state = DispatchState::new(true);
        state.register(3, (0, 0), 1);
        state.try_assign(0, (0, 0), 0).unwrap();
        assert_eq!(state.snapshot()[&3].services_done, 1);

        state.register(3, (1, 1), 1);
        let snap = state.snapshot();
        assert_eq!(snap[&3].services_done, 0);
        assert_eq!(snap[&3].last_assignment_at, 0);
        assert!(!snap[&3].busy);
        assert!(snap[&3].is_eligible(0));
    }
}
