//! Teacher availability tracking.
//!
//! Per-teacher, per-slot occupancy built up as assignments are committed.
//! The tracker is the single source of truth against double-booking for
//! one batch run: it is created per run and dropped afterwards.
//!
//! Every committed pair remembers the class that holds it, so a
//! reservation made on behalf of a class is recognized as that class's own
//! and can be rolled back with it.

use std::collections::BTreeMap;

use crate::error::TrackerError;
use crate::models::{ClassId, Slot, TeacherId};

/// Batch-scoped teacher occupancy.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityTracker {
    occupied: BTreeMap<TeacherId, BTreeMap<Slot, ClassId>>,
    commits: usize,
}

impl AvailabilityTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `teacher` has nothing committed at `slot`.
    pub fn is_free(&self, teacher: &TeacherId, slot: &Slot) -> bool {
        self.holder(teacher, slot).is_none()
    }

    /// Class holding `teacher` at `slot`, if any.
    pub fn holder(&self, teacher: &TeacherId, slot: &Slot) -> Option<&ClassId> {
        self.occupied.get(teacher).and_then(|slots| slots.get(slot))
    }

    /// Commits `teacher` to `slot` on behalf of `class`.
    ///
    /// Committing an already committed pair is a usage bug and fails with
    /// [`TrackerError::DoubleBookingAttempt`], leaving the tracker unchanged.
    pub fn commit(
        &mut self,
        teacher: &TeacherId,
        slot: Slot,
        class: &ClassId,
    ) -> Result<(), TrackerError> {
        let slots = self.occupied.entry(teacher.clone()).or_default();
        if let Some(holder) = slots.get(&slot) {
            return Err(TrackerError::DoubleBookingAttempt {
                teacher: teacher.clone(),
                slot,
                holder: holder.clone(),
            });
        }
        slots.insert(slot, class.clone());
        self.commits += 1;
        Ok(())
    }

    /// Releases a committed pair. Returns `false` if it was not committed.
    pub fn release(&mut self, teacher: &TeacherId, slot: &Slot) -> bool {
        let Some(slots) = self.occupied.get_mut(teacher) else {
            return false;
        };
        let released = slots.remove(slot).is_some();
        if slots.is_empty() {
            self.occupied.remove(teacher);
        }
        released
    }

    /// Releases every pair held by `class`. Returns how many were released.
    pub fn release_class(&mut self, class: &ClassId) -> usize {
        let mut released = 0;
        for slots in self.occupied.values_mut() {
            let before = slots.len();
            slots.retain(|_, holder| holder != class);
            released += before - slots.len();
        }
        self.occupied.retain(|_, slots| !slots.is_empty());
        released
    }

    /// Slots committed for `teacher`, in scan order.
    pub fn occupied(&self, teacher: &TeacherId) -> Vec<Slot> {
        self.occupied
            .get(teacher)
            .map(|slots| slots.keys().copied().collect())
            .unwrap_or_default()
    }

    /// How many commits this tracker has accepted (releases do not
    /// decrease it).
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// Number of (teacher, slot) pairs currently held.
    pub fn held_count(&self) -> usize {
        self.occupied.values().map(|s| s.len()).sum()
    }
}
