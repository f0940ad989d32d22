//! Ordered reassembly of per-chunk results.

use crate::error::{Error, Result};

/// Identity of a reserved result slot; its value is the slot's final position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of result slots, one per chunk, concatenated in reservation order.
///
/// Slots are reserved before any job is dispatched and filled by the
/// coordinating thread once the pool has handed the results back. Completion
/// order of the workers therefore has no influence on the output order.
#[derive(Debug)]
pub struct OrderedCollector<R> {
    slots: Vec<Option<Vec<R>>>,
    drained: bool,
}

impl<R> Default for OrderedCollector<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> OrderedCollector<R> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            drained: false,
        }
    }

    /// Append `count` empty slots and return their ids in order.
    pub fn reserve(&mut self, count: usize) -> Vec<SlotId> {
        let start = self.slots.len();
        self.slots.resize_with(start + count, || None);
        (start..start + count).map(SlotId).collect()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Store the rows decoded for `slot`.
    ///
    /// # Errors
    /// [`Error::InvariantViolation`] if the slot was never reserved or is
    /// already filled.
    pub fn fill(&mut self, slot: SlotId, rows: Vec<R>) -> Result<()> {
        let entry = self.slots.get_mut(slot.0).ok_or_else(|| {
            Error::InvariantViolation(format!("slot {} was never reserved", slot.0))
        })?;
        if entry.is_some() {
            return Err(Error::InvariantViolation(format!(
                "slot {} filled twice",
                slot.0
            )));
        }
        *entry = Some(rows);
        Ok(())
    }

    /// Record that the worker pool has shut down and every job is accounted
    /// for.
    pub fn mark_drained(&mut self) {
        self.drained = true;
    }

    /// Concatenate all slots in index order.
    ///
    /// # Errors
    /// [`Error::InvariantViolation`] if called before [`mark_drained`] or
    /// while any slot is still empty. Partial data is never returned.
    ///
    /// [`mark_drained`]: OrderedCollector::mark_drained
    pub fn finalize(self) -> Result<Vec<R>> {
        if !self.drained {
            return Err(Error::InvariantViolation(
                "collector finalized before the worker pool drained".into(),
            ));
        }
        if let Some(i) = self.slots.iter().position(Option::is_none) {
            return Err(Error::InvariantViolation(format!(
                "slot {i} was never filled"
            )));
        }
        let total = self.slots.iter().flatten().map(Vec::len).sum();
        let mut rows = Vec::with_capacity(total);
        for slot in self.slots.into_iter().flatten() {
            rows.extend(slot);
        }
        Ok(rows)
    }
}
