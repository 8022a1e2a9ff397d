//! Deferred-cleanup stack for composite operations.
//!
//! Multi-step operations (stream open, patch upsert) record an undo entry
//! for every resource they create. On failure the manager unwinds the
//! stack most-recently-created-first; on success a single
//! [`Cleanups::disarm_all`] commits the operation and turns the recorded
//! entries inert.

use audioroute_hal::{PatchId, PortConfigId};
use tracing::error;

/// A single recorded undo action.
///
/// Entries hold ids only; executing them is the manager's job, so the
/// stack never extends any resource's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupAction {
    ResetPortConfig(PortConfigId),
    ResetPatch(PatchId),
}

/// An ordered stack of undo entries with an explicit arming state.
///
/// `disarm_all` keeps the entries listed but prevents them from ever
/// executing; this is the commit point of a composite operation and there
/// is exactly one such call per successful operation.
#[derive(Debug)]
pub struct Cleanups {
    entries: Vec<CleanupAction>,
    armed: bool,
}

impl Cleanups {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            armed: true,
        }
    }

    /// Records an undo entry for a freshly created resource.
    pub fn push(&mut self, action: CleanupAction) {
        self.entries.push(action);
    }

    /// Commits the operation: entries stay listed but will not execute.
    pub fn disarm_all(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drains the pending undo actions in reverse creation order, or
    /// returns nothing if the stack was disarmed.
    pub(crate) fn take_pending(&mut self) -> Vec<CleanupAction> {
        if !self.armed {
            return Vec::new();
        }
        self.entries.drain(..).rev().collect()
    }
}

impl Default for Cleanups {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Cleanups {
    fn drop(&mut self) {
        // Undo actions need the manager to run; a stack dropped while
        // still armed means a composite operation forgot to unwind.
        if self.armed && !self.entries.is_empty() {
            error!(
                pending = self.entries.len(),
                "cleanup stack dropped while armed; undo entries were not executed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_pending_reverses_creation_order() {
        let mut cleanups = Cleanups::new();
        cleanups.push(CleanupAction::ResetPortConfig(PortConfigId::from_raw(1)));
        cleanups.push(CleanupAction::ResetPortConfig(PortConfigId::from_raw(2)));
        cleanups.push(CleanupAction::ResetPatch(PatchId::from_raw(3)));

        let pending = cleanups.take_pending();
        assert_eq!(
            pending,
            vec![
                CleanupAction::ResetPatch(PatchId::from_raw(3)),
                CleanupAction::ResetPortConfig(PortConfigId::from_raw(2)),
                CleanupAction::ResetPortConfig(PortConfigId::from_raw(1)),
            ]
        );
        assert!(cleanups.is_empty());
    }

    #[test]
    fn test_disarm_keeps_entries_listed_but_inert() {
        let mut cleanups = Cleanups::new();
        cleanups.push(CleanupAction::ResetPortConfig(PortConfigId::from_raw(1)));
        cleanups.push(CleanupAction::ResetPatch(PatchId::from_raw(2)));

        cleanups.disarm_all();
        assert!(!cleanups.is_armed());
        assert_eq!(cleanups.len(), 2);
        assert!(cleanups.take_pending().is_empty());
        assert_eq!(cleanups.len(), 2);
    }

    #[test]
    fn test_empty_stack_has_nothing_pending() {
        let mut cleanups = Cleanups::new();
        assert!(cleanups.is_armed());
        assert!(cleanups.take_pending().is_empty());
    }
}
