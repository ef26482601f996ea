use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::models::ParticipantId;

/// In-process single-writer guard per participant. Does not protect against
/// another process appending to the same log.
#[derive(Debug, Default)]
pub struct ParticipantLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ParticipantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the participant's lock.
    pub fn with_lock<T>(&self, participant: &ParticipantId, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(participant);
        let _guard: MutexGuard<'_, ()> = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    fn lock_for(&self, participant: &ParticipantId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(participant.as_str().to_string())
            .or_default()
            .clone()
    }
}
