//! Server-side bookkeeping of spawned dummies, per owning client
//!
//! The registry is the authoritative record of which connected client owns
//! which dummies, together with the single replicated dummy counter shown in
//! every client's diagnostics overlay. It is mutated exclusively from the
//! server's main loop (spawn requests, delete requests, disconnect cleanup),
//! so it needs no internal locking.
//!
//! Invariants upheld here:
//! - a dummy id is recorded under at most one owner at a time
//! - an owner's entry is removed entirely once its last dummy is gone,
//!   never left behind empty
//! - the counter equals the total number of recorded dummies and cannot
//!   underflow: it is decremented only when a recorded dummy was confirmed
//!   still live at removal time

use log::info;
use shared::{DummyId, OwnerId};
use std::collections::HashMap;

/// Destroys replicated dummies on behalf of the registry.
///
/// Implemented by the authoritative world; tests substitute mocks to observe
/// exactly which dummies the registry asked to destroy.
pub trait Despawner {
    /// Removes the dummy from the replicated world. Returns `true` if the
    /// dummy was still live, `false` if it was already gone.
    fn despawn(&mut self, dummy_id: DummyId) -> bool;
}

/// Maps each owning client to the dummies spawned on its behalf.
pub struct SpawnRegistry {
    owned: HashMap<OwnerId, Vec<DummyId>>,
    dummy_count: u32,
}

impl SpawnRegistry {
    pub fn new() -> Self {
        Self {
            owned: HashMap::new(),
            dummy_count: 0,
        }
    }

    /// Records a freshly spawned dummy under its owner and bumps the
    /// replicated counter. Creates the owner's collection on first use.
    /// Never rejects.
    pub fn record_spawn(&mut self, owner: OwnerId, dummy_id: DummyId) {
        self.owned.entry(owner).or_default().push(dummy_id);
        self.dummy_count += 1;
    }

    /// Destroys every dummy recorded under `owner` and erases the owner's
    /// entry entirely. The counter is decremented once per dummy the world
    /// confirmed still live; a dummy already destroyed through other means
    /// is skipped so it cannot be counted down twice.
    ///
    /// An owner with no entry is a silent no-op, which makes explicit
    /// delete-all requests and disconnect cleanup safely repeatable.
    ///
    /// Returns the number of dummies actually despawned.
    pub fn remove_all_for_owner(&mut self, owner: OwnerId, world: &mut impl Despawner) -> usize {
        let Some(ids) = self.owned.remove(&owner) else {
            return 0;
        };

        let mut despawned = 0;
        for dummy_id in &ids {
            if world.despawn(*dummy_id) {
                self.dummy_count -= 1;
                despawned += 1;
            }
        }

        info!(
            "Removed {} dummies owned by client {}. Total dummies: {}",
            despawned, owner, self.dummy_count
        );
        despawned
    }

    /// Current value of the replicated dummy counter.
    pub fn dummy_count(&self) -> u32 {
        self.dummy_count
    }

    /// Number of dummies recorded under `owner`; zero if it has no entry.
    pub fn owned_count(&self, owner: OwnerId) -> usize {
        self.owned.get(&owner).map_or(0, Vec::len)
    }

    /// Dummy ids recorded under `owner`, in spawn order.
    pub fn owned_ids(&self, owner: OwnerId) -> &[DummyId] {
        self.owned.get(&owner).map_or(&[], Vec::as_slice)
    }

    pub fn has_owner(&self, owner: OwnerId) -> bool {
        self.owned.contains_key(&owner)
    }

    /// Sum of collection sizes across all owners. Equals `dummy_count()`
    /// for every sequence of spawn/delete/disconnect operations.
    pub fn total_recorded(&self) -> usize {
        self.owned.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }
}

impl Default for SpawnRegistry {
    fn default() -> Self {
        Self::new()
    }
}
