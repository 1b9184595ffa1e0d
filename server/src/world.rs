//! Authoritative world state: the live dummies and their simulation
//!
//! The world owns every replicated dummy. Spawning happens in two phases so
//! a dummy that turns out to be unusable (no movement parameters available)
//! can be destroyed again before it is ever recorded: first [`World::spawn`]
//! inserts an inert dummy, then [`World::attach_movement`] makes it able to
//! move and jump.
//!
//! Owner-submitted input is validated here: input for a dummy the sender
//! does not own is dropped, as is input older than the newest already
//! applied for that dummy.

use crate::registry::Despawner;
use log::debug;
use shared::{apply_dummy_input, step_dummy, Dummy, DummyColor, DummyId, OwnerId};
use std::collections::HashMap;

pub struct World {
    dummies: HashMap<DummyId, Dummy>,
    last_input_seq: HashMap<DummyId, u32>,
    /// Simulation tick, incremented once per [`World::step`].
    pub tick: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            dummies: HashMap::new(),
            last_input_seq: HashMap::new(),
            tick: 0,
        }
    }

    /// Inserts an inert dummy (zero speed, zero velocity) at a position.
    /// Callers attach movement afterwards; until then the dummy stands still.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &mut self,
        id: DummyId,
        owner: OwnerId,
        name: String,
        color: DummyColor,
        x: f32,
        y: f32,
        radius: f32,
    ) -> DummyId {
        debug!("Spawning dummy {} ({}) at ({:.1}, {:.1})", id, name, x, y);
        self.dummies
            .insert(id, Dummy::new(id, owner, name, color, x, y, radius));
        id
    }

    /// Gives a spawned dummy its movement parameters. A dummy keeps standing
    /// still even after this until its owner submits the first input.
    pub fn attach_movement(&mut self, id: DummyId, speed: f32, jump_velocity: f32) {
        if let Some(dummy) = self.dummies.get_mut(&id) {
            dummy.speed = speed;
            dummy.jump_velocity = jump_velocity;
        }
    }

    /// Removes a dummy from the world. Returns whether it was still live.
    pub fn despawn(&mut self, id: DummyId) -> bool {
        self.last_input_seq.remove(&id);
        self.dummies.remove(&id).is_some()
    }

    /// Applies one owner-submitted input to a dummy.
    ///
    /// Rejected without effect when the dummy does not exist, when `owner`
    /// is not its owner, or when `sequence` is not newer than the last
    /// applied input for that dummy. Returns whether the input was applied.
    pub fn apply_input(
        &mut self,
        owner: OwnerId,
        dummy_id: DummyId,
        sequence: u32,
        heading_deg: f32,
        jump: bool,
    ) -> bool {
        let Some(dummy) = self.dummies.get_mut(&dummy_id) else {
            debug!("Dropping input for unknown dummy {}", dummy_id);
            return false;
        };
        if dummy.owner != owner {
            debug!(
                "Dropping input from client {} for dummy {} owned by client {}",
                owner, dummy_id, dummy.owner
            );
            return false;
        }

        let last_seq = self.last_input_seq.entry(dummy_id).or_insert(0);
        if sequence <= *last_seq {
            return false;
        }
        *last_seq = sequence;

        apply_dummy_input(dummy, heading_deg, jump);
        true
    }

    /// Advances every dummy by `dt` seconds and bumps the tick counter.
    pub fn step(&mut self, dt: f32) {
        for dummy in self.dummies.values_mut() {
            step_dummy(dummy, dt);
        }
        self.tick += 1;
    }

    pub fn dummy(&self, id: DummyId) -> Option<&Dummy> {
        self.dummies.get(&id)
    }

    pub fn owner_of(&self, id: DummyId) -> Option<OwnerId> {
        self.dummies.get(&id).map(|d| d.owner)
    }

    pub fn is_live(&self, id: DummyId) -> bool {
        self.dummies.contains_key(&id)
    }

    /// Clones the live dummies for a state broadcast.
    pub fn snapshot(&self) -> Vec<Dummy> {
        self.dummies.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.dummies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dummies.is_empty()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl Despawner for World {
    fn despawn(&mut self, dummy_id: DummyId) -> bool {
        World::despawn(self, dummy_id)
    }
}
