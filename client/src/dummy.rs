//! Autonomous input generation for the dummies this client owns
//!
//! Dummies are server-simulated; the client only decides what they should
//! try to do. Each owned dummy gets a [`DummyBehavior`] that picks a random
//! heading, walks in it, changes heading every few seconds and jumps every
//! few seconds. The behavior submits an input every tick whether or not
//! anything changed, the same cadence a human player's input would have.

use rand::Rng;
use shared::{Dummy, DummyId, OwnerId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Bounds for rescheduling heading changes and jumps, in seconds.
const MIN_REPLAN_SECS: f32 = 3.0;
const MAX_REPLAN_SECS: f32 = 5.0;

/// One tick's worth of input for one dummy, ready to go on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedInput {
    pub dummy_id: DummyId,
    pub sequence: u32,
    pub heading_deg: f32,
    pub jump: bool,
}

/// Wandering behavior for a single owned dummy.
pub struct DummyBehavior {
    dummy_id: DummyId,
    heading_deg: f32,
    next_heading_change: Instant,
    next_jump: Instant,
}

impl DummyBehavior {
    pub fn new(dummy_id: DummyId, now: Instant) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            dummy_id,
            heading_deg: rng.gen_range(0.0..360.0),
            next_heading_change: now + random_replan_delay(&mut rng),
            next_jump: now + random_replan_delay(&mut rng),
        }
    }

    /// One behavior tick: repick the heading once its deadline has passed,
    /// jump once the jump deadline has passed, and report the current
    /// intent either way.
    pub fn tick(&mut self, now: Instant) -> (f32, bool) {
        let mut rng = rand::thread_rng();

        if now >= self.next_heading_change {
            self.heading_deg = rng.gen_range(0.0..360.0);
            self.next_heading_change = now + random_replan_delay(&mut rng);
        }

        let jump = now >= self.next_jump;
        if jump {
            self.next_jump = now + random_replan_delay(&mut rng);
        }

        (self.heading_deg, jump)
    }

    pub fn dummy_id(&self) -> DummyId {
        self.dummy_id
    }

    pub fn heading_deg(&self) -> f32 {
        self.heading_deg
    }

    pub fn next_heading_change(&self) -> Instant {
        self.next_heading_change
    }

    pub fn next_jump(&self) -> Instant {
        self.next_jump
    }
}

fn random_replan_delay(rng: &mut impl Rng) -> Duration {
    Duration::from_secs_f32(rng.gen_range(MIN_REPLAN_SECS..MAX_REPLAN_SECS))
}

/// Keeps one behavior per dummy this client owns, following the replicated
/// world state: behaviors appear when owned dummies appear and are dropped
/// when their dummies are gone.
pub struct BehaviorManager {
    behaviors: HashMap<DummyId, DummyBehavior>,
    next_sequence: u32,
}

impl BehaviorManager {
    pub fn new() -> Self {
        Self {
            behaviors: HashMap::new(),
            next_sequence: 1,
        }
    }

    /// Reconciles the behavior set against a world snapshot. Existing
    /// behaviors keep their schedules; only appearances and disappearances
    /// change anything.
    pub fn sync(&mut self, local_id: OwnerId, dummies: &[Dummy], now: Instant) {
        for dummy in dummies {
            if dummy.owner == local_id && !self.behaviors.contains_key(&dummy.id) {
                self.behaviors
                    .insert(dummy.id, DummyBehavior::new(dummy.id, now));
            }
        }

        self.behaviors
            .retain(|id, _| dummies.iter().any(|d| d.id == *id && d.owner == local_id));
    }

    /// Ticks every behavior and returns the inputs to submit this tick,
    /// stamped with a strictly increasing sequence number.
    pub fn tick(&mut self, now: Instant) -> Vec<SimulatedInput> {
        let mut inputs = Vec::with_capacity(self.behaviors.len());

        for behavior in self.behaviors.values_mut() {
            let (heading_deg, jump) = behavior.tick(now);
            inputs.push(SimulatedInput {
                dummy_id: behavior.dummy_id(),
                sequence: self.next_sequence,
                heading_deg,
                jump,
            });
            self.next_sequence += 1;
        }

        inputs
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

impl Default for BehaviorManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::DummyColor;

    fn owned_dummy(id: DummyId, owner: OwnerId) -> Dummy {
        Dummy::new(id, owner, format!("Dummy{}", id), DummyColor::WHITE, 0.0, 0.0, 0.5)
    }

    #[test]
    fn test_behavior_creation() {
        let now = Instant::now();
        let behavior = DummyBehavior::new(3, now);

        assert_eq!(behavior.dummy_id(), 3);
        assert!(behavior.heading_deg() >= 0.0 && behavior.heading_deg() < 360.0);

        let min = now + Duration::from_secs_f32(MIN_REPLAN_SECS);
        let max = now + Duration::from_secs_f32(MAX_REPLAN_SECS);
        assert!(behavior.next_heading_change() >= min);
        assert!(behavior.next_heading_change() <= max);
        assert!(behavior.next_jump() >= min);
        assert!(behavior.next_jump() <= max);
    }

    #[test]
    fn test_heading_stable_before_deadline() {
        let now = Instant::now();
        let mut behavior = DummyBehavior::new(0, now);
        let initial_heading = behavior.heading_deg();

        // Any time before the minimum replan delay is before the deadline.
        let (heading, jump) = behavior.tick(now + Duration::from_secs_f32(2.9));

        assert_eq!(heading, initial_heading);
        assert!(!jump);
    }

    #[test]
    fn test_heading_reschedules_after_deadline() {
        let now = Instant::now();
        let mut behavior = DummyBehavior::new(0, now);

        let late = now + Duration::from_secs_f32(MAX_REPLAN_SECS + 0.1);
        behavior.tick(late);

        assert!(behavior.next_heading_change() >= late + Duration::from_secs_f32(MIN_REPLAN_SECS));
        assert!(behavior.next_heading_change() <= late + Duration::from_secs_f32(MAX_REPLAN_SECS));
    }

    #[test]
    fn test_jump_fires_and_reschedules() {
        let now = Instant::now();
        let mut behavior = DummyBehavior::new(0, now);

        let late = now + Duration::from_secs_f32(MAX_REPLAN_SECS + 0.1);
        let (_, jump) = behavior.tick(late);
        assert!(jump);

        assert!(behavior.next_jump() >= late + Duration::from_secs_f32(MIN_REPLAN_SECS));

        // Immediately after firing, the jump is rearmed and quiet again.
        let (_, jump_again) = behavior.tick(late + Duration::from_millis(16));
        assert!(!jump_again);
    }

    #[test]
    fn test_heading_stays_in_degree_range() {
        let now = Instant::now();
        let mut behavior = DummyBehavior::new(0, now);

        for i in 1..50 {
            let (heading, _) = behavior.tick(now + Duration::from_secs(i * 6));
            assert!((0.0..360.0).contains(&heading));
        }
    }

    #[test]
    fn test_sync_creates_behaviors_for_owned_dummies_only() {
        let mut manager = BehaviorManager::new();
        let now = Instant::now();
        let dummies = vec![owned_dummy(0, 7), owned_dummy(1, 7), owned_dummy(2, 9)];

        manager.sync(7, &dummies, now);

        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_sync_drops_behaviors_for_despawned_dummies() {
        let mut manager = BehaviorManager::new();
        let now = Instant::now();

        manager.sync(7, &[owned_dummy(0, 7), owned_dummy(1, 7)], now);
        assert_eq!(manager.len(), 2);

        manager.sync(7, &[owned_dummy(1, 7)], now);
        assert_eq!(manager.len(), 1);

        manager.sync(7, &[], now);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_sync_preserves_existing_schedules() {
        let mut manager = BehaviorManager::new();
        let now = Instant::now();
        let dummies = vec![owned_dummy(0, 7)];

        manager.sync(7, &dummies, now);
        let deadline_before = manager.behaviors[&0].next_heading_change();

        manager.sync(7, &dummies, now + Duration::from_secs(1));
        let deadline_after = manager.behaviors[&0].next_heading_change();

        assert_eq!(deadline_before, deadline_after);
    }

    #[test]
    fn test_tick_emits_one_input_per_dummy() {
        let mut manager = BehaviorManager::new();
        let now = Instant::now();

        manager.sync(7, &[owned_dummy(0, 7), owned_dummy(1, 7)], now);
        let inputs = manager.tick(now);

        assert_eq!(inputs.len(), 2);
        let mut ids: Vec<_> = inputs.iter().map(|i| i.dummy_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_sequences_strictly_increase_across_ticks() {
        let mut manager = BehaviorManager::new();
        let now = Instant::now();
        manager.sync(7, &[owned_dummy(0, 7), owned_dummy(1, 7)], now);

        let mut last_seq = 0;
        for i in 0..5 {
            let inputs = manager.tick(now + Duration::from_millis(16 * i));
            for input in inputs {
                assert!(input.sequence > last_seq);
                last_seq = input.sequence;
            }
        }
    }
}
