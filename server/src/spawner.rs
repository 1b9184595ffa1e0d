//! Handling of client spawn and delete-all requests
//!
//! Requests never carry the requester's identity in the payload; the network
//! layer resolves the sender address to a connected client and passes that
//! client id in. Everything here trusts `owner` for that reason.
//!
//! Dummies are instantiated from a [`DummyTemplate`] loaded at startup. A
//! server without a template (missing or unparseable file) stays up and
//! answers every spawn request with a logged no-op until a template is set.

use crate::registry::SpawnRegistry;
use crate::world::World;
use log::{error, info, warn};
use rand::Rng;
use serde::Deserialize;
use shared::{DummyColor, DummyId, OwnerId, SPAWN_EXTENT};
use std::path::Path;

/// Movement parameters attached to each instantiated dummy.
#[derive(Debug, Clone, Deserialize)]
pub struct MovementProfile {
    pub speed: f32,
    pub jump_velocity: f32,
}

/// Archetype every dummy is instantiated from, loaded from a JSON file.
///
/// `movement` is optional so a misconfigured template degrades the same way
/// a missing one does: dummies that cannot move are destroyed again instead
/// of being left in the world.
#[derive(Debug, Clone, Deserialize)]
pub struct DummyTemplate {
    pub radius: f32,
    pub movement: Option<MovementProfile>,
    /// Colors picked from at random when the requester names none.
    /// An empty palette falls back to random colors.
    #[serde(default)]
    pub palette: Vec<DummyColor>,
}

impl DummyTemplate {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let template = serde_json::from_str(&data)?;
        Ok(template)
    }
}

/// Spawns dummies on behalf of requesting clients and hands their records
/// to the [`SpawnRegistry`].
pub struct DummySpawner {
    template: Option<DummyTemplate>,
    /// Next suffix for generated names. Only ever increases, so names stay
    /// unique across owners and across delete/spawn cycles.
    next_dummy_number: u32,
    max_per_request: u32,
}

impl DummySpawner {
    pub fn new(template: Option<DummyTemplate>, max_per_request: u32) -> Self {
        Self {
            template,
            next_dummy_number: 0,
            max_per_request,
        }
    }

    /// Replaces the template. Passing `Some` recovers a server that started
    /// without one.
    pub fn set_template(&mut self, template: Option<DummyTemplate>) {
        self.template = template;
    }

    /// Spawns up to `count` dummies owned by `owner` at random positions in
    /// the spawn square, each named `Dummy{n}` from a monotonic sequence.
    ///
    /// `count` is clamped to the per-request maximum. A dummy whose template
    /// lacks movement parameters is destroyed again and never recorded; the
    /// rest of the batch still spawns. Returns the number actually spawned.
    pub fn spawn_request(
        &mut self,
        owner: OwnerId,
        count: u32,
        color: Option<DummyColor>,
        world: &mut World,
        registry: &mut SpawnRegistry,
    ) -> u32 {
        let Some(template) = self.template.clone() else {
            error!(
                "No dummy template configured, ignoring spawn request from client {}",
                owner
            );
            return 0;
        };

        let capped = count.min(self.max_per_request);
        if capped < count {
            warn!(
                "Client {} requested {} dummies, clamping to {}",
                owner, count, capped
            );
        }

        let mut rng = rand::thread_rng();
        let mut spawned = 0;

        for _ in 0..capped {
            let x = rng.gen_range(-SPAWN_EXTENT..SPAWN_EXTENT);
            let y = rng.gen_range(-SPAWN_EXTENT..SPAWN_EXTENT);
            let dummy_color = color.unwrap_or_else(|| pick_color(&mut rng, &template.palette));

            let id: DummyId = self.next_dummy_number;
            self.next_dummy_number += 1;

            world.spawn(
                id,
                owner,
                format!("Dummy{}", id),
                dummy_color,
                x,
                y,
                template.radius,
            );

            match &template.movement {
                Some(profile) => {
                    world.attach_movement(id, profile.speed, profile.jump_velocity);
                    registry.record_spawn(owner, id);
                    spawned += 1;
                }
                None => {
                    error!(
                        "Dummy template has no movement parameters, destroying orphaned dummy {}",
                        id
                    );
                    world.despawn(id);
                }
            }
        }

        info!(
            "Spawned {} dummies for client {}. Total dummies: {}",
            spawned,
            owner,
            registry.dummy_count()
        );
        spawned
    }

    /// Destroys every dummy owned by `owner`. Safe to call for owners that
    /// never spawned anything.
    pub fn delete_all_request(
        &self,
        owner: OwnerId,
        world: &mut World,
        registry: &mut SpawnRegistry,
    ) {
        info!("Client {} requested deletion of all its dummies", owner);
        registry.remove_all_for_owner(owner, world);
    }
}

fn pick_color(rng: &mut impl Rng, palette: &[DummyColor]) -> DummyColor {
    if palette.is_empty() {
        // Floor keeps dummies legible against the dark arena background.
        DummyColor::new(
            rng.gen_range(0.2..1.0),
            rng.gen_range(0.2..1.0),
            rng.gen_range(0.2..1.0),
        )
    } else {
        palette[rng.gen_range(0..palette.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_template() -> DummyTemplate {
        DummyTemplate {
            radius: 0.5,
            movement: Some(MovementProfile {
                speed: 3.0,
                jump_velocity: 8.0,
            }),
            palette: Vec::new(),
        }
    }

    fn spawner_with_template() -> DummySpawner {
        DummySpawner::new(Some(test_template()), 100)
    }

    #[test]
    fn test_spawn_populates_world_and_registry() {
        let mut spawner = spawner_with_template();
        let mut world = World::new();
        let mut registry = SpawnRegistry::new();

        let spawned = spawner.spawn_request(7, 3, None, &mut world, &mut registry);

        assert_eq!(spawned, 3);
        assert_eq!(world.len(), 3);
        assert_eq!(registry.dummy_count(), 3);
        assert_eq!(registry.owned_count(7), 3);
        for id in registry.owned_ids(7) {
            assert_eq!(world.owner_of(*id), Some(7));
        }
    }

    #[test]
    fn test_names_are_sequential_across_owners() {
        let mut spawner = spawner_with_template();
        let mut world = World::new();
        let mut registry = SpawnRegistry::new();

        spawner.spawn_request(7, 2, None, &mut world, &mut registry);
        spawner.spawn_request(9, 2, None, &mut world, &mut registry);

        let names: Vec<String> = registry
            .owned_ids(7)
            .iter()
            .chain(registry.owned_ids(9))
            .map(|id| world.dummy(*id).unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["Dummy0", "Dummy1", "Dummy2", "Dummy3"]);
    }

    #[test]
    fn test_names_keep_increasing_after_delete_all() {
        let mut spawner = spawner_with_template();
        let mut world = World::new();
        let mut registry = SpawnRegistry::new();

        spawner.spawn_request(7, 2, None, &mut world, &mut registry);
        spawner.delete_all_request(7, &mut world, &mut registry);
        spawner.spawn_request(7, 1, None, &mut world, &mut registry);

        let id = registry.owned_ids(7)[0];
        assert_eq!(world.dummy(id).unwrap().name, "Dummy2");
    }

    #[test]
    fn test_spawn_positions_inside_spawn_square() {
        let mut spawner = spawner_with_template();
        let mut world = World::new();
        let mut registry = SpawnRegistry::new();

        spawner.spawn_request(7, 50, None, &mut world, &mut registry);

        for dummy in world.snapshot() {
            assert!(dummy.x >= -SPAWN_EXTENT && dummy.x <= SPAWN_EXTENT);
            assert!(dummy.y >= -SPAWN_EXTENT && dummy.y <= SPAWN_EXTENT);
            assert!(dummy.on_ground);
        }
    }

    #[test]
    fn test_spawn_count_is_capped() {
        let mut spawner = DummySpawner::new(Some(test_template()), 10);
        let mut world = World::new();
        let mut registry = SpawnRegistry::new();

        let spawned = spawner.spawn_request(7, 500, None, &mut world, &mut registry);

        assert_eq!(spawned, 10);
        assert_eq!(world.len(), 10);
        assert_eq!(registry.dummy_count(), 10);
    }

    #[test]
    fn test_spawn_without_template_is_noop() {
        let mut spawner = DummySpawner::new(None, 100);
        let mut world = World::new();
        let mut registry = SpawnRegistry::new();

        let spawned = spawner.spawn_request(7, 5, None, &mut world, &mut registry);

        assert_eq!(spawned, 0);
        assert!(world.is_empty());
        assert_eq!(registry.dummy_count(), 0);
    }

    #[test]
    fn test_set_template_recovers_spawning() {
        let mut spawner = DummySpawner::new(None, 100);
        let mut world = World::new();
        let mut registry = SpawnRegistry::new();

        assert_eq!(spawner.spawn_request(7, 1, None, &mut world, &mut registry), 0);

        spawner.set_template(Some(test_template()));
        assert_eq!(spawner.spawn_request(7, 1, None, &mut world, &mut registry), 1);
    }

    #[test]
    fn test_template_without_movement_destroys_orphans() {
        let template = DummyTemplate {
            radius: 0.5,
            movement: None,
            palette: Vec::new(),
        };
        let mut spawner = DummySpawner::new(Some(template), 100);
        let mut world = World::new();
        let mut registry = SpawnRegistry::new();

        let spawned = spawner.spawn_request(7, 3, None, &mut world, &mut registry);

        assert_eq!(spawned, 0);
        assert!(world.is_empty());
        assert_eq!(registry.dummy_count(), 0);
        assert!(!registry.has_owner(7));

        // The failed batch still consumed name numbers.
        spawner.set_template(Some(test_template()));
        spawner.spawn_request(7, 1, None, &mut world, &mut registry);
        let id = registry.owned_ids(7)[0];
        assert_eq!(world.dummy(id).unwrap().name, "Dummy3");
    }

    #[test]
    fn test_requested_color_is_applied() {
        let mut spawner = spawner_with_template();
        let mut world = World::new();
        let mut registry = SpawnRegistry::new();
        let color = DummyColor::new(0.9, 0.1, 0.1);

        spawner.spawn_request(7, 2, Some(color), &mut world, &mut registry);

        for dummy in world.snapshot() {
            assert_eq!(dummy.color, color);
        }
    }

    #[test]
    fn test_palette_color_used_when_none_requested() {
        let palette_color = DummyColor::new(0.2, 0.4, 0.6);
        let template = DummyTemplate {
            radius: 0.5,
            movement: Some(MovementProfile {
                speed: 3.0,
                jump_velocity: 8.0,
            }),
            palette: vec![palette_color],
        };
        let mut spawner = DummySpawner::new(Some(template), 100);
        let mut world = World::new();
        let mut registry = SpawnRegistry::new();

        spawner.spawn_request(7, 3, None, &mut world, &mut registry);

        for dummy in world.snapshot() {
            assert_eq!(dummy.color, palette_color);
        }
    }

    #[test]
    fn test_delete_all_for_unknown_owner_is_noop() {
        let spawner = spawner_with_template();
        let mut world = World::new();
        let mut registry = SpawnRegistry::new();

        spawner.delete_all_request(42, &mut world, &mut registry);

        assert!(world.is_empty());
        assert_eq!(registry.dummy_count(), 0);
    }

    #[test]
    fn test_template_parses_from_json() {
        let json = r#"{
            "radius": 0.5,
            "movement": { "speed": 3.0, "jump_velocity": 8.0 },
            "palette": [{ "r": 1.0, "g": 0.0, "b": 0.0 }]
        }"#;
        let template: DummyTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(template.radius, 0.5);
        assert_eq!(template.movement.unwrap().speed, 3.0);
        assert_eq!(template.palette.len(), 1);
    }

    #[test]
    fn test_template_palette_defaults_to_empty() {
        let json = r#"{ "radius": 0.5, "movement": { "speed": 3.0, "jump_velocity": 8.0 } }"#;
        let template: DummyTemplate = serde_json::from_str(json).unwrap();
        assert!(template.palette.is_empty());
    }
}
