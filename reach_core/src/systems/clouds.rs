use hecs::World;

use crate::resources::ExperimentRng;
use crate::stimulus::Stimulus;

/// Age every dot cloud by one frame. Returns the number of respawned dots.
pub fn tick_clouds(world: &mut World, rng: &mut ExperimentRng) -> usize {
    // Deterministic: sort by entity ID
    let mut entities: Vec<_> = world
        .query::<&Stimulus>()
        .iter()
        .filter(|(_, stimulus)| stimulus.is_cloud())
        .map(|(e, _)| e)
        .collect();
    entities.sort_by_key(|e| e.id());

    let mut respawned = 0;
    for entity in entities {
        if let Ok(mut stimulus) = world.get::<&mut Stimulus>(entity) {
            respawned += stimulus.tick(&mut rng.0);
        }
    }
    respawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Role;
    use glam::Vec2;

    #[test]
    fn test_tick_clouds_ages_every_cloud() {
        let mut world = World::new();
        let mut rng = ExperimentRng::new(1);
        for (role, n) in [(Role::Cursor, 40), (Role::Target, 1), (Role::Target, 60)] {
            let stim =
                Stimulus::build(n, Vec2::ZERO, Vec2::splat(5.0), 3, 0.0, &mut rng.0).unwrap();
            world.spawn((stim, role));
        }

        // With lifespan 3, three ticks respawn every dot exactly once
        let total: usize = (0..3).map(|_| tick_clouds(&mut world, &mut rng)).sum();
        assert_eq!(total, 100);
    }
}
