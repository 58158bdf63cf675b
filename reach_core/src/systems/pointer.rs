use glam::Vec2;
use hecs::World;

use crate::components::*;
use crate::stimulus::Stimulus;

/// Cursor displacement triggered by crossing a height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftRule {
    pub shift: f32,     // Added to x while above the threshold
    pub threshold: f32, // Pointer y that must be exceeded
}

impl ShiftRule {
    pub fn new(shift: f32, threshold: f32) -> Self {
        Self { shift, threshold }
    }

    /// Cursor position for a raw pointer, and whether the shift was applied
    pub fn apply(&self, pointer: Vec2) -> (Vec2, bool) {
        if pointer.y > self.threshold {
            (Vec2::new(pointer.x + self.shift, pointer.y), true)
        } else {
            (pointer, false)
        }
    }
}

/// Move the cursor stimulus and the pre-cursor dot
pub fn track_pointer(world: &mut World, cursor: Vec2, pointer: Vec2) {
    for (_entity, (stimulus, role)) in world.query_mut::<(&mut Stimulus, &Role)>() {
        if *role == Role::Cursor {
            stimulus.set_position(cursor);
        }
    }
    for (_entity, precursor) in world.query_mut::<&mut Precursor>() {
        precursor.position = pointer;
    }
}

/// Reference position of the stimulus playing `role`
pub fn stimulus_position(world: &World, role: Role) -> Option<Vec2> {
    world
        .query::<(&Stimulus, &Role)>()
        .iter()
        .find(|(_, (_, r))| **r == role)
        .map(|(_, (stimulus, _))| stimulus.position())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::Shape;

    #[test]
    fn test_shift_only_above_threshold() {
        let rule = ShiftRule::new(240.0, -240.0);
        assert_eq!(rule.apply(Vec2::new(5.0, -250.0)), (Vec2::new(5.0, -250.0), false));
        assert_eq!(rule.apply(Vec2::new(5.0, -240.0)), (Vec2::new(5.0, -240.0), false));
        assert_eq!(rule.apply(Vec2::new(5.0, -239.0)), (Vec2::new(245.0, -239.0), true));
    }

    #[test]
    fn test_track_pointer_moves_only_cursor() {
        let mut world = World::new();
        let target_pos = Vec2::new(0.0, 240.0);
        world.spawn((
            Stimulus::SinglePoint(Shape::new(Vec2::ZERO, Vec2::ONE)),
            Role::Cursor,
        ));
        world.spawn((
            Stimulus::SinglePoint(Shape::new(target_pos, Vec2::ONE)),
            Role::Target,
        ));
        world.spawn((Precursor::new(Vec2::ZERO, 5.0),));

        track_pointer(&mut world, Vec2::new(240.0, 10.0), Vec2::new(0.0, 10.0));

        assert_eq!(
            stimulus_position(&world, Role::Cursor),
            Some(Vec2::new(240.0, 10.0))
        );
        assert_eq!(stimulus_position(&world, Role::Target), Some(target_pos));
        for (_, precursor) in world.query::<&Precursor>().iter() {
            assert_eq!(precursor.position, Vec2::new(0.0, 10.0));
        }
    }
}
