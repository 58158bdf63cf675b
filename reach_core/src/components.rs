use glam::Vec2;

/// Which part a stimulus plays in the trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Cursor,
    Target,
}

/// Start zone the participant clicks to begin reaching
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartZone {
    pub center: Vec2,
    pub radius: f32,
}

impl StartZone {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Distance from the zone center
    pub fn distance(&self, point: Vec2) -> f32 {
        point.distance(self.center)
    }

    /// Strictly inside the zone
    pub fn contains(&self, point: Vec2) -> bool {
        self.distance(point) < self.radius
    }
}

/// Solid dot following the raw pointer while waiting at the start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Precursor {
    pub position: Vec2,
    pub radius: f32,
}

impl Precursor {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self { position, radius }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_zone_boundary_is_outside() {
        let zone = StartZone::new(Vec2::new(0.0, -240.0), 10.0);
        assert!(zone.contains(Vec2::new(0.0, -240.0)));
        assert!(zone.contains(Vec2::new(9.99, -240.0)));
        assert!(!zone.contains(Vec2::new(10.0, -240.0)), "Edge is outside");
        assert!(!zone.contains(Vec2::new(0.0, -229.0)));
    }
}
