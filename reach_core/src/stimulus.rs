use glam::Vec2;
use rand::Rng;

use crate::dot_cloud::{DotCloud, SpawnCovariance};
use crate::error::CloudError;

/// Solid ellipse standing in for a single-dot stimulus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    pub position: Vec2,
    pub radii: Vec2,
}

impl Shape {
    pub fn new(position: Vec2, radii: Vec2) -> Self {
        Self { position, radii }
    }
}

/// Cursor or target rendering, chosen once per trial from its dot count
#[derive(Debug, Clone)]
pub enum Stimulus {
    SinglePoint(Shape),
    Cloud(DotCloud),
}

/// What the renderer needs to draw one stimulus
#[derive(Debug, Clone, PartialEq)]
pub enum DrawKind {
    Ellipse { center: Vec2, radii: Vec2 },
    Dots(Vec<Vec2>),
}

impl Stimulus {
    /// One dot gives a solid shape of radii `size`; more give a cloud with
    /// spawn sigmas `size`.
    pub fn build<R: Rng + ?Sized>(
        n_dots: u32,
        position: Vec2,
        size: Vec2,
        lifespan: u32,
        correlation: f32,
        rng: &mut R,
    ) -> Result<Self, CloudError> {
        match n_dots {
            0 => Err(CloudError::NoDots),
            1 => Ok(Stimulus::SinglePoint(Shape::new(position, size))),
            n => {
                let spawn = SpawnCovariance::from_sigma(size.x, size.y, correlation)?;
                let cloud = DotCloud::new(n as usize, lifespan, position, spawn, rng)?;
                Ok(Stimulus::Cloud(cloud))
            }
        }
    }

    /// Reference position: the shape center or the cloud center
    pub fn position(&self) -> Vec2 {
        match self {
            Stimulus::SinglePoint(shape) => shape.position,
            Stimulus::Cloud(cloud) => cloud.center(),
        }
    }

    pub fn set_position(&mut self, position: Vec2) {
        match self {
            Stimulus::SinglePoint(shape) => shape.position = position,
            Stimulus::Cloud(cloud) => cloud.set_center(position),
        }
    }

    /// Advance one frame. Shapes have nothing to age.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        match self {
            Stimulus::SinglePoint(_) => 0,
            Stimulus::Cloud(cloud) => cloud.tick(rng),
        }
    }

    pub fn is_cloud(&self) -> bool {
        matches!(self, Stimulus::Cloud(_))
    }

    pub fn draw_kind(&self) -> DrawKind {
        match self {
            Stimulus::SinglePoint(shape) => DrawKind::Ellipse {
                center: shape.position,
                radii: shape.radii,
            },
            Stimulus::Cloud(cloud) => DrawKind::Dots(cloud.positions().to_vec()),
        }
    }
}
