//! Limited-lifetime dot clouds
//!
//! A cloud is a fixed pool of dots scattered around a center by a bivariate
//! normal. Every dot ages one step per tick and is redrawn around the current
//! center once its age reaches the lifespan, so a moving cloud trails its
//! center instead of snapping to it.

use glam::Vec2;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::CloudError;

/// 2x2 spawn covariance built from (sigma_x, sigma_y, rho)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnCovariance {
    sigma_x: f32,
    sigma_y: f32,
    rho: f32,
}

impl SpawnCovariance {
    pub fn from_sigma(sigma_x: f32, sigma_y: f32, rho: f32) -> Result<Self, CloudError> {
        let sigma_ok = |s: f32| s.is_finite() && s >= 0.0;
        if !sigma_ok(sigma_x) || !sigma_ok(sigma_y) {
            return Err(CloudError::InvalidSigma { sigma_x, sigma_y });
        }
        if !rho.is_finite() || rho.abs() > 1.0 {
            return Err(CloudError::InvalidCorrelation(rho));
        }
        Ok(Self {
            sigma_x,
            sigma_y,
            rho,
        })
    }

    /// Row-major `[[sxx, sxy], [sxy, syy]]`
    pub fn matrix(&self) -> [[f32; 2]; 2] {
        let sxy = self.rho * self.sigma_x * self.sigma_y;
        [
            [self.sigma_x * self.sigma_x, sxy],
            [sxy, self.sigma_y * self.sigma_y],
        ]
    }

    pub fn is_positive_semidefinite(&self) -> bool {
        let [[a, b], [c, d]] = self.matrix();
        // Relative tolerance for rounding in the determinant
        let tol = 1e-5 * (a * d).abs().max(f32::MIN_POSITIVE);
        a >= 0.0 && d >= 0.0 && b == c && a * d - b * c >= -tol
    }

    /// Draw one offset from N(0, Sigma) via the Cholesky factor
    pub fn sample_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let z0: f32 = rng.sample(StandardNormal);
        let z1: f32 = rng.sample(StandardNormal);
        let shear = (1.0 - self.rho * self.rho).max(0.0).sqrt();
        Vec2::new(
            self.sigma_x * z0,
            self.sigma_y * (self.rho * z0 + shear * z1),
        )
    }
}

/// Pool of dots with independent, bounded lifetimes
#[derive(Debug, Clone)]
pub struct DotCloud {
    center: Vec2,
    positions: Vec<Vec2>,
    ages: Vec<u32>,
    lifespan: u32,
    spawn: SpawnCovariance,
}

impl DotCloud {
    pub fn new<R: Rng + ?Sized>(
        n_dots: usize,
        lifespan: u32,
        center: Vec2,
        spawn: SpawnCovariance,
        rng: &mut R,
    ) -> Result<Self, CloudError> {
        if n_dots == 0 {
            return Err(CloudError::NoDots);
        }
        if lifespan == 0 {
            return Err(CloudError::ZeroLifespan);
        }

        // Staggered ages so the dots do not all respawn on the same frame
        let ages = (0..n_dots).map(|_| rng.gen_range(0..lifespan)).collect();
        let positions = (0..n_dots)
            .map(|_| center + spawn.sample_offset(rng))
            .collect();

        Ok(Self {
            center,
            positions,
            ages,
            lifespan,
            spawn,
        })
    }

    /// Age every dot by one frame and respawn the expired ones around the
    /// current center. Returns how many dots were respawned.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let mut respawned = 0;
        for (pos, age) in self.positions.iter_mut().zip(self.ages.iter_mut()) {
            *age += 1;
            if *age >= self.lifespan {
                *pos = self.center + self.spawn.sample_offset(rng);
                *age = 0;
                respawned += 1;
            }
        }
        respawned
    }

    /// Move the cloud. Existing dots stay put until they respawn.
    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Dot positions, index-aligned with dot identity
    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn ages(&self) -> &[u32] {
        &self.ages
    }

    pub fn lifespan(&self) -> u32 {
        self.lifespan
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
