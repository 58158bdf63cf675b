use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::params::Params;

/// Experiment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum dot age in frames before it respawns
    pub lifespan: u32,
    /// Correlation between x and y spawn offsets of every dot cloud
    pub spawn_correlation: f32,
    /// A target click only counts beyond this many start radii from the start
    pub end_distance_factor: f32,
    /// Score decay per unit of normalised error beyond 1
    pub score_slope: f32,
    /// Radius of the solid dot shown at the pointer while waiting at the start
    pub precursor_radius: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lifespan: Params::DOT_LIFESPAN,
            spawn_correlation: Params::SPAWN_CORRELATION,
            end_distance_factor: Params::END_DISTANCE_FACTOR,
            score_slope: Params::SCORE_SLOPE,
            precursor_radius: Params::PRECURSOR_RADIUS,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every value is usable, reporting the first one that is not
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lifespan == 0 {
            return Err(ConfigError::Invalid("lifespan must be > 0".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.spawn_correlation) {
            return Err(ConfigError::Invalid(format!(
                "spawn_correlation must be in [-1, 1], got {}",
                self.spawn_correlation
            )));
        }
        if !self.end_distance_factor.is_finite() || self.end_distance_factor < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "end_distance_factor must be >= 1, got {}",
                self.end_distance_factor
            )));
        }
        if !self.score_slope.is_finite() || self.score_slope <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "score_slope must be > 0, got {}",
                self.score_slope
            )));
        }
        if !self.precursor_radius.is_finite() || self.precursor_radius < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "precursor_radius must be >= 0, got {}",
                self.precursor_radius
            )));
        }
        Ok(())
    }

    /// Distance from the start beyond which a click ends the trial
    pub fn end_distance(&self, start_radius: f32) -> f32 {
        self.end_distance_factor * start_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.lifespan, 5);
        assert_eq!(config.end_distance(10.0), 20.0);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let config = Config {
            lifespan: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err(), "Zero lifespan");

        let config = Config {
            spawn_correlation: 1.5,
            ..Config::default()
        };
        assert!(config.validate().is_err(), "Correlation above 1");

        let config = Config {
            score_slope: 0.0,
            ..Config::default()
        };
        assert!(config.validate().is_err(), "Flat score slope");
    }
}
