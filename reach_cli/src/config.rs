//! Session configuration file

use std::path::{Path, PathBuf};

use reach_core::{Config, ConditionGrid, ConfigError, Params, TrialOrder};
use serde::{Deserialize, Serialize};

/// Contents of the experiment TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentFile {
    /// Stimulus and scoring settings
    pub experiment: Config,
    /// How the session is assembled and paced
    pub session: SessionConfig,
    /// Factor levels of the condition table (the standard grid if absent)
    pub grid: Option<ConditionGrid>,
}

/// Session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Times each condition is presented
    pub repetitions: usize,
    /// Randomise trial order
    pub shuffle: bool,
    /// Column to group (when shuffling) or sort (otherwise) trials by
    pub grouping: Option<String>,
    /// Display frame rate driving the synthetic participant
    pub frame_rate: f32,
    /// Fixed seed (fresh entropy when absent)
    pub seed: Option<u64>,
    /// Condition table CSV used instead of the grid
    pub conditions: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            repetitions: Params::REPETITIONS,
            shuffle: true,
            grouping: None,
            frame_rate: Params::FRAME_RATE,
            seed: None,
            conditions: None,
        }
    }
}

impl SessionConfig {
    pub fn order(&self) -> TrialOrder {
        TrialOrder::from_flags(self.shuffle, self.grouping.as_deref())
    }
}

impl ExperimentFile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.experiment.validate()?;
        if !self.session.frame_rate.is_finite() || self.session.frame_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "frame_rate must be > 0, got {}",
                self.session.frame_rate
            )));
        }
        if let Some(grid) = &self.grid {
            if grid.is_empty() {
                return Err(ConfigError::Invalid(
                    "grid has a factor without levels".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load config from file, or the defaults if no file is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        file.validate()?;
        Ok(file)
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The grid that builds the condition table
    pub fn grid(&self) -> ConditionGrid {
        self.grid.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let file = ExperimentFile::load_or_default(None).unwrap();
        assert_eq!(file, ExperimentFile::default());
        assert_eq!(file.session.repetitions, 5);
        assert_eq!(file.session.order(), TrialOrder::Shuffled);
        assert_eq!(file.grid().len(), 9);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let file = ExperimentFile::from_toml(
            r#"
            [experiment]
            lifespan = 8

            [session]
            shuffle = false
            grouping = "cursor_shift"
            "#,
        )
        .unwrap();
        assert_eq!(file.experiment.lifespan, 8);
        assert_eq!(file.experiment.score_slope, Params::SCORE_SLOPE);
        assert_eq!(file.session.repetitions, Params::REPETITIONS);
        assert_eq!(
            file.session.order(),
            TrialOrder::SortedBy("cursor_shift".to_string())
        );
        assert!(file.grid.is_none());
    }

    #[test]
    fn test_grid_section() {
        let file = ExperimentFile::from_toml(
            r#"
            [grid]
            cursor_size = [[50.0, 200.0], [200.0, 50.0]]
            cursor_shift = [0.0, 240.0]
            "#,
        )
        .unwrap();
        let grid = file.grid();
        assert_eq!(grid.len(), 4);
        assert_eq!(grid.n_dots_cursor, vec![200]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = ExperimentFile::from_toml("[experiment]\nlifespan = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ExperimentFile::from_toml("[session]\nframe_rate = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ExperimentFile::from_toml("[grid]\ncursor_shift = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ExperimentFile::from_toml("[session\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_roundtrip_through_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("experiment.toml");

        let mut file = ExperimentFile::default();
        file.session.seed = Some(7);
        file.grid = Some(ConditionGrid::default());
        std::fs::write(&path, file.to_toml().unwrap()).unwrap();

        let loaded = ExperimentFile::load(&path).unwrap();
        assert_eq!(loaded, file);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = ExperimentFile::load(&temp_dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
