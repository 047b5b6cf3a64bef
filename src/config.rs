//! Analysis configuration
//!
//! Built once at startup and handed by reference to whatever needs it.
//! Every key is optional in the YAML file; missing keys take the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SheetResult;

/// Largest range a full read, write or snapshot will touch by default.
pub const DEFAULT_MAX_CELLS: usize = 10_000;

/// Z-score above which a value counts as an outlier.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Fewer numeric samples than this is "insufficient data" for outlier detection.
pub const DEFAULT_MIN_OUTLIER_SAMPLES: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Cell-count cap for full-range reads, writes and snapshots.
    pub max_cells: usize,
    pub outlier_z_threshold: f64,
    pub min_outlier_samples: usize,
    /// Expand `A1:B3` style ranges into every covered cell when collecting precedents.
    pub expand_ranges: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_cells: DEFAULT_MAX_CELLS,
            outlier_z_threshold: DEFAULT_Z_THRESHOLD,
            min_outlier_samples: DEFAULT_MIN_OUTLIER_SAMPLES,
            expand_ranges: false,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> SheetResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> SheetResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> SheetResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.max_cells, 10_000);
        assert_eq!(config.outlier_z_threshold, 3.0);
        assert_eq!(config.min_outlier_samples, 8);
        assert!(!config.expand_ranges);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AnalysisConfig::from_yaml("max_cells: 300\nexpand_ranges: true\n").unwrap();
        assert_eq!(config.max_cells, 300);
        assert!(config.expand_ranges);
        assert_eq!(config.outlier_z_threshold, 3.0);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            AnalysisConfig::from_yaml("  \n").unwrap(),
            AnalysisConfig::default()
        );
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(AnalysisConfig::from_yaml("max_cells: [1, 2").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cellsense.yaml");
        std::fs::write(&path, "outlier_z_threshold: 2.5\n").unwrap();
        let config = AnalysisConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config.outlier_z_threshold, 2.5);
    }
}
