//! Planner options and JSON loaders for catalogs and inputs.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, StockCatalog};
use crate::classify::KeywordRule;
use crate::extract::RequirementInput;
use crate::layouts::KnownLayout;
use crate::types::Shape;

/// Largest accepted `combination_depth`.
pub const MAX_COMBINATION_DEPTH: usize = 32;
/// Largest accepted `combination_tolerance`, in mm.
pub const MAX_COMBINATION_TOLERANCE: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    /// Most bars the exact-combination search may join.
    pub combination_depth: usize,
    /// Overshoot in mm still accepted as an exact combination.
    pub combination_tolerance: u32,
    /// Added to the built-in nesting table.
    pub layouts: Vec<KnownLayout>,
    /// Replaces the built-in keyword rules when set.
    pub keywords: Option<Vec<KeywordRule>>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            combination_depth: 10,
            combination_tolerance: 10,
            layouts: Vec::new(),
            keywords: None,
        }
    }
}

impl PlanOptions {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_COMBINATION_DEPTH).contains(&self.combination_depth) {
            return Err(format!(
                "combination_depth must be between 1 and {MAX_COMBINATION_DEPTH}, got {}",
                self.combination_depth
            ));
        }
        if self.combination_tolerance > MAX_COMBINATION_TOLERANCE {
            return Err(format!(
                "combination_tolerance must be at most {MAX_COMBINATION_TOLERANCE} mm, got {}",
                self.combination_tolerance
            ));
        }
        Ok(())
    }
}

/// An offcut known before the run, e.g. left over from an earlier job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemnantSeed {
    pub family: String,
    pub category: Category,
    pub shape: Shape,
}

/// Input document: requirements in planning order plus seeded remnants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInput {
    pub requirements: Vec<RequirementInput>,
    #[serde(default)]
    pub remnants: Vec<RemnantSeed>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_catalog(path: &Path) -> Result<StockCatalog, ConfigError> {
    let catalog: StockCatalog = load_json(path)?;
    catalog.validate().map_err(ConfigError::InvalidCatalog)?;
    tracing::debug!(path = %path.display(), families = catalog.families.len(), "loaded catalog");
    Ok(catalog)
}

pub fn load_options(path: &Path) -> Result<PlanOptions, ConfigError> {
    let options: PlanOptions = load_json(path)?;
    options.validate().map_err(ConfigError::InvalidOptions)?;
    Ok(options)
}

pub fn load_input(path: &Path) -> Result<PlanInput, ConfigError> {
    load_json(path)
}
