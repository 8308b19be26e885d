use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::OptimizerConfig;
use crate::error::{CutError, Result};

/// Names accepted by [`Problem::example`].
pub const EXAMPLES: &[&str] = &["paper", "glass"];

const PAPER: &str = include_str!("../demos/paper.json");
const GLASS: &str = include_str!("../demos/glass.json");

/// A complete optimization request as exchanged with callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub materials: Vec<MaterialSpec>,
    pub pieces: Vec<PieceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<OptimizerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub width: f64,
    pub height: f64,
    pub quantity: u32,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceSpec {
    /// Defaults to the 1-based position in the piece list.
    #[serde(default)]
    pub id: Option<u32>,
    pub width: f64,
    pub height: f64,
    pub demand: u32,
    #[serde(default)]
    pub name: Option<String>,
}

impl Problem {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn example(name: &str) -> Result<Self> {
        match name {
            "paper" => Self::from_json(PAPER),
            "glass" => Self::from_json(GLASS),
            _ => Err(CutError::UnknownExample(name.to_string())),
        }
    }
}
