use serde::{Deserialize, Serialize};

use crate::error::{CutError, Result};

pub const DEFAULT_MAX_PATTERNS: usize = 1000;
pub const DEFAULT_TIME_LIMIT: u64 = 300;

/// Tuning knobs for one optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Reserved for a substitution-pattern strategy; the generator does not read it.
    #[serde(default = "default_true")]
    pub use_substitution: bool,
    #[serde(default = "default_max_patterns")]
    pub max_patterns: usize,
    /// Wall-clock limit for the MIP solver, in seconds.
    #[serde(default = "default_time_limit")]
    pub time_limit: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_patterns() -> usize {
    DEFAULT_MAX_PATTERNS
}

fn default_time_limit() -> u64 {
    DEFAULT_TIME_LIMIT
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            use_substitution: true,
            max_patterns: DEFAULT_MAX_PATTERNS,
            time_limit: DEFAULT_TIME_LIMIT,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_patterns == 0 {
            return Err(CutError::InvalidConfig(
                "max_patterns must be positive".to_string(),
            ));
        }
        if self.time_limit == 0 {
            return Err(CutError::InvalidConfig(
                "time_limit must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: OptimizerConfig = serde_json::from_str(r#"{"max_patterns": 5}"#).unwrap();
        assert_eq!(config.max_patterns, 5);
        assert_eq!(config.time_limit, DEFAULT_TIME_LIMIT);
        assert!(config.use_substitution);
    }

    #[test]
    fn test_validate_rejects_zero() {
        let config = OptimizerConfig {
            max_patterns: 0,
            ..OptimizerConfig::default()
        };
        assert!(matches!(config.validate(), Err(CutError::InvalidConfig(_))));

        let config = OptimizerConfig {
            time_limit: 0,
            ..OptimizerConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(OptimizerConfig::default().validate().is_ok());
    }
}
