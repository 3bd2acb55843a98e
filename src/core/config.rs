//! `civitas.toml` loading.
//!
//! A missing file is not an error: every key has a default.

use crate::core::chance::DEFAULT_REVOLT_SUCCESS_PROBABILITY;
use crate::core::error::CivitasError;
use crate::core::ledger::MemberId;
use crate::core::schemas;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CivitasConfig {
    /// Member ids holding the supervisor role.
    pub supervisors: Vec<MemberId>,
    pub revolt_success_probability: f64,
    /// Fixes the revolt dice sequence when set.
    pub revolt_seed: Option<u64>,
}

impl Default for CivitasConfig {
    fn default() -> Self {
        Self {
            supervisors: Vec::new(),
            revolt_success_probability: DEFAULT_REVOLT_SUCCESS_PROBABILITY,
            revolt_seed: None,
        }
    }
}

impl CivitasConfig {
    pub fn validate(&self) -> Result<(), CivitasError> {
        let p = self.revolt_success_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(CivitasError::ConfigError(format!(
                "revolt_success_probability must be within 0.0..=1.0, got {}",
                p
            )));
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<CivitasConfig, CivitasError> {
    let config: CivitasConfig =
        toml::from_str(content).map_err(|e| CivitasError::ConfigError(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Load `<root>/civitas.toml`, or defaults when absent.
pub fn load_config(root: &Path) -> Result<CivitasConfig, CivitasError> {
    let config_path = root.join(schemas::CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(CivitasConfig::default());
    }
    let content = fs::read_to_string(&config_path).map_err(CivitasError::IoError)?;
    parse_config(&content)
}
