//! Engine configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Result, SettleupError, constants};

/// Tunables for a settlement engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Dust threshold shared by aggregation, matching and the zero-sum check.
    pub balance_epsilon: Decimal,
    /// How long a run waits for the per-group lock before failing.
    pub lock_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            balance_epsilon: constants::DEFAULT_BALANCE_EPSILON,
            lock_timeout_ms: constants::DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document, filling missing fields with defaults, and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| SettleupError::Configuration(format!("invalid engine config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.balance_epsilon <= Decimal::ZERO {
            return Err(SettleupError::Configuration(format!(
                "balance_epsilon must be positive, got {}",
                self.balance_epsilon
            )));
        }
        if self.lock_timeout_ms == 0 {
            return Err(SettleupError::Configuration(
                "lock_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn lock_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lock_timeout_ms)
    }
}
