//! Staking and slashing parameters.
//!
//! Parameters are normally owned by governance; the ledger only reads them.
//! Operators can load overrides from TOML; omitted fields keep their
//! defaults.

use {
    crate::infraction::InfractionKind,
    borsh::{BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    stakeline_decimal::Dec,
};

/// Three weeks, in seconds.
pub const DEFAULT_UNBONDING_TIME: i64 = 60 * 60 * 24 * 21;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[serde(default)]
pub struct StakingParams {
    /// Seconds an unbonding delegation, redelegation or unbonding validator
    /// stays slashable before it matures.
    pub unbonding_time: i64,

    /// Size of the bonded validator set.
    pub max_validators: u16,

    /// Fraction of stake burned for signing two blocks at one height.
    pub slash_fraction_double_sign: Dec,

    /// Fraction of stake burned for missing too many blocks.
    pub slash_fraction_downtime: Dec,

    /// Evidence older than this many seconds is ignored. Must not exceed
    /// `unbonding_time`, or the stake that committed the infraction may
    /// already have left.
    pub max_evidence_age: i64,
}

impl Default for StakingParams {
    fn default() -> Self {
        Self {
            unbonding_time: DEFAULT_UNBONDING_TIME,
            max_validators: 100,
            slash_fraction_double_sign: Dec::from_bps(500), // 5%
            slash_fraction_downtime: Dec::from_bps(100),    // 1%
            max_evidence_age: DEFAULT_UNBONDING_TIME,
        }
    }
}

impl StakingParams {
    /// Parse a TOML document and validate the result.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let params: Self = toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn slash_fraction(&self, kind: InfractionKind) -> &Dec {
        match kind {
            InfractionKind::DoubleSign => &self.slash_fraction_double_sign,
            InfractionKind::Downtime => &self.slash_fraction_downtime,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.unbonding_time <= 0 {
            return Err(ConfigError::InvalidUnbondingTime(self.unbonding_time));
        }
        if self.max_validators == 0 {
            return Err(ConfigError::InvalidMaxValidators);
        }
        for (name, fraction) in [
            ("slash_fraction_double_sign", &self.slash_fraction_double_sign),
            ("slash_fraction_downtime", &self.slash_fraction_downtime),
        ] {
            if fraction.is_negative() || *fraction > Dec::one() {
                return Err(ConfigError::InvalidSlashFraction {
                    name,
                    value: fraction.clone(),
                });
            }
        }
        if self.max_evidence_age < 0 || self.max_evidence_age > self.unbonding_time {
            return Err(ConfigError::InvalidMaxEvidenceAge {
                max_evidence_age: self.max_evidence_age,
                unbonding_time: self.unbonding_time,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unbonding_time must be > 0, got {0}")]
    InvalidUnbondingTime(i64),
    #[error("max_validators must be > 0")]
    InvalidMaxValidators,
    #[error("{name} must be in [0, 1], got {value}")]
    InvalidSlashFraction { name: &'static str, value: Dec },
    #[error("max_evidence_age must be in [0, {unbonding_time}], got {max_evidence_age}")]
    InvalidMaxEvidenceAge {
        max_evidence_age: i64,
        unbonding_time: i64,
    },
    #[error("invalid params file: {0}")]
    Parse(String),
}
