//! Error types for the staking ledger.
//!
//! Two classes exist. [`StakingError`] covers expected, recoverable
//! failures of ledger operations. [`FatalError`] is returned only when a
//! caller broke an invariant the slashing path depends on; the block being
//! executed must be abandoned, never retried.

use {
    crate::address::{Address, ConsPubKey},
    solana_clock::UnixTimestamp,
    stakeline_decimal::Dec,
    thiserror::Error,
};

/// Recoverable failures of ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakingError {
    #[error("No delegation from {delegator} to validator {validator}")]
    NoDelegation {
        delegator: Address,
        validator: Address,
    },

    #[error(
        "Delegation from {delegator} to {validator} holds {held} shares, {requested} requested"
    )]
    InsufficientShares {
        delegator: Address,
        validator: Address,
        held: Dec,
        requested: Dec,
    },

    #[error("Validator {0} not found")]
    ValidatorNotFound(Address),

    #[error("Validator {0} already exists")]
    ValidatorExists(Address),

    #[error("Consensus pubkey {0} is already registered to a validator")]
    PubKeyRegistered(ConsPubKey),

    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Dec),

    #[error("Validator {0} has shares outstanding but no tokens backing them")]
    InvalidExchangeRate(Address),

    #[error("Unbonding delegation from {delegator} to {validator} already in progress")]
    ExistingUnbondingDelegation {
        delegator: Address,
        validator: Address,
    },

    #[error("No unbonding delegation from {delegator} to {validator}")]
    NoUnbondingDelegation {
        delegator: Address,
        validator: Address,
    },

    #[error("Redelegation of {delegator} from {src} to {dst} already in progress")]
    ExistingRedelegation {
        delegator: Address,
        src: Address,
        dst: Address,
    },

    #[error("No redelegation of {delegator} from {src} to {dst}")]
    NoRedelegation {
        delegator: Address,
        src: Address,
        dst: Address,
    },

    #[error("Entry matures after {min_time}, block time is {now}")]
    NotMature {
        min_time: UnixTimestamp,
        now: UnixTimestamp,
    },

    #[error("Cannot redelegate from validator {0} to itself")]
    SelfRedelegation(Address),

    #[error("Corrupt store record at key {key}: {reason}")]
    Codec { key: String, reason: String },
}

/// Broken caller invariants. Never swallowed: the enclosing block aborts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FatalError {
    #[error("Attempted to slash with a negative slash fraction {0}")]
    NegativeSlashFraction(Dec),

    #[error(
        "Impossible attempt to slash future infraction at height {infraction_height} \
         but we are at height {current_height}"
    )]
    FutureInfraction {
        infraction_height: i64,
        current_height: i64,
    },

    #[error("Should not be slashing unbonded validator {0}")]
    SlashUnbondedValidator(Address),

    #[error("Validator with pubkey {pubkey} not found, cannot set jailed to {jailed}")]
    JailUnknownValidator { pubkey: ConsPubKey, jailed: bool },

    #[error("Error unbonding delegator {delegator} from {validator}: {source}")]
    Unbond {
        delegator: Address,
        validator: Address,
        #[source]
        source: StakingError,
    },

    #[error("Staking store failure: {0}")]
    Store(#[from] StakingError),
}
