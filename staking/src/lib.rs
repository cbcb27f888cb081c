//! Stakeline Staking
//!
//! The staking ledger of a proof-of-stake chain and the slashing engine
//! that answers proven infractions.
//!
//! ## Layout
//!
//! | Module         | Holds |
//! |----------------|-------|
//! | [`types`]      | Validator, pool, delegation, unbonding and redelegation records |
//! | [`store`]      | Ordered key-value store, in-memory store, block branches |
//! | [`keeper`]     | [`StakingStore`] and its store-backed implementation |
//! | [`slashing`]   | `slash`, per-entry slashes, `jail` / `unjail` |
//! | [`infraction`] | Evidence handling and the per-block driver |
//! | [`params`]     | Governance parameters, TOML loading |
//!
//! Every amount is an exact [`Dec`]. Execution is single-threaded and
//! deterministic: identical state and evidence always yield identical
//! results.

pub mod address;
pub mod error;
pub mod infraction;
pub mod keeper;
pub mod params;
pub mod slashing;
pub mod store;
pub mod types;

pub use {
    address::{Address, ConsPubKey},
    error::{FatalError, StakingError},
    infraction::{apply_block_infractions, handle_infraction, Infraction, InfractionKind},
    keeper::{Keeper, StakingStore},
    params::{ConfigError, StakingParams},
    slashing::{jail, slash, unjail, SlashOutcome},
    stakeline_decimal::Dec,
    store::{CacheStore, KvStore, MemoryStore},
    types::{BlockContext, BondStatus, Delegation, Pool, Redelegation, UnbondingDelegation, Validator},
};
