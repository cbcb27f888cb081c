//! Stakeline Integration Tests
//!
//! Scenario tests across the staking keeper and the slashing engine.
//!
//! # Areas Tested
//!
//! 1. **Slashing**: validator burns, unbonding-delegation credits, removal
//!    at zero tokens, pool conservation, fatal preconditions
//! 2. **Redelegation**: source-side penalties, destination share unwinding,
//!    height and maturity gating
//! 3. **Jailing**: bonded-set exits and re-entry, self-delegation auto-jail
//! 4. **Block handling**: evidence age, per-kind fractions, commit/discard

pub mod harness;
