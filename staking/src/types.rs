//! Ledger records: validators, the token pool, delegations, unbonding
//! delegations and redelegations.
//!
//! Every record is persisted with Borsh by the [`crate::keeper::Keeper`].
//! All amounts are exact [`Dec`] values.

use {
    crate::{
        address::{Address, ConsPubKey},
        error::StakingError,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    solana_clock::UnixTimestamp,
    stakeline_decimal::Dec,
};

// ---------------------------------------------------------------------------
// Block context
// ---------------------------------------------------------------------------

/// The block currently being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockContext {
    pub height: i64,
    /// Block header time, unix seconds.
    pub time: UnixTimestamp,
}

impl BlockContext {
    pub fn new(height: i64, time: UnixTimestamp) -> Self {
        Self { height, time }
    }
}

// ---------------------------------------------------------------------------
// Pool
// ---------------------------------------------------------------------------

/// Chain-wide token float.
///
/// `bonded_tokens` backs the bonded validator set; `loose_tokens` is every
/// other token in existence. Burning always comes out of `loose_tokens`.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Pool {
    pub loose_tokens: Dec,
    pub bonded_tokens: Dec,
}

impl Pool {
    pub fn bonded_to_loose(&mut self, amount: &Dec) {
        self.bonded_tokens = &self.bonded_tokens - amount;
        self.loose_tokens = &self.loose_tokens + amount;
    }

    pub fn loose_to_bonded(&mut self, amount: &Dec) {
        self.loose_tokens = &self.loose_tokens - amount;
        self.bonded_tokens = &self.bonded_tokens + amount;
    }

    pub fn total_supply(&self) -> Dec {
        &self.loose_tokens + &self.bonded_tokens
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize)]
pub enum BondStatus {
    Unbonded,
    Unbonding,
    Bonded,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Validator {
    pub operator: Address,
    pub pubkey: ConsPubKey,
    pub jailed: bool,
    pub status: BondStatus,
    /// Tokens backing this validator, delegators' and its own.
    pub tokens: Dec,
    /// Total shares issued to delegators.
    pub delegator_shares: Dec,
    /// Height at which the validator last entered the bonded set.
    pub bond_height: i64,
    /// Height at which the validator last left the bonded set.
    pub unbonding_height: i64,
    /// Earliest time the validator completes unbonding.
    pub unbonding_min_time: UnixTimestamp,
}

impl Validator {
    pub fn new(operator: Address, pubkey: ConsPubKey) -> Self {
        Self {
            operator,
            pubkey,
            jailed: false,
            status: BondStatus::Unbonded,
            tokens: Dec::zero(),
            delegator_shares: Dec::zero(),
            bond_height: 0,
            unbonding_height: 0,
            unbonding_min_time: 0,
        }
    }

    pub fn is_bonded(&self) -> bool {
        self.status == BondStatus::Bonded
    }

    /// True once the validator has fully left the bonded set: either marked
    /// unbonded, or unbonding with its minimum time already passed.
    pub fn is_unbonded(&self, now: UnixTimestamp) -> bool {
        match self.status {
            BondStatus::Unbonded => true,
            BondStatus::Unbonding => self.unbonding_min_time < now,
            BondStatus::Bonded => false,
        }
    }

    /// Tokens per delegator share. One share per token before any shares
    /// exist.
    pub fn exchange_rate(&self) -> Dec {
        if self.delegator_shares.is_zero() {
            return Dec::one();
        }
        self.tokens
            .checked_quo(&self.delegator_shares)
            .unwrap_or_else(|_| Dec::one())
    }

    /// Add delegated tokens, returning the shares issued for them.
    pub fn add_tokens_from_del(
        &mut self,
        pool: &mut Pool,
        tokens: &Dec,
    ) -> Result<Dec, StakingError> {
        let issued_shares = tokens
            .checked_quo(&self.exchange_rate())
            .map_err(|_| StakingError::InvalidExchangeRate(self.operator))?;

        if self.is_bonded() {
            pool.loose_to_bonded(tokens);
        }
        self.tokens = &self.tokens + tokens;
        self.delegator_shares = &self.delegator_shares + &issued_shares;
        Ok(issued_shares)
    }

    /// Withdraw delegator shares, returning the tokens they were worth.
    ///
    /// Withdrawing the last shares withdraws every remaining token, so no
    /// rounding dust is left behind an empty validator.
    pub fn remove_del_shares(&mut self, pool: &mut Pool, shares: &Dec) -> Dec {
        let issued_tokens = if *shares == self.delegator_shares {
            self.tokens.clone()
        } else {
            &self.exchange_rate() * shares
        };

        self.tokens = &self.tokens - &issued_tokens;
        self.delegator_shares = &self.delegator_shares - shares;
        if self.is_bonded() {
            pool.bonded_to_loose(&issued_tokens);
        }
        issued_tokens
    }

    /// Take tokens away from the validator without touching shares. Bonded
    /// tokens are first moved to the loose pool, where the caller burns them.
    pub fn remove_tokens(&mut self, pool: &mut Pool, tokens: &Dec) {
        if self.is_bonded() {
            pool.bonded_to_loose(tokens);
        }
        self.tokens = &self.tokens - tokens;
    }
}

// ---------------------------------------------------------------------------
// Delegations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Delegation {
    pub delegator: Address,
    pub validator: Address,
    pub shares: Dec,
    /// Height of the last change to this delegation.
    pub height: i64,
}

impl Delegation {
    pub fn new(delegator: Address, validator: Address) -> Self {
        Self {
            delegator,
            validator,
            shares: Dec::zero(),
            height: 0,
        }
    }
}

/// Tokens withdrawn from a validator, waiting out the unbonding period.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct UnbondingDelegation {
    pub delegator: Address,
    pub validator: Address,
    pub creation_height: i64,
    /// Release time; the entry is mature once block time passes it.
    pub min_time: UnixTimestamp,
    /// Tokens at creation. Slashes are proportional to this.
    pub initial_balance: Dec,
    /// Tokens still owed to the delegator.
    pub balance: Dec,
}

impl UnbondingDelegation {
    pub fn is_mature(&self, now: UnixTimestamp) -> bool {
        self.min_time < now
    }
}

/// Stake moved from one validator to another, still answerable for
/// infractions of the source validator until mature.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Redelegation {
    pub delegator: Address,
    pub validator_src: Address,
    pub validator_dst: Address,
    pub creation_height: i64,
    pub min_time: UnixTimestamp,
    pub initial_balance: Dec,
    pub balance: Dec,
    /// Shares withdrawn from the source validator.
    pub shares_src: Dec,
    /// Shares received at the destination validator.
    pub shares_dst: Dec,
}

impl Redelegation {
    pub fn is_mature(&self, now: UnixTimestamp) -> bool {
        self.min_time < now
    }
}
