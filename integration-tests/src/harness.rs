//! Stakeline Test Harness
//!
//! A keeper over an in-memory store, seeded with a loose-token supply and a
//! set of self-bonded validators, plus a simulated block clock. Tests drive
//! the ledger and the slashing engine through it directly.

use {
    solana_clock::UnixTimestamp,
    stakeline_decimal::Dec,
    stakeline_staking::{
        apply_block_infractions, slash, Address, BlockContext, ConsPubKey, FatalError,
        Infraction, InfractionKind, Keeper, MemoryStore, Pool, Redelegation, SlashOutcome,
        StakingParams, StakingStore, UnbondingDelegation, Validator,
    },
};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Tokens in existence at genesis, all loose.
pub const GENESIS_SUPPLY: i64 = 10_000_000;

/// Self-bond of each validator created by [`StakingTestHarness::new`].
pub const DEFAULT_SELF_BOND: i64 = 1_000;

/// Default number of validators in a test network.
pub const DEFAULT_VALIDATOR_COUNT: usize = 4;

/// Seconds per simulated block.
pub const BLOCK_TIME: i64 = 5;

/// Genesis block time.
pub const GENESIS_TIME: UnixTimestamp = 1_700_000_000;

pub fn dec(s: &str) -> Dec {
    s.parse().unwrap()
}

pub fn tokens(amount: i64) -> Dec {
    Dec::from_int(amount)
}

// ─── Test validator ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct TestValidator {
    pub operator: Address,
    pub pubkey: ConsPubKey,
}

// ─── Test harness ────────────────────────────────────────────────────────────

pub struct StakingTestHarness {
    pub keeper: Keeper<MemoryStore>,
    pub validators: Vec<TestValidator>,
    pub height: i64,
    pub time: UnixTimestamp,
}

impl Default for StakingTestHarness {
    fn default() -> Self {
        Self::new(DEFAULT_VALIDATOR_COUNT)
    }
}

impl StakingTestHarness {
    /// `n` validators, each self-bonded with [`DEFAULT_SELF_BOND`].
    pub fn new(num_validators: usize) -> Self {
        Self::with_stakes(&vec![DEFAULT_SELF_BOND; num_validators])
    }

    pub fn with_stakes(stakes: &[i64]) -> Self {
        Self::with_params(StakingParams::default(), stakes)
    }

    /// Validators are created at height 1, in the order given.
    pub fn with_params(params: StakingParams, stakes: &[i64]) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut keeper = Keeper::new(MemoryStore::new(), params);
        keeper
            .set_pool(&Pool {
                loose_tokens: tokens(GENESIS_SUPPLY),
                bonded_tokens: Dec::zero(),
            })
            .unwrap();

        let mut harness = Self {
            keeper,
            validators: Vec::with_capacity(stakes.len()),
            height: 1,
            time: GENESIS_TIME,
        };
        for &stake in stakes {
            harness.add_validator(stake);
        }
        harness
    }

    pub fn add_validator(&mut self, self_bond: i64) -> TestValidator {
        let validator = TestValidator {
            operator: Address::new_unique(),
            pubkey: ConsPubKey::new_unique(),
        };
        let ctx = self.ctx();
        self.keeper
            .create_validator(&ctx, validator.operator, validator.pubkey, &tokens(self_bond))
            .unwrap();
        self.validators.push(validator);
        validator
    }

    pub fn params(&self) -> &StakingParams {
        self.keeper.params()
    }

    pub fn ctx(&self) -> BlockContext {
        BlockContext::new(self.height, self.time)
    }

    pub fn advance_blocks(&mut self, n: i64) {
        self.height += n;
        self.time += n * BLOCK_TIME;
    }

    /// Advance the clock without producing blocks.
    pub fn advance_seconds(&mut self, seconds: i64) {
        self.time += seconds;
    }

    /// Move the clock past the unbonding period, so entries created now
    /// are mature.
    pub fn advance_past_unbonding(&mut self) {
        let seconds = self.params().unbonding_time + 1;
        self.advance_seconds(seconds);
        self.advance_blocks(1);
    }

    // ── Ledger queries ──────────────────────────────────────────────────────

    pub fn validator(&self, index: usize) -> Option<Validator> {
        self.keeper
            .validator(&self.validators[index].operator)
            .unwrap()
    }

    pub fn tokens_of(&self, index: usize) -> Dec {
        self.validator(index)
            .map(|validator| validator.tokens)
            .unwrap_or_default()
    }

    pub fn pool(&self) -> Pool {
        self.keeper.pool().unwrap()
    }

    pub fn total_supply(&self) -> Dec {
        self.pool().total_supply()
    }

    pub fn bonded_operators(&self) -> Vec<Address> {
        self.keeper
            .bonded_validators()
            .unwrap()
            .into_iter()
            .map(|validator| validator.operator)
            .collect()
    }

    /// Sum of bonded validators' tokens. Always equals the pool's bonded
    /// tokens.
    pub fn bonded_validator_tokens(&self) -> Dec {
        self.keeper
            .bonded_validators()
            .unwrap()
            .iter()
            .map(|validator| &validator.tokens)
            .sum()
    }

    // ── Ledger operations at the current block ──────────────────────────────

    /// A fresh delegator bonding `amount` to validator `index`.
    pub fn delegate(&mut self, index: usize, amount: i64) -> Address {
        let delegator = Address::new_unique();
        self.delegate_from(delegator, index, amount);
        delegator
    }

    pub fn delegate_from(&mut self, delegator: Address, index: usize, amount: i64) -> Dec {
        let ctx = self.ctx();
        let validator = self.validators[index].operator;
        self.keeper
            .delegate(&ctx, delegator, validator, &tokens(amount))
            .unwrap()
    }

    pub fn begin_unbonding(
        &mut self,
        delegator: Address,
        index: usize,
        shares: i64,
    ) -> UnbondingDelegation {
        let ctx = self.ctx();
        let validator = self.validators[index].operator;
        self.keeper
            .begin_unbonding(&ctx, delegator, validator, &tokens(shares))
            .unwrap()
    }

    pub fn begin_redelegation(
        &mut self,
        delegator: Address,
        src: usize,
        dst: usize,
        shares: i64,
    ) -> Redelegation {
        let ctx = self.ctx();
        let (src, dst) = (self.validators[src].operator, self.validators[dst].operator);
        self.keeper
            .begin_redelegation(&ctx, delegator, src, dst, &tokens(shares))
            .unwrap()
    }

    pub fn unbonding_delegation(&self, delegator: Address, index: usize) -> UnbondingDelegation {
        self.keeper
            .unbonding_delegation(&delegator, &self.validators[index].operator)
            .unwrap()
            .unwrap()
    }

    pub fn redelegation(&self, delegator: Address, src: usize, dst: usize) -> Redelegation {
        self.keeper
            .redelegation(
                &delegator,
                &self.validators[src].operator,
                &self.validators[dst].operator,
            )
            .unwrap()
            .unwrap()
    }

    pub fn delegation_shares(&self, delegator: Address, index: usize) -> Option<Dec> {
        self.keeper
            .delegation(&delegator, &self.validators[index].operator)
            .unwrap()
            .map(|delegation| delegation.shares)
    }

    // ── Slashing ────────────────────────────────────────────────────────────

    pub fn slash(
        &mut self,
        index: usize,
        infraction_height: i64,
        power: i64,
        fraction: &str,
    ) -> Result<Option<SlashOutcome>, FatalError> {
        let ctx = self.ctx();
        let pubkey = self.validators[index].pubkey;
        slash(
            &mut self.keeper,
            &ctx,
            &pubkey,
            infraction_height,
            power,
            &dec(fraction),
        )
    }

    pub fn infraction(&self, index: usize, height: i64, power: i64, kind: InfractionKind) -> Infraction {
        Infraction {
            pubkey: self.validators[index].pubkey,
            height,
            time: self.time - (self.height - height) * BLOCK_TIME,
            power,
            kind,
        }
    }

    /// Run a block's evidence through the block driver.
    pub fn apply_block(&mut self, infractions: &[Infraction]) -> Result<Vec<SlashOutcome>, FatalError> {
        let ctx = self.ctx();
        let params = self.keeper.params().clone();
        apply_block_infractions(self.keeper.store_mut(), &ctx, &params, infractions)
    }
}
