//! Validator records and the bonded-set ranking.

use {
    super::{keys, Keeper, StakingStore},
    crate::{
        address::{Address, ConsPubKey},
        error::StakingError,
        store::KvStore,
        types::{BlockContext, BondStatus, Validator},
    },
    log::*,
    stakeline_decimal::Dec,
    std::cmp::Ordering,
};

impl<S: KvStore> Keeper<S> {
    pub fn validator(&self, operator: &Address) -> Result<Option<Validator>, StakingError> {
        self.get_record(&keys::validator_key(operator))
    }

    /// Every validator, ordered by operator address.
    pub fn validators(&self) -> Result<Vec<Validator>, StakingError> {
        self.scan_records(keys::VALIDATORS_KEY)
    }

    /// The bonded set, ordered by power descending.
    pub fn bonded_validators(&self) -> Result<Vec<Validator>, StakingError> {
        let mut bonded: Vec<Validator> = self
            .validators()?
            .into_iter()
            .filter(Validator::is_bonded)
            .collect();
        bonded.sort_by(by_power);
        Ok(bonded)
    }

    /// Write the validator record and its pubkey index. No status
    /// transitions; see [`StakingStore::update_validator`].
    pub fn set_validator(&mut self, validator: &Validator) -> Result<(), StakingError> {
        self.set_record(&keys::validator_key(&validator.operator), validator)?;
        self.set_record(
            &keys::validator_by_pubkey_index_key(&validator.pubkey),
            &validator.operator,
        )
    }

    /// Register a validator and bond `self_bond` tokens to it from its
    /// operator. The self-delegation is what keeps the validator unjailed:
    /// unbonding all of it jails the validator.
    pub fn create_validator(
        &mut self,
        ctx: &BlockContext,
        operator: Address,
        pubkey: ConsPubKey,
        self_bond: &Dec,
    ) -> Result<Validator, StakingError> {
        if self.validator(&operator)?.is_some() {
            return Err(StakingError::ValidatorExists(operator));
        }
        if self.validator_by_pubkey(&pubkey)?.is_some() {
            return Err(StakingError::PubKeyRegistered(pubkey));
        }
        if !self_bond.is_positive() {
            return Err(StakingError::NonPositiveAmount(self_bond.clone()));
        }
        self.set_validator(&Validator::new(operator, pubkey))?;
        self.delegate(ctx, operator, operator, self_bond)?;
        info!("created validator {operator} with pubkey {pubkey}, self bond {self_bond}");
        self.validator(&operator)?
            .ok_or(StakingError::ValidatorNotFound(operator))
    }

    /// Recompute the bonded set and move every validator whose membership
    /// changed, together with its tokens in the pool.
    ///
    /// Candidates are the non-jailed validators with tokens, ranked by
    /// tokens descending and then operator ascending. The first
    /// `max_validators` are bonded. Validators that fall out start
    /// unbonding; unbonding validators past their minimum time become
    /// unbonded.
    pub(crate) fn apply_bonded_set(&mut self, ctx: &BlockContext) -> Result<(), StakingError> {
        let mut validators = self.validators()?;
        validators.sort_by(by_power);

        let max_validators = usize::from(self.params.max_validators);
        let mut pool = self.pool()?;
        let mut pool_changed = false;
        let mut bonded_count = 0;

        for mut validator in validators {
            let eligible = !validator.jailed && validator.tokens.is_positive();
            let in_set = eligible && bonded_count < max_validators;
            if in_set {
                bonded_count += 1;
            }

            let before = validator.status;
            match (validator.status, in_set) {
                (BondStatus::Bonded, true) => {}
                (BondStatus::Unbonded | BondStatus::Unbonding, true) => {
                    pool.loose_to_bonded(&validator.tokens);
                    validator.status = BondStatus::Bonded;
                    validator.bond_height = ctx.height;
                    pool_changed = true;
                }
                (BondStatus::Bonded, false) => {
                    pool.bonded_to_loose(&validator.tokens);
                    validator.status = BondStatus::Unbonding;
                    validator.unbonding_height = ctx.height;
                    validator.unbonding_min_time =
                        ctx.time.saturating_add(self.params.unbonding_time);
                    pool_changed = true;
                }
                (BondStatus::Unbonding, false) => {
                    if validator.unbonding_min_time < ctx.time {
                        validator.status = BondStatus::Unbonded;
                    }
                }
                (BondStatus::Unbonded, false) => {}
            }

            if validator.status != before {
                debug!(
                    "validator {} moved from {:?} to {:?} at height {}",
                    validator.operator, before, validator.status, ctx.height
                );
                self.set_validator(&validator)?;
            }
        }

        if pool_changed {
            self.set_pool(&pool)?;
        }
        Ok(())
    }
}

fn by_power(a: &Validator, b: &Validator) -> Ordering {
    b.tokens
        .cmp(&a.tokens)
        .then_with(|| a.operator.cmp(&b.operator))
}
