//! Delegations and the two ways stake leaves a validator: unbonding and
//! redelegation.
//!
//! Beginning either one withdraws shares through [`Keeper::unbond_shares`]
//! and records an entry that stays slashable for `unbonding_time`. The
//! entry is removed by the matching `complete_*` call once block time has
//! passed its `min_time`.

use {
    super::{keys, Keeper, StakingStore},
    crate::{
        address::Address,
        error::StakingError,
        store::KvStore,
        types::{BlockContext, Delegation, Redelegation, UnbondingDelegation},
    },
    log::*,
    stakeline_decimal::Dec,
};

impl<S: KvStore> Keeper<S> {
    // -----------------------------------------------------------------------
    // Delegations
    // -----------------------------------------------------------------------

    pub fn set_delegation(&mut self, delegation: &Delegation) -> Result<(), StakingError> {
        self.set_record(
            &keys::delegation_key(&delegation.delegator, &delegation.validator),
            delegation,
        )
    }

    pub fn remove_delegation(&mut self, delegator: &Address, validator: &Address) {
        self.delete_record(&keys::delegation_key(delegator, validator));
    }

    /// Every delegation held by `delegator`, ordered by validator.
    pub fn delegator_delegations(
        &self,
        delegator: &Address,
    ) -> Result<Vec<Delegation>, StakingError> {
        self.scan_records(&keys::delegations_prefix(delegator))
    }

    /// Bond `tokens` from `delegator` to `validator`, returning the shares
    /// issued. The tokens are taken from the loose float.
    pub fn delegate(
        &mut self,
        ctx: &BlockContext,
        delegator: Address,
        validator: Address,
        tokens: &Dec,
    ) -> Result<Dec, StakingError> {
        if !tokens.is_positive() {
            return Err(StakingError::NonPositiveAmount(tokens.clone()));
        }
        let Some(mut target) = self.validator(&validator)? else {
            return Err(StakingError::ValidatorNotFound(validator));
        };

        let mut pool = self.pool()?;
        let issued_shares = target.add_tokens_from_del(&mut pool, tokens)?;

        let mut delegation = self
            .delegation(&delegator, &validator)?
            .unwrap_or_else(|| Delegation::new(delegator, validator));
        delegation.shares = &delegation.shares + &issued_shares;
        delegation.height = ctx.height;

        self.set_pool(&pool)?;
        self.set_delegation(&delegation)?;
        self.update_validator(ctx, target)?;
        debug!("{delegator} delegated {tokens} to {validator} for {issued_shares} shares");
        Ok(issued_shares)
    }

    /// Withdraw `shares` from a delegation and return the tokens they were
    /// worth. The tokens land in the loose float.
    ///
    /// A delegation reduced to zero shares is deleted. If it was the
    /// operator's self-delegation the validator is jailed. A validator left
    /// with no delegator shares is removed.
    pub fn unbond_shares(
        &mut self,
        ctx: &BlockContext,
        delegator: &Address,
        validator: &Address,
        shares: &Dec,
    ) -> Result<Dec, StakingError> {
        let Some(mut delegation) = self.delegation(delegator, validator)? else {
            return Err(StakingError::NoDelegation {
                delegator: *delegator,
                validator: *validator,
            });
        };
        if delegation.shares < *shares {
            return Err(StakingError::InsufficientShares {
                delegator: *delegator,
                validator: *validator,
                held: delegation.shares,
                requested: shares.clone(),
            });
        }
        let Some(mut target) = self.validator(validator)? else {
            return Err(StakingError::ValidatorNotFound(*validator));
        };

        delegation.shares = &delegation.shares - shares;
        if delegation.shares.is_zero() {
            if *delegator == target.operator && !target.jailed {
                info!("operator of validator {validator} withdrew its self-delegation, jailing");
                target.jailed = true;
            }
            self.remove_delegation(delegator, validator);
        } else {
            delegation.height = ctx.height;
            self.set_delegation(&delegation)?;
        }

        let mut pool = self.pool()?;
        let tokens = target.remove_del_shares(&mut pool, shares);
        self.set_pool(&pool)?;

        let target = self.update_validator(ctx, target)?;
        if target.delegator_shares.is_zero() {
            info!("validator {validator} has no delegator shares left, removing");
            self.remove_validator(validator)?;
        }
        Ok(tokens)
    }

    // -----------------------------------------------------------------------
    // Unbonding delegations
    // -----------------------------------------------------------------------

    pub fn unbonding_delegation(
        &self,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Option<UnbondingDelegation>, StakingError> {
        self.get_record(&keys::unbonding_delegation_key(delegator, validator))
    }

    pub fn remove_unbonding_delegation(&mut self, delegator: &Address, validator: &Address) {
        self.delete_record(&keys::unbonding_delegation_key(delegator, validator));
        self.delete_record(&keys::unbonding_delegation_by_val_index_key(
            validator, delegator,
        ));
    }

    /// Start withdrawing `shares` from `validator`. One unbonding delegation
    /// may be in flight per delegator/validator pair.
    pub fn begin_unbonding(
        &mut self,
        ctx: &BlockContext,
        delegator: Address,
        validator: Address,
        shares: &Dec,
    ) -> Result<UnbondingDelegation, StakingError> {
        if !shares.is_positive() {
            return Err(StakingError::NonPositiveAmount(shares.clone()));
        }
        if self.unbonding_delegation(&delegator, &validator)?.is_some() {
            return Err(StakingError::ExistingUnbondingDelegation {
                delegator,
                validator,
            });
        }

        let tokens = self.unbond_shares(ctx, &delegator, &validator, shares)?;
        let entry = UnbondingDelegation {
            delegator,
            validator,
            creation_height: ctx.height,
            min_time: ctx.time.saturating_add(self.params.unbonding_time),
            initial_balance: tokens.clone(),
            balance: tokens,
        };
        self.set_unbonding_delegation(&entry)?;
        debug!(
            "{delegator} began unbonding {} from {validator}, matures after {}",
            entry.balance, entry.min_time
        );
        Ok(entry)
    }

    /// Release a matured unbonding delegation, returning the balance owed
    /// to the delegator after any slashes.
    pub fn complete_unbonding(
        &mut self,
        ctx: &BlockContext,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Dec, StakingError> {
        let Some(entry) = self.unbonding_delegation(delegator, validator)? else {
            return Err(StakingError::NoUnbondingDelegation {
                delegator: *delegator,
                validator: *validator,
            });
        };
        if !entry.is_mature(ctx.time) {
            return Err(StakingError::NotMature {
                min_time: entry.min_time,
                now: ctx.time,
            });
        }
        self.remove_unbonding_delegation(delegator, validator);
        Ok(entry.balance)
    }

    // -----------------------------------------------------------------------
    // Redelegations
    // -----------------------------------------------------------------------

    pub fn redelegation(
        &self,
        delegator: &Address,
        src: &Address,
        dst: &Address,
    ) -> Result<Option<Redelegation>, StakingError> {
        self.get_record(&keys::redelegation_key(delegator, src, dst))
    }

    pub fn remove_redelegation(&mut self, delegator: &Address, src: &Address, dst: &Address) {
        self.delete_record(&keys::redelegation_key(delegator, src, dst));
        self.delete_record(&keys::redelegation_by_src_index_key(src, delegator, dst));
    }

    /// Move `shares` worth of stake from `src` to `dst` without waiting out
    /// the unbonding period. The moved stake stays answerable for
    /// infractions of `src` until the redelegation matures.
    pub fn begin_redelegation(
        &mut self,
        ctx: &BlockContext,
        delegator: Address,
        src: Address,
        dst: Address,
        shares: &Dec,
    ) -> Result<Redelegation, StakingError> {
        if src == dst {
            return Err(StakingError::SelfRedelegation(src));
        }
        if !shares.is_positive() {
            return Err(StakingError::NonPositiveAmount(shares.clone()));
        }
        if self.redelegation(&delegator, &src, &dst)?.is_some() {
            return Err(StakingError::ExistingRedelegation {
                delegator,
                src,
                dst,
            });
        }
        if self.validator(&dst)?.is_none() {
            return Err(StakingError::ValidatorNotFound(dst));
        }

        let tokens = self.unbond_shares(ctx, &delegator, &src, shares)?;
        let shares_dst = self.delegate(ctx, delegator, dst, &tokens)?;

        let entry = Redelegation {
            delegator,
            validator_src: src,
            validator_dst: dst,
            creation_height: ctx.height,
            min_time: ctx.time.saturating_add(self.params.unbonding_time),
            initial_balance: tokens.clone(),
            balance: tokens,
            shares_src: shares.clone(),
            shares_dst,
        };
        self.set_redelegation(&entry)?;
        debug!(
            "{delegator} redelegated {} from {src} to {dst}, matures after {}",
            entry.balance, entry.min_time
        );
        Ok(entry)
    }

    pub fn complete_redelegation(
        &mut self,
        ctx: &BlockContext,
        delegator: &Address,
        src: &Address,
        dst: &Address,
    ) -> Result<(), StakingError> {
        let Some(entry) = self.redelegation(delegator, src, dst)? else {
            return Err(StakingError::NoRedelegation {
                delegator: *delegator,
                src: *src,
                dst: *dst,
            });
        };
        if !entry.is_mature(ctx.time) {
            return Err(StakingError::NotMature {
                min_time: entry.min_time,
                now: ctx.time,
            });
        }
        self.remove_redelegation(delegator, src, dst);
        Ok(())
    }
}
