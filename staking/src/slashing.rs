//! Slashing and jailing.
//!
//! A slash burns a fraction of the stake that backed a validator at the
//! infraction height. That stake may since have moved: part of it can be
//! sitting in unbonding delegations or redelegations created at or after
//! the infraction. Those entries are slashed first, each on its own initial
//! balance, and whatever is left of the penalty is burned from the
//! validator's current tokens.
//!
//! Every `Err` returned here is a [`FatalError`]: the caller presented
//! evidence that cannot be valid, and the block must be abandoned. Expected
//! absences (validator already pruned, ineligible entries, a destination
//! delegation that no longer exists) are logged and contribute nothing.

use {
    crate::{
        address::{Address, ConsPubKey},
        error::FatalError,
        keeper::StakingStore,
        types::{BlockContext, Redelegation, UnbondingDelegation, Validator},
    },
    log::*,
    stakeline_decimal::Dec,
};

/// What a single [`slash`] call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlashOutcome {
    pub operator: Address,
    /// `power * slash_fraction`, the nominal penalty.
    pub slash_amount: Dec,
    /// Penalties credited from unbonding delegations.
    pub unbonding_slashed: Dec,
    /// Penalties credited from redelegations.
    pub redelegation_slashed: Dec,
    /// Tokens burned from the validator itself. Negative when the entries
    /// were credited more than `slash_amount`.
    pub tokens_burned: Dec,
    /// The validator was left with no tokens and removed.
    pub validator_removed: bool,
}

/// Slash the validator behind `pubkey` for an infraction committed at
/// `infraction_height`, when it had `power` stake units bonded.
///
/// Returns `Ok(None)` when no such validator exists: it was already
/// slashed to zero and pruned by an earlier infraction.
pub fn slash<S: StakingStore + ?Sized>(
    store: &mut S,
    ctx: &BlockContext,
    pubkey: &ConsPubKey,
    infraction_height: i64,
    power: i64,
    slash_fraction: &Dec,
) -> Result<Option<SlashOutcome>, FatalError> {
    if slash_fraction.is_negative() {
        return Err(FatalError::NegativeSlashFraction(slash_fraction.clone()));
    }
    if infraction_height > ctx.height {
        return Err(FatalError::FutureInfraction {
            infraction_height,
            current_height: ctx.height,
        });
    }

    let slash_amount = &Dec::from_int(power) * slash_fraction;

    let Some(validator) = store.validator_by_pubkey(pubkey)? else {
        warn!(
            "Ignored attempt to slash a nonexistent validator with address {}, we recommend you \
             investigate immediately",
            pubkey.address()
        );
        return Ok(None);
    };

    if validator.is_unbonded(ctx.time) {
        return Err(FatalError::SlashUnbondedValidator(validator.operator));
    }
    let operator = validator.operator;

    let mut unbonding_slashed = Dec::zero();
    let mut redelegation_slashed = Dec::zero();

    if infraction_height < ctx.height {
        for entry in store.unbonding_delegations_from_validator(&operator)? {
            let amount =
                slash_unbonding_delegation(store, ctx, entry, infraction_height, slash_fraction)?;
            unbonding_slashed = &unbonding_slashed + &amount;
        }
        for entry in store.redelegations_from_validator(&operator)? {
            let amount = slash_redelegation(
                store,
                ctx,
                &validator,
                entry,
                infraction_height,
                slash_fraction,
            )?;
            redelegation_slashed = &redelegation_slashed + &amount;
        }
    } else {
        info!(
            "Slashing at current height {infraction_height}, not scanning unbonding delegations \
             & redelegations"
        );
    }

    let remaining = &slash_amount - &unbonding_slashed - &redelegation_slashed;

    // Unwinding redelegations unbonds from other validators, which can
    // re-rank the bonded set and change this validator's status.
    let mut validator = store.validator_by_pubkey(pubkey)?.unwrap_or(validator);

    // Never more than the validator holds. When the entries were credited
    // more than the nominal amount the remainder is negative and flows back
    // to the validator.
    let tokens_to_burn = remaining.min(validator.tokens.clone());

    let mut pool = store.pool()?;
    validator.remove_tokens(&mut pool, &tokens_to_burn);
    pool.loose_tokens = &pool.loose_tokens - &tokens_to_burn;
    store.set_pool(&pool)?;

    let validator = store.update_validator(ctx, validator)?;
    let validator_removed = validator.tokens.is_zero();
    if validator_removed {
        store.remove_validator(&operator)?;
    }

    info!(
        "Validator {} slashed by slash fraction {slash_fraction}, burned {tokens_to_burn} tokens",
        pubkey.address()
    );

    Ok(Some(SlashOutcome {
        operator,
        slash_amount,
        unbonding_slashed,
        redelegation_slashed,
        tokens_burned: tokens_to_burn,
        validator_removed,
    }))
}

/// Slash one unbonding delegation, returning the nominal penalty
/// `initial_balance * slash_fraction`, or zero if the entry was not
/// contributing stake at `infraction_height`.
///
/// The balance is reduced by at most what it still holds. The pool is
/// reduced by the full nominal penalty.
pub fn slash_unbonding_delegation<S: StakingStore + ?Sized>(
    store: &mut S,
    ctx: &BlockContext,
    mut entry: UnbondingDelegation,
    infraction_height: i64,
    slash_fraction: &Dec,
) -> Result<Dec, FatalError> {
    // Unbonding started before the infraction: that stake did not
    // contribute to it.
    if entry.creation_height < infraction_height {
        return Ok(Dec::zero());
    }
    if entry.is_mature(ctx.time) {
        debug!(
            "unbonding delegation {} -> {} matured at {}, not slashing",
            entry.delegator, entry.validator, entry.min_time
        );
        return Ok(Dec::zero());
    }

    let penalty = &entry.initial_balance * slash_fraction;
    let clamped = penalty.round().min(entry.balance.clone());

    if clamped.is_positive() {
        entry.balance = &entry.balance - &clamped;
        store.set_unbonding_delegation(&entry)?;

        let mut pool = store.pool()?;
        pool.loose_tokens = &pool.loose_tokens - &penalty;
        store.set_pool(&pool)?;
    }

    Ok(penalty)
}

/// Slash one redelegation away from `validator`, returning the nominal
/// penalty like [`slash_unbonding_delegation`].
///
/// The shares the redelegation created at the destination are unbonded in
/// the same proportion and the resulting tokens burned.
pub fn slash_redelegation<S: StakingStore + ?Sized>(
    store: &mut S,
    ctx: &BlockContext,
    validator: &Validator,
    mut entry: Redelegation,
    infraction_height: i64,
    slash_fraction: &Dec,
) -> Result<Dec, FatalError> {
    if entry.creation_height < infraction_height {
        return Ok(Dec::zero());
    }
    if entry.is_mature(ctx.time) {
        debug!(
            "redelegation {} from {} to {} matured at {}, not slashing",
            entry.delegator, validator.operator, entry.validator_dst, entry.min_time
        );
        return Ok(Dec::zero());
    }

    let penalty = &entry.initial_balance * slash_fraction;
    let clamped = penalty.round().min(entry.balance.clone());

    if clamped.is_positive() {
        entry.balance = &entry.balance - &clamped;
        store.set_redelegation(&entry)?;
    }

    let mut shares_to_unbond = slash_fraction * &entry.shares_dst;
    if shares_to_unbond.is_zero() {
        return Ok(penalty);
    }

    let Some(delegation) = store.delegation(&entry.delegator, &entry.validator_dst)? else {
        debug!(
            "delegation {} -> {} already withdrawn, nothing to unbond",
            entry.delegator, entry.validator_dst
        );
        return Ok(penalty);
    };
    if shares_to_unbond > delegation.shares {
        shares_to_unbond = delegation.shares;
    }

    let tokens_to_burn = store
        .unbond(ctx, &entry.delegator, &entry.validator_dst, &shares_to_unbond)
        .map_err(|source| FatalError::Unbond {
            delegator: entry.delegator,
            validator: entry.validator_dst,
            source,
        })?;

    let mut pool = store.pool()?;
    pool.loose_tokens = &pool.loose_tokens - &tokens_to_burn;
    store.set_pool(&pool)?;

    Ok(penalty)
}

pub fn jail<S: StakingStore + ?Sized>(
    store: &mut S,
    ctx: &BlockContext,
    pubkey: &ConsPubKey,
) -> Result<(), FatalError> {
    set_jailed(store, ctx, pubkey, true)?;
    info!("Validator {} jailed", pubkey.address());
    Ok(())
}

pub fn unjail<S: StakingStore + ?Sized>(
    store: &mut S,
    ctx: &BlockContext,
    pubkey: &ConsPubKey,
) -> Result<(), FatalError> {
    set_jailed(store, ctx, pubkey, false)?;
    info!("Validator {} unjailed", pubkey.address());
    Ok(())
}

fn set_jailed<S: StakingStore + ?Sized>(
    store: &mut S,
    ctx: &BlockContext,
    pubkey: &ConsPubKey,
    jailed: bool,
) -> Result<(), FatalError> {
    let Some(mut validator) = store.validator_by_pubkey(pubkey)? else {
        return Err(FatalError::JailUnknownValidator {
            pubkey: *pubkey,
            jailed,
        });
    };
    validator.jailed = jailed;
    store.update_validator(ctx, validator)?;
    Ok(())
}
