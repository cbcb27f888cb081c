//! Evidence handling: turning reported infractions into slashes and jails.

use {
    crate::{
        address::ConsPubKey,
        error::FatalError,
        keeper::{Keeper, StakingStore},
        params::StakingParams,
        slashing::{jail, slash, SlashOutcome},
        store::{CacheStore, KvStore},
        types::BlockContext,
    },
    borsh::{BorshDeserialize, BorshSerialize},
    log::*,
    serde::{Deserialize, Serialize},
    solana_clock::UnixTimestamp,
    std::fmt,
};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub enum InfractionKind {
    /// Signed two different blocks at the same height.
    DoubleSign,
    /// Missed too many blocks in the signing window.
    Downtime,
}

impl fmt::Display for InfractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoubleSign => f.write_str("double-sign"),
            Self::Downtime => f.write_str("downtime"),
        }
    }
}

/// Evidence of misbehavior, as reported by consensus.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Infraction {
    pub pubkey: ConsPubKey,
    /// Height the infraction was committed at.
    pub height: i64,
    /// Block time at `height`.
    pub time: UnixTimestamp,
    /// Voting power of the validator at `height`.
    pub power: i64,
    pub kind: InfractionKind,
}

/// Slash and jail the validator named by `infraction`.
///
/// Evidence older than `max_evidence_age` is ignored: the stake that
/// committed it may already have been released. Returns the slash outcome,
/// or `None` when nothing was slashed.
pub fn handle_infraction<S: StakingStore + ?Sized>(
    store: &mut S,
    ctx: &BlockContext,
    params: &StakingParams,
    infraction: &Infraction,
) -> Result<Option<SlashOutcome>, FatalError> {
    let age = ctx.time.saturating_sub(infraction.time);
    if age > params.max_evidence_age {
        info!(
            "Ignored {} evidence for {} at height {}: age {age}s exceeds max {}s",
            infraction.kind,
            infraction.pubkey.address(),
            infraction.height,
            params.max_evidence_age
        );
        return Ok(None);
    }

    let outcome = slash(
        store,
        ctx,
        &infraction.pubkey,
        infraction.height,
        infraction.power,
        params.slash_fraction(infraction.kind),
    )?;

    if let Some(validator) = store.validator_by_pubkey(&infraction.pubkey)? {
        if !validator.jailed {
            jail(store, ctx, &infraction.pubkey)?;
        }
    }
    Ok(outcome)
}

/// Apply a block's evidence in order against a branch of `kv`.
///
/// The branch is written back only if every infraction is handled. On the
/// first [`FatalError`] every write made for the block is discarded and the
/// error returned.
pub fn apply_block_infractions<S: KvStore + ?Sized>(
    kv: &mut S,
    ctx: &BlockContext,
    params: &StakingParams,
    infractions: &[Infraction],
) -> Result<Vec<SlashOutcome>, FatalError> {
    let mut cache = CacheStore::new(kv);
    let mut outcomes = Vec::with_capacity(infractions.len());
    {
        let mut keeper = Keeper::new(&mut cache, params.clone());
        for infraction in infractions {
            match handle_infraction(&mut keeper, ctx, params, infraction) {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => {}
                Err(err) => {
                    error!(
                        "Aborting block {}: {err}; discarding all staking writes",
                        ctx.height
                    );
                    return Err(err);
                }
            }
        }
    }
    debug!(
        "block {} handled {} infractions, committing {} writes",
        ctx.height,
        infractions.len(),
        cache.pending_writes()
    );
    cache.write();
    Ok(outcomes)
}
