//! The staking keeper: validator, pool, delegation, unbonding and
//! redelegation ledgers over a [`KvStore`].
//!
//! [`StakingStore`] is the contract the slashing engine consumes. [`Keeper`]
//! implements it, plus the operations that create and mature the entries
//! slashing acts on (see [`validator`] and [`delegation`]).
//!
//! Every operation reads the records it needs from the store, mutates them,
//! and writes them back before returning. Nothing is cached between calls.

pub mod delegation;
pub mod keys;
pub mod validator;

use {
    crate::{
        address::{Address, ConsPubKey},
        error::StakingError,
        params::StakingParams,
        store::KvStore,
        types::{BlockContext, Delegation, Pool, Redelegation, UnbondingDelegation, Validator},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    stakeline_decimal::Dec,
};

/// Ledger access required by the slashing engine.
pub trait StakingStore {
    fn validator_by_pubkey(&self, pubkey: &ConsPubKey) -> Result<Option<Validator>, StakingError>;

    /// Persist `validator` and apply any bonding-status transitions it
    /// triggers. Returns the validator as stored afterwards.
    fn update_validator(
        &mut self,
        ctx: &BlockContext,
        validator: Validator,
    ) -> Result<Validator, StakingError>;

    fn remove_validator(&mut self, operator: &Address) -> Result<(), StakingError>;

    fn pool(&self) -> Result<Pool, StakingError>;

    fn set_pool(&mut self, pool: &Pool) -> Result<(), StakingError>;

    fn unbonding_delegations_from_validator(
        &self,
        operator: &Address,
    ) -> Result<Vec<UnbondingDelegation>, StakingError>;

    fn set_unbonding_delegation(&mut self, entry: &UnbondingDelegation) -> Result<(), StakingError>;

    fn redelegations_from_validator(
        &self,
        operator: &Address,
    ) -> Result<Vec<Redelegation>, StakingError>;

    fn set_redelegation(&mut self, entry: &Redelegation) -> Result<(), StakingError>;

    fn delegation(
        &self,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Option<Delegation>, StakingError>;

    /// Withdraw `shares` of `delegator`'s delegation to `validator`,
    /// returning the tokens released from the validator.
    fn unbond(
        &mut self,
        ctx: &BlockContext,
        delegator: &Address,
        validator: &Address,
        shares: &Dec,
    ) -> Result<Dec, StakingError>;
}

pub struct Keeper<S> {
    store: S,
    params: StakingParams,
}

impl<S: KvStore> Keeper<S> {
    pub fn new(store: S, params: StakingParams) -> Self {
        Self { store, params }
    }

    pub fn params(&self) -> &StakingParams {
        &self.params
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // -----------------------------------------------------------------------
    // Record encoding
    // -----------------------------------------------------------------------

    fn get_record<T: BorshDeserialize>(&self, key: &[u8]) -> Result<Option<T>, StakingError> {
        self.store
            .get(key)
            .map(|bytes| borsh::from_slice(&bytes).map_err(|err| codec_error(key, err)))
            .transpose()
    }

    fn set_record<T: BorshSerialize>(&mut self, key: &[u8], record: &T) -> Result<(), StakingError> {
        let bytes = borsh::to_vec(record).map_err(|err| codec_error(key, err))?;
        self.store.set(key, bytes);
        Ok(())
    }

    fn delete_record(&mut self, key: &[u8]) {
        self.store.delete(key);
    }

    /// Decode every record under `prefix`, in key order.
    fn scan_records<T: BorshDeserialize>(&self, prefix: &[u8]) -> Result<Vec<T>, StakingError> {
        self.store
            .prefix_scan(prefix)
            .into_iter()
            .map(|(key, bytes)| borsh::from_slice(&bytes).map_err(|err| codec_error(&key, err)))
            .collect()
    }
}

fn codec_error(key: &[u8], err: std::io::Error) -> StakingError {
    StakingError::Codec {
        key: hex::encode(key),
        reason: err.to_string(),
    }
}

impl<S: KvStore> StakingStore for Keeper<S> {
    fn validator_by_pubkey(&self, pubkey: &ConsPubKey) -> Result<Option<Validator>, StakingError> {
        let Some(operator) = self.get_record::<Address>(&keys::validator_by_pubkey_index_key(pubkey))?
        else {
            return Ok(None);
        };
        self.validator(&operator)
    }

    fn update_validator(
        &mut self,
        ctx: &BlockContext,
        validator: Validator,
    ) -> Result<Validator, StakingError> {
        let operator = validator.operator;
        self.set_validator(&validator)?;
        self.apply_bonded_set(ctx)?;
        Ok(self.validator(&operator)?.unwrap_or(validator))
    }

    fn remove_validator(&mut self, operator: &Address) -> Result<(), StakingError> {
        let Some(validator) = self.validator(operator)? else {
            return Ok(());
        };
        self.delete_record(&keys::validator_key(operator));
        self.delete_record(&keys::validator_by_pubkey_index_key(&validator.pubkey));
        Ok(())
    }

    fn pool(&self) -> Result<Pool, StakingError> {
        Ok(self.get_record(keys::POOL_KEY)?.unwrap_or_default())
    }

    fn set_pool(&mut self, pool: &Pool) -> Result<(), StakingError> {
        self.set_record(keys::POOL_KEY, pool)
    }

    fn unbonding_delegations_from_validator(
        &self,
        operator: &Address,
    ) -> Result<Vec<UnbondingDelegation>, StakingError> {
        let mut entries = Vec::new();
        for (key, _) in self
            .store
            .prefix_scan(&keys::unbonding_delegations_by_val_prefix(operator))
        {
            let [validator, delegator] = keys::parse_addresses::<2>(&key).ok_or_else(|| {
                StakingError::Codec {
                    key: hex::encode(&key),
                    reason: "malformed unbonding delegation index key".to_string(),
                }
            })?;
            if let Some(entry) = self.unbonding_delegation(&delegator, &validator)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn set_unbonding_delegation(&mut self, entry: &UnbondingDelegation) -> Result<(), StakingError> {
        self.set_record(
            &keys::unbonding_delegation_key(&entry.delegator, &entry.validator),
            entry,
        )?;
        self.store.set(
            &keys::unbonding_delegation_by_val_index_key(&entry.validator, &entry.delegator),
            Vec::new(),
        );
        Ok(())
    }

    fn redelegations_from_validator(
        &self,
        operator: &Address,
    ) -> Result<Vec<Redelegation>, StakingError> {
        let mut entries = Vec::new();
        for (key, _) in self
            .store
            .prefix_scan(&keys::redelegations_by_src_prefix(operator))
        {
            let [src, delegator, dst] = keys::parse_addresses::<3>(&key).ok_or_else(|| {
                StakingError::Codec {
                    key: hex::encode(&key),
                    reason: "malformed redelegation index key".to_string(),
                }
            })?;
            if let Some(entry) = self.redelegation(&delegator, &src, &dst)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn set_redelegation(&mut self, entry: &Redelegation) -> Result<(), StakingError> {
        self.set_record(
            &keys::redelegation_key(&entry.delegator, &entry.validator_src, &entry.validator_dst),
            entry,
        )?;
        self.store.set(
            &keys::redelegation_by_src_index_key(
                &entry.validator_src,
                &entry.delegator,
                &entry.validator_dst,
            ),
            Vec::new(),
        );
        Ok(())
    }

    fn delegation(
        &self,
        delegator: &Address,
        validator: &Address,
    ) -> Result<Option<Delegation>, StakingError> {
        self.get_record(&keys::delegation_key(delegator, validator))
    }

    fn unbond(
        &mut self,
        ctx: &BlockContext,
        delegator: &Address,
        validator: &Address,
        shares: &Dec,
    ) -> Result<Dec, StakingError> {
        self.unbond_shares(ctx, delegator, validator, shares)
    }
}
