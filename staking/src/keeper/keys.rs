//! Store key layout.
//!
//! ```text
//! 0x01                                  -> Pool
//! 0x21 | operator                       -> Validator
//! 0x22 | cons pubkey                    -> operator
//! 0x31 | delegator | validator          -> Delegation
//! 0x41 | delegator | validator          -> UnbondingDelegation
//! 0x42 | validator | delegator          -> () (by-validator index)
//! 0x51 | delegator | src | dst          -> Redelegation
//! 0x52 | src | delegator | dst          -> () (by-source index)
//! ```

use crate::address::{Address, ConsPubKey, ADDRESS_BYTES};

pub const POOL_KEY: &[u8] = &[0x01];
pub const VALIDATORS_KEY: &[u8] = &[0x21];
pub const VALIDATORS_BY_PUBKEY_INDEX_KEY: &[u8] = &[0x22];
pub const DELEGATION_KEY: &[u8] = &[0x31];
pub const UNBONDING_DELEGATION_KEY: &[u8] = &[0x41];
pub const UNBONDING_DELEGATION_BY_VAL_INDEX_KEY: &[u8] = &[0x42];
pub const REDELEGATION_KEY: &[u8] = &[0x51];
pub const REDELEGATION_BY_SRC_INDEX_KEY: &[u8] = &[0x52];

fn join(prefix: &[u8], parts: &[&[u8]]) -> Vec<u8> {
    let mut key = prefix.to_vec();
    for part in parts {
        key.extend_from_slice(part);
    }
    key
}

pub fn validator_key(operator: &Address) -> Vec<u8> {
    join(VALIDATORS_KEY, &[operator.as_bytes()])
}

pub fn validator_by_pubkey_index_key(pubkey: &ConsPubKey) -> Vec<u8> {
    join(VALIDATORS_BY_PUBKEY_INDEX_KEY, &[pubkey.as_bytes()])
}

pub fn delegation_key(delegator: &Address, validator: &Address) -> Vec<u8> {
    join(DELEGATION_KEY, &[delegator.as_bytes(), validator.as_bytes()])
}

pub fn delegations_prefix(delegator: &Address) -> Vec<u8> {
    join(DELEGATION_KEY, &[delegator.as_bytes()])
}

pub fn unbonding_delegation_key(delegator: &Address, validator: &Address) -> Vec<u8> {
    join(
        UNBONDING_DELEGATION_KEY,
        &[delegator.as_bytes(), validator.as_bytes()],
    )
}

pub fn unbonding_delegation_by_val_index_key(validator: &Address, delegator: &Address) -> Vec<u8> {
    join(
        UNBONDING_DELEGATION_BY_VAL_INDEX_KEY,
        &[validator.as_bytes(), delegator.as_bytes()],
    )
}

pub fn unbonding_delegations_by_val_prefix(validator: &Address) -> Vec<u8> {
    join(UNBONDING_DELEGATION_BY_VAL_INDEX_KEY, &[validator.as_bytes()])
}

pub fn redelegation_key(delegator: &Address, src: &Address, dst: &Address) -> Vec<u8> {
    join(
        REDELEGATION_KEY,
        &[delegator.as_bytes(), src.as_bytes(), dst.as_bytes()],
    )
}

pub fn redelegation_by_src_index_key(src: &Address, delegator: &Address, dst: &Address) -> Vec<u8> {
    join(
        REDELEGATION_BY_SRC_INDEX_KEY,
        &[src.as_bytes(), delegator.as_bytes(), dst.as_bytes()],
    )
}

pub fn redelegations_by_src_prefix(src: &Address) -> Vec<u8> {
    join(REDELEGATION_BY_SRC_INDEX_KEY, &[src.as_bytes()])
}

/// Split the addresses following a one-byte prefix, e.g. the
/// `validator | delegator` tail of a by-validator index key.
pub fn parse_addresses<const N: usize>(key: &[u8]) -> Option<[Address; N]> {
    let tail = key.get(1..)?;
    if tail.len() != N * ADDRESS_BYTES {
        return None;
    }
    let mut addresses = [Address::default(); N];
    for (address, chunk) in addresses.iter_mut().zip(tail.chunks_exact(ADDRESS_BYTES)) {
        *address = Address::try_from_slice(chunk)?;
    }
    Some(addresses)
}
