//! Account/operator addresses and validator consensus keys.

use {
    borsh::{BorshDeserialize, BorshSerialize},
    sha2::{Digest, Sha256},
    std::fmt,
};

/// Length of an account or operator address in bytes.
pub const ADDRESS_BYTES: usize = 20;

/// Length of an ed25519 consensus public key in bytes.
pub const CONS_PUBKEY_BYTES: usize = 32;

/// A delegator or validator-operator address.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct Address([u8; ADDRESS_BYTES]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    /// Parse an address from the exact-length slice found in a store key.
    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; ADDRESS_BYTES]>::try_from(bytes).ok().map(Self)
    }

    /// A fresh address that sorts after every previously generated one.
    #[cfg(any(test, feature = "dev-context-only-utils"))]
    pub fn new_unique() -> Self {
        let mut bytes = [0u8; ADDRESS_BYTES];
        bytes[..8].copy_from_slice(&unique_counter().to_be_bytes());
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

/// A validator's ed25519 consensus public key, as carried in evidence.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct ConsPubKey([u8; CONS_PUBKEY_BYTES]);

impl ConsPubKey {
    pub const fn new(bytes: [u8; CONS_PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; CONS_PUBKEY_BYTES] {
        &self.0
    }

    /// Consensus address: the first 20 bytes of `sha256(pubkey)`.
    pub fn address(&self) -> Address {
        let digest = Sha256::digest(self.0);
        let mut bytes = [0u8; ADDRESS_BYTES];
        bytes.copy_from_slice(&digest[..ADDRESS_BYTES]);
        Address(bytes)
    }

    #[cfg(any(test, feature = "dev-context-only-utils"))]
    pub fn new_unique() -> Self {
        let mut bytes = [0u8; CONS_PUBKEY_BYTES];
        bytes[..8].copy_from_slice(&unique_counter().to_be_bytes());
        Self(bytes)
    }
}

impl fmt::Display for ConsPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ConsPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConsPubKey({self})")
    }
}

#[cfg(any(test, feature = "dev-context-only-utils"))]
fn unique_counter() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}
