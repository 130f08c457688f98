//! Randomness sources answering spin requests.
//!
//! A source maps a request identifier to a 32-byte random word. The ledger never calls a
//! source directly: the coordinator observes `SpinRequested`, asks its source for a word and
//! submits it back as `FulfillRandomness`.

use commonware_cryptography::{
    sha256::{Digest, Sha256},
    Hasher,
};
use wheel_types::wheel::RANDOMNESS_DOMAIN;

pub const SECRET_LEN: usize = 32;

pub trait RandomnessSource {
    fn randomness(&mut self, request_id: &Digest) -> Digest;
}

/// Deterministic source keyed by a secret.
///
/// Each word is `sha256(secret || request_id || "randomness")`. Publishing
/// [HashChainSource::commitment] up front lets anyone check every word once the secret is
/// revealed.
#[derive(Clone)]
pub struct HashChainSource {
    secret: [u8; SECRET_LEN],
}

impl HashChainSource {
    pub fn from_secret(secret: [u8; SECRET_LEN]) -> Self {
        Self { secret }
    }

    /// Derive the secret from a short seed (local sessions and tests).
    pub fn from_seed(seed: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&seed.to_be_bytes());
        hasher.update(b"hash_chain_secret");
        Self::from_secret(hasher.finalize().0)
    }

    pub fn commitment(&self) -> Digest {
        Sha256::hash(&self.secret)
    }

    pub fn secret(&self) -> &[u8; SECRET_LEN] {
        &self.secret
    }
}

impl RandomnessSource for HashChainSource {
    fn randomness(&mut self, request_id: &Digest) -> Digest {
        derive_randomness(&self.secret, request_id)
    }
}

fn derive_randomness(secret: &[u8; SECRET_LEN], request_id: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hasher.update(request_id.as_ref());
    hasher.update(RANDOMNESS_DOMAIN);
    hasher.finalize()
}

/// Check a delivered word against a revealed secret and its earlier commitment.
pub fn verify_randomness(
    commitment: &Digest,
    secret: &[u8; SECRET_LEN],
    request_id: &Digest,
    randomness: &Digest,
) -> bool {
    &Sha256::hash(secret) == commitment && &derive_randomness(secret, request_id) == randomness
}
