use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{
    ed25519::PublicKey,
    sha256::{Digest, Sha256},
    Hasher,
};
use commonware_utils::union;

use super::REQUEST_SUFFIX;

/// Derive the identifier of a randomness request.
///
/// Bound to the namespace, the requesting account and the pool's request counter, so every
/// request issued by a pool is distinct and no caller can pick its own identifier.
pub fn request_id(namespace: &[u8], requester: &PublicKey, nonce: u64) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(&union(namespace, REQUEST_SUFFIX));
    hasher.update(requester.as_ref());
    hasher.update(&nonce.to_be_bytes());
    hasher.finalize()
}

/// A spin awaiting its random word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSpin {
    pub request_id: Digest,
    pub player: PublicKey,
    /// Ordinal of the spin for this player (resolved spins before it).
    pub requested_at: u64,
}

impl Write for PendingSpin {
    fn write(&self, writer: &mut impl BufMut) {
        self.request_id.write(writer);
        self.player.write(writer);
        self.requested_at.write(writer);
    }
}

impl Read for PendingSpin {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            request_id: Digest::read(reader)?,
            player: PublicKey::read(reader)?,
            requested_at: u64::read(reader)?,
        })
    }
}

impl FixedSize for PendingSpin {
    const SIZE: usize = Digest::SIZE + PublicKey::SIZE + u64::SIZE;
}
