use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::sha256::Digest;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::Prize;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum PlayerInvariantError {
    #[error("depleted player still holds a stake (balance={balance})")]
    DepletedWithStake { balance: u64 },
    #[error("active player has neither stake nor pending spin")]
    ActiveWithoutStake,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerStatus {
    #[default]
    Active = 0,
    /// Stake exhausted by a resolved spin, or forfeited at close.
    Depleted = 1,
}

impl Write for PlayerStatus {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for PlayerStatus {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Active),
            1 => Ok(Self::Depleted),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for PlayerStatus {
    const SIZE: usize = 1;
}

/// Per-account wager ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Player {
    /// Stake available for spins.
    pub balance: u64,
    /// Winnings owed to the account, paid out by a claim.
    pub unclaimed_winnings: u64,
    pub last_prize: Option<Prize>,
    pub status: PlayerStatus,
    /// Request awaiting randomness, if any. At most one per account.
    pub pending_request: Option<Digest>,
    /// Resolved spins.
    pub spins: u64,
    pub total_claimed: u64,
}

impl Player {
    pub fn has_pending_spin(&self) -> bool {
        self.pending_request.is_some()
    }

    /// Mark the account depleted once its stake is gone.
    pub fn refresh_status(&mut self) {
        self.status = if self.balance == 0 {
            PlayerStatus::Depleted
        } else {
            PlayerStatus::Active
        };
    }

    pub fn validate_invariants(&self) -> Result<(), PlayerInvariantError> {
        match self.status {
            PlayerStatus::Depleted if self.balance != 0 => {
                Err(PlayerInvariantError::DepletedWithStake {
                    balance: self.balance,
                })
            }
            PlayerStatus::Active if self.balance == 0 && self.pending_request.is_none() => {
                Err(PlayerInvariantError::ActiveWithoutStake)
            }
            _ => Ok(()),
        }
    }
}

impl Write for Player {
    fn write(&self, writer: &mut impl BufMut) {
        self.balance.write(writer);
        self.unclaimed_winnings.write(writer);
        self.last_prize.write(writer);
        self.status.write(writer);
        self.pending_request.write(writer);
        self.spins.write(writer);
        self.total_claimed.write(writer);
    }
}

impl Read for Player {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            balance: u64::read(reader)?,
            unclaimed_winnings: u64::read(reader)?,
            last_prize: Option::<Prize>::read(reader)?,
            status: PlayerStatus::read(reader)?,
            pending_request: Option::<Digest>::read(reader)?,
            spins: u64::read(reader)?,
            total_claimed: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Player {
    fn encode_size(&self) -> usize {
        self.balance.encode_size()
            + self.unclaimed_winnings.encode_size()
            + self.last_prize.encode_size()
            + self.status.encode_size()
            + self.pending_request.encode_size()
            + self.spins.encode_size()
            + self.total_claimed.encode_size()
    }
}
