use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use commonware_utils::modulo;
use serde::{Deserialize, Serialize};

use super::{FREE_SPIN_MULTIPLE, PRIZE_COUNT};

/// Outcome tiers on the wheel, in table order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[repr(u8)]
pub enum Prize {
    FreeSpin = 0,
    DoubleUp = 1,
    Win5 = 2,
    Win10 = 3,
    Win20 = 4,
    Win30 = 5,
    Lose2 = 6,
    Lose3 = 7,
    Lose5 = 8,
    LoseAll = 9,
}

/// The wheel. Every slot is equally likely.
pub const PRIZE_TABLE: [Prize; PRIZE_COUNT] = [
    Prize::FreeSpin,
    Prize::DoubleUp,
    Prize::Win5,
    Prize::Win10,
    Prize::Win20,
    Prize::Win30,
    Prize::Lose2,
    Prize::Lose3,
    Prize::Lose5,
    Prize::LoseAll,
];

impl Prize {
    /// Select a tier from an oracle-supplied random word (interpreted big-endian, reduced
    /// modulo the table size).
    pub fn from_randomness(randomness: &[u8]) -> Self {
        PRIZE_TABLE[modulo(randomness, PRIZE_COUNT as u64) as usize]
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Multiple of the spin fee credited to unclaimed winnings.
    pub fn win_multiple(&self) -> Option<u64> {
        match self {
            Self::Win5 => Some(5),
            Self::Win10 => Some(10),
            Self::Win20 => Some(20),
            Self::Win30 => Some(30),
            _ => None,
        }
    }

    /// Multiple of the spin fee debited from the stake.
    pub fn loss_multiple(&self) -> Option<u64> {
        match self {
            Self::Lose2 => Some(2),
            Self::Lose3 => Some(3),
            Self::Lose5 => Some(5),
            _ => None,
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, Self::DoubleUp) || self.win_multiple().is_some()
    }

    pub fn is_loss(&self) -> bool {
        matches!(self, Self::LoseAll) || self.loss_multiple().is_some()
    }

    /// Value movements this tier implies for a stake of `balance` (after the spin fee was
    /// taken). House credits are requested here and clamped when the pool settles them.
    pub fn effect(&self, balance: u64, spin_fee: u64) -> Effect {
        let mut effect = Effect::default();
        match self {
            Self::FreeSpin => {
                effect.house_to_balance = spin_fee.saturating_mul(FREE_SPIN_MULTIPLE);
            }
            Self::DoubleUp => {
                effect.balance_to_winnings = balance;
                effect.house_to_winnings = balance;
            }
            Self::LoseAll => {
                effect.balance_to_house = balance;
            }
            prize => {
                if let Some(multiple) = prize.win_multiple() {
                    effect.house_to_winnings = spin_fee.saturating_mul(multiple);
                } else if let Some(multiple) = prize.loss_multiple() {
                    effect.balance_to_house = spin_fee.saturating_mul(multiple).min(balance);
                }
            }
        }
        effect
    }
}

impl Write for Prize {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for Prize {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        PRIZE_TABLE
            .get(value as usize)
            .copied()
            .ok_or(Error::InvalidEnum(value))
    }
}

impl FixedSize for Prize {
    const SIZE: usize = 1;
}

/// Movements of value between a player's stake, their unclaimed winnings and the house
/// reserve. Debits from the stake never exceed it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Effect {
    pub balance_to_house: u64,
    pub balance_to_winnings: u64,
    pub house_to_winnings: u64,
    pub house_to_balance: u64,
}

/// What a settled effect actually moved once the house reserve was accounted for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Settlement {
    /// Value paid by the house to the player (stake and winnings).
    pub credited: u64,
    /// Value taken from the player's stake by the house.
    pub debited: u64,
}
