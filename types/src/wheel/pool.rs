use bytes::{Buf, BufMut};
use commonware_codec::{Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::ed25519::PublicKey;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use super::{Effect, Player, PlayerStatus, Settlement, WheelError, FUNDING_THRESHOLD_MULTIPLE};

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum PoolInvariantError {
    #[error("held funds do not match the ledger (held={held}, accounted={accounted})")]
    ConservationViolated { held: u64, accounted: u128 },
    #[error("closed pool still carries a house reserve ({reserve})")]
    ClosedWithReserve { reserve: u64 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PoolState {
    /// Created, waiting for the house to reach the funding threshold.
    #[default]
    Idle = 0,
    Open = 1,
    /// Terminal. Only fulfillments of earlier requests and claims are accepted.
    Closed = 2,
}

impl Write for PoolState {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for PoolState {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = u8::read(reader)?;
        match value {
            0 => Ok(Self::Idle),
            1 => Ok(Self::Open),
            2 => Ok(Self::Closed),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl FixedSize for PoolState {
    const SIZE: usize = 1;
}

/// The wager pool and its aggregate ledger.
///
/// Every unit held by the pool belongs to exactly one of the house reserve, a player's
/// stake or a player's unclaimed winnings:
///
/// `total_held == house_reserve + total_balances + total_winnings`
///
/// Methods that move value keep this equation intact or fail without touching anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pool {
    pub state: PoolState,
    pub operator: PublicKey,
    pub coordinator: PublicKey,
    pub entry_fee: u64,
    pub spin_fee: u64,
    pub minimum_funding: u64,
    pub total_held: u64,
    pub house_reserve: u64,
    pub total_balances: u64,
    pub total_winnings: u64,
    /// Distinct accounts that have ever entered.
    pub participants: u64,
    pub request_nonce: u64,
}

impl Pool {
    pub fn new(
        operator: PublicKey,
        coordinator: PublicKey,
        entry_fee: u64,
        spin_fee: u64,
    ) -> Result<Self, WheelError> {
        if entry_fee == 0 || spin_fee == 0 {
            return Err(WheelError::InvalidConfig);
        }
        let minimum_funding = entry_fee
            .checked_mul(FUNDING_THRESHOLD_MULTIPLE)
            .ok_or(WheelError::InvalidConfig)?;

        Ok(Self {
            state: PoolState::Idle,
            operator,
            coordinator,
            entry_fee,
            spin_fee,
            minimum_funding,
            total_held: 0,
            house_reserve: 0,
            total_balances: 0,
            total_winnings: 0,
            participants: 0,
            request_nonce: 0,
        })
    }

    pub fn is_operator(&self, public: &PublicKey) -> bool {
        &self.operator == public
    }

    pub fn is_coordinator(&self, public: &PublicKey) -> bool {
        &self.coordinator == public
    }

    pub fn is_open(&self) -> bool {
        self.state == PoolState::Open
    }

    pub fn is_closed(&self) -> bool {
        self.state == PoolState::Closed
    }

    /// Add house capital. Returns `true` if this deposit opened the pool.
    pub fn fund(&mut self, amount: u64) -> Result<bool, WheelError> {
        if self.is_closed() {
            return Err(WheelError::PoolClosed);
        }
        if amount == 0 {
            return Err(WheelError::InvalidAmount);
        }
        let total_held = checked_add(self.total_held, amount)?;
        let house_reserve = checked_add(self.house_reserve, amount)?;
        self.total_held = total_held;
        self.house_reserve = house_reserve;

        if self.state == PoolState::Idle && self.total_held >= self.minimum_funding {
            self.state = PoolState::Open;
            return Ok(true);
        }
        Ok(false)
    }

    /// Credit an entry payment to `player`'s stake.
    pub fn deposit_stake(&mut self, player: &mut Player, payment: u64) -> Result<(), WheelError> {
        if !self.is_open() {
            return Err(WheelError::PoolNotOpen);
        }
        if payment < self.entry_fee {
            return Err(WheelError::InsufficientPayment);
        }
        let total_held = checked_add(self.total_held, payment)?;
        let total_balances = checked_add(self.total_balances, payment)?;
        let balance = checked_add(player.balance, payment)?;

        self.total_held = total_held;
        self.total_balances = total_balances;
        player.balance = balance;
        player.status = PlayerStatus::Active;
        Ok(())
    }

    /// Check that `player` may spin and move the spin fee from their stake to the house.
    pub fn collect_spin_fee(&mut self, player: &mut Player) -> Result<(), WheelError> {
        if !self.is_open() {
            return Err(WheelError::PoolNotOpen);
        }
        if player.balance == 0 {
            return Err(WheelError::NoStake);
        }
        if player.has_pending_spin() {
            return Err(WheelError::SpinAlreadyPending);
        }
        if player.balance < self.spin_fee {
            return Err(WheelError::InsufficientStake);
        }
        let house_reserve = checked_add(self.house_reserve, self.spin_fee)?;

        player.balance -= self.spin_fee;
        self.total_balances -= self.spin_fee;
        self.house_reserve = house_reserve;
        Ok(())
    }

    /// Current request counter, advancing it for the next request.
    pub fn next_request_nonce(&mut self) -> u64 {
        let nonce = self.request_nonce;
        self.request_nonce += 1;
        nonce
    }

    /// Apply a prize effect to `player`. Debits land in the house reserve; house credits are
    /// capped by what the reserve holds at that moment.
    pub fn settle(&mut self, player: &mut Player, effect: Effect) -> Result<Settlement, WheelError> {
        let mut next = self.clone();
        let mut stake = player.balance;
        let mut winnings = player.unclaimed_winnings;

        let debited = effect.balance_to_house.min(stake);
        stake -= debited;
        next.total_balances -= debited;
        next.house_reserve = checked_add(next.house_reserve, debited)?;

        let moved = effect.balance_to_winnings.min(stake);
        stake -= moved;
        next.total_balances -= moved;
        winnings = checked_add(winnings, moved)?;
        next.total_winnings = checked_add(next.total_winnings, moved)?;

        let to_winnings = effect.house_to_winnings.min(next.house_reserve);
        next.house_reserve -= to_winnings;
        winnings = checked_add(winnings, to_winnings)?;
        next.total_winnings = checked_add(next.total_winnings, to_winnings)?;

        let to_balance = effect.house_to_balance.min(next.house_reserve);
        next.house_reserve -= to_balance;
        stake = checked_add(stake, to_balance)?;
        next.total_balances = checked_add(next.total_balances, to_balance)?;

        *self = next;
        player.balance = stake;
        player.unclaimed_winnings = winnings;
        Ok(Settlement {
            credited: to_winnings + to_balance,
            debited,
        })
    }

    /// Zero `player`'s unclaimed winnings and release them from the pool. Returns the amount
    /// owed to the account.
    pub fn pay_out_winnings(&mut self, player: &mut Player) -> Result<u64, WheelError> {
        let amount = player.unclaimed_winnings;
        if amount == 0 {
            return Err(WheelError::NothingToClaim);
        }
        let total_claimed = checked_add(player.total_claimed, amount)?;

        player.unclaimed_winnings = 0;
        player.total_claimed = total_claimed;
        self.total_winnings -= amount;
        self.total_held -= amount;
        Ok(amount)
    }

    /// Move `player`'s remaining stake into the house reserve. Returns the forfeited amount.
    pub fn forfeit_stake(&mut self, player: &mut Player) -> Result<u64, WheelError> {
        let amount = player.balance;
        self.house_reserve = checked_add(self.house_reserve, amount)?;
        self.total_balances -= amount;
        player.balance = 0;
        player.status = PlayerStatus::Depleted;
        Ok(amount)
    }

    /// Stop the pool and release the house reserve. Outstanding winnings stay held for
    /// claims. Stakes must have been forfeited first.
    pub fn close(&mut self) -> Result<u64, WheelError> {
        if self.is_closed() {
            return Err(WheelError::PoolClosed);
        }
        let amount = self
            .house_reserve
            .checked_add(self.total_balances)
            .ok_or(WheelError::ArithmeticOverflow)?;

        self.total_held -= amount;
        self.house_reserve = 0;
        self.total_balances = 0;
        self.state = PoolState::Closed;
        Ok(amount)
    }

    pub fn check_conservation(&self) -> Result<(), PoolInvariantError> {
        let accounted = self.house_reserve as u128
            + self.total_balances as u128
            + self.total_winnings as u128;
        if accounted != self.total_held as u128 {
            return Err(PoolInvariantError::ConservationViolated {
                held: self.total_held,
                accounted,
            });
        }
        if self.is_closed() && self.house_reserve != 0 {
            return Err(PoolInvariantError::ClosedWithReserve {
                reserve: self.house_reserve,
            });
        }
        Ok(())
    }
}

fn checked_add(a: u64, b: u64) -> Result<u64, WheelError> {
    a.checked_add(b).ok_or(WheelError::ArithmeticOverflow)
}

impl Write for Pool {
    fn write(&self, writer: &mut impl BufMut) {
        self.state.write(writer);
        self.operator.write(writer);
        self.coordinator.write(writer);
        self.entry_fee.write(writer);
        self.spin_fee.write(writer);
        self.minimum_funding.write(writer);
        self.total_held.write(writer);
        self.house_reserve.write(writer);
        self.total_balances.write(writer);
        self.total_winnings.write(writer);
        self.participants.write(writer);
        self.request_nonce.write(writer);
    }
}

impl Read for Pool {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let pool = Self {
            state: PoolState::read(reader)?,
            operator: PublicKey::read(reader)?,
            coordinator: PublicKey::read(reader)?,
            entry_fee: u64::read(reader)?,
            spin_fee: u64::read(reader)?,
            minimum_funding: u64::read(reader)?,
            total_held: u64::read(reader)?,
            house_reserve: u64::read(reader)?,
            total_balances: u64::read(reader)?,
            total_winnings: u64::read(reader)?,
            participants: u64::read(reader)?,
            request_nonce: u64::read(reader)?,
        };
        if pool.check_conservation().is_err() {
            return Err(Error::Invalid("Pool", "ledger does not balance"));
        }
        Ok(pool)
    }
}

impl FixedSize for Pool {
    const SIZE: usize = PoolState::SIZE + PublicKey::SIZE * 2 + u64::SIZE * 9;
}
