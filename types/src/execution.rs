use bytes::{Buf, BufMut};
use commonware_codec::{Encode, EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::{
    ed25519::{self, PublicKey},
    sha256::{Digest, Sha256},
    Digestible, Hasher, Signer, Verifier,
};
use commonware_utils::union;

use crate::wheel::{
    read_string, string_encode_size, write_string, PendingSpin, Player, Pool, Prize,
    MAX_MESSAGE_LENGTH,
};

pub const NAMESPACE: &[u8] = b"_WHEEL";
pub const TRANSACTION_SUFFIX: &[u8] = b"_TX";

#[inline]
pub fn transaction_namespace(namespace: &[u8]) -> Vec<u8> {
    union(namespace, TRANSACTION_SUFFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub nonce: u64,
    pub instruction: Instruction,

    pub public: ed25519::PublicKey,
    pub signature: ed25519::Signature,
}

impl Transaction {
    fn payload(nonce: &u64, instruction: &Instruction) -> Vec<u8> {
        let mut payload = Vec::with_capacity(nonce.encode_size() + instruction.encode_size());
        nonce.write(&mut payload);
        instruction.write(&mut payload);
        payload
    }

    pub fn sign(private: &ed25519::PrivateKey, nonce: u64, instruction: Instruction) -> Self {
        let signature = private.sign(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&nonce, &instruction),
        );

        Self {
            nonce,
            instruction,
            public: private.public_key(),
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        self.public.verify(
            &transaction_namespace(NAMESPACE),
            &Self::payload(&self.nonce, &self.instruction),
            &self.signature,
        )
    }
}

impl Write for Transaction {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
        self.instruction.write(writer);
        self.public.write(writer);
        self.signature.write(writer);
    }
}

impl Read for Transaction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
            instruction: Instruction::read(reader)?,
            public: ed25519::PublicKey::read(reader)?,
            signature: ed25519::Signature::read(reader)?,
        })
    }
}

impl EncodeSize for Transaction {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
            + self.instruction.encode_size()
            + self.public.encode_size()
            + self.signature.encode_size()
    }
}

impl Digestible for Transaction {
    type Digest = Digest;

    fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.nonce.to_be_bytes().as_ref());
        hasher.update(self.instruction.encode().as_ref());
        hasher.update(self.public.as_ref());
        // The signature is excluded: any valid signature authorizes the same transaction.
        hasher.finalize()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// Create the pool. The signer becomes its operator.
    CreatePool {
        entry_fee: u64,
        spin_fee: u64,
        coordinator: PublicKey,
    },
    /// Deposit house capital (operator only).
    Fund { amount: u64 },
    /// Stake `payment` (at least the entry fee).
    Enter { payment: u64 },
    /// Pay the spin fee and request randomness.
    Spin,
    /// Deliver the random word for a pending request (coordinator only).
    FulfillRandomness { request_id: Digest, randomness: Digest },
    /// Pay out `player`'s unclaimed winnings to `player`.
    Claim { player: PublicKey },
    /// Stop the pool and release the house reserve (operator only).
    Close,
}

impl Write for Instruction {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::CreatePool {
                entry_fee,
                spin_fee,
                coordinator,
            } => {
                0u8.write(writer);
                entry_fee.write(writer);
                spin_fee.write(writer);
                coordinator.write(writer);
            }
            Self::Fund { amount } => {
                1u8.write(writer);
                amount.write(writer);
            }
            Self::Enter { payment } => {
                2u8.write(writer);
                payment.write(writer);
            }
            Self::Spin => 3u8.write(writer),
            Self::FulfillRandomness {
                request_id,
                randomness,
            } => {
                4u8.write(writer);
                request_id.write(writer);
                randomness.write(writer);
            }
            Self::Claim { player } => {
                5u8.write(writer);
                player.write(writer);
            }
            Self::Close => 6u8.write(writer),
        }
    }
}

impl Read for Instruction {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let instruction = match u8::read(reader)? {
            0 => Self::CreatePool {
                entry_fee: u64::read(reader)?,
                spin_fee: u64::read(reader)?,
                coordinator: PublicKey::read(reader)?,
            },
            1 => Self::Fund {
                amount: u64::read(reader)?,
            },
            2 => Self::Enter {
                payment: u64::read(reader)?,
            },
            3 => Self::Spin,
            4 => Self::FulfillRandomness {
                request_id: Digest::read(reader)?,
                randomness: Digest::read(reader)?,
            },
            5 => Self::Claim {
                player: PublicKey::read(reader)?,
            },
            6 => Self::Close,
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(instruction)
    }
}

impl EncodeSize for Instruction {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::CreatePool { .. } => u64::SIZE * 2 + PublicKey::SIZE,
                Self::Fund { .. } | Self::Enter { .. } => u64::SIZE,
                Self::Spin | Self::Close => 0,
                Self::FulfillRandomness { .. } => Digest::SIZE * 2,
                Self::Claim { .. } => PublicKey::SIZE,
            }
    }
}

/// Minimal account structure for transaction nonce tracking.
#[derive(Clone, Default, Eq, PartialEq, Debug)]
pub struct Account {
    pub nonce: u64,
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.nonce.write(writer);
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            nonce: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.nonce.encode_size()
    }
}

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    /// Account for nonce tracking (tag 0)
    Account(PublicKey),
    /// The pool singleton (tag 1)
    Pool,
    /// Per-account wager ledger (tag 2)
    Player(PublicKey),
    /// Entry order index to account (tag 3)
    Participant(u64),
    /// Outstanding randomness request (tag 4)
    PendingSpin(Digest),
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(pk) => {
                0u8.write(writer);
                pk.write(writer);
            }
            Self::Pool => 1u8.write(writer),
            Self::Player(pk) => {
                2u8.write(writer);
                pk.write(writer);
            }
            Self::Participant(index) => {
                3u8.write(writer);
                index.write(writer);
            }
            Self::PendingSpin(request_id) => {
                4u8.write(writer);
                request_id.write(writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Account(PublicKey::read(reader)?),
            1 => Self::Pool,
            2 => Self::Player(PublicKey::read(reader)?),
            3 => Self::Participant(u64::read(reader)?),
            4 => Self::PendingSpin(Digest::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(_) | Self::Player(_) => PublicKey::SIZE,
                Self::Pool => 0,
                Self::Participant(_) => u64::SIZE,
                Self::PendingSpin(_) => Digest::SIZE,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Value {
    Account(Account),
    Pool(Pool),
    Player(Player),
    Participant(PublicKey),
    PendingSpin(PendingSpin),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Account(account) => {
                0u8.write(writer);
                account.write(writer);
            }
            Self::Pool(pool) => {
                1u8.write(writer);
                pool.write(writer);
            }
            Self::Player(player) => {
                2u8.write(writer);
                player.write(writer);
            }
            Self::Participant(public) => {
                3u8.write(writer);
                public.write(writer);
            }
            Self::PendingSpin(pending) => {
                4u8.write(writer);
                pending.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Account(Account::read(reader)?),
            1 => Self::Pool(Pool::read(reader)?),
            2 => Self::Player(Player::read(reader)?),
            3 => Self::Participant(PublicKey::read(reader)?),
            4 => Self::PendingSpin(PendingSpin::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Account(account) => account.encode_size(),
                Self::Pool(pool) => pool.encode_size(),
                Self::Player(player) => player.encode_size(),
                Self::Participant(public) => public.encode_size(),
                Self::PendingSpin(pending) => pending.encode_size(),
            }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    PoolCreated {
        operator: PublicKey,
        coordinator: PublicKey,
        entry_fee: u64,
        spin_fee: u64,
        minimum_funding: u64,
    },
    PoolFunded {
        amount: u64,
        total_held: u64,
    },
    PoolOpened {
        total_held: u64,
    },
    PlayerEntered {
        player: PublicKey,
        payment: u64,
        balance: u64,
        first_entry: bool,
    },
    /// Outbound randomness request. The coordinator answers with `FulfillRandomness`.
    SpinRequested {
        player: PublicKey,
        request_id: Digest,
    },
    PrizeResolved {
        player: PublicKey,
        request_id: Digest,
        prize: Prize,
        balance: u64,
        unclaimed_winnings: u64,
        /// Value paid by the house.
        credited: u64,
        /// Value taken from the stake.
        debited: u64,
    },
    /// Outbound transfer of `amount` to `player`.
    WinningsClaimed {
        player: PublicKey,
        amount: u64,
    },
    /// Outbound transfer of `amount` to `operator`.
    PoolClosed {
        operator: PublicKey,
        amount: u64,
        reserved_winnings: u64,
    },
    TransactionRejected {
        public: PublicKey,
        code: u8,
        message: String,
    },
}

impl Write for Event {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::PoolCreated {
                operator,
                coordinator,
                entry_fee,
                spin_fee,
                minimum_funding,
            } => {
                0u8.write(writer);
                operator.write(writer);
                coordinator.write(writer);
                entry_fee.write(writer);
                spin_fee.write(writer);
                minimum_funding.write(writer);
            }
            Self::PoolFunded { amount, total_held } => {
                1u8.write(writer);
                amount.write(writer);
                total_held.write(writer);
            }
            Self::PoolOpened { total_held } => {
                2u8.write(writer);
                total_held.write(writer);
            }
            Self::PlayerEntered {
                player,
                payment,
                balance,
                first_entry,
            } => {
                3u8.write(writer);
                player.write(writer);
                payment.write(writer);
                balance.write(writer);
                first_entry.write(writer);
            }
            Self::SpinRequested { player, request_id } => {
                4u8.write(writer);
                player.write(writer);
                request_id.write(writer);
            }
            Self::PrizeResolved {
                player,
                request_id,
                prize,
                balance,
                unclaimed_winnings,
                credited,
                debited,
            } => {
                5u8.write(writer);
                player.write(writer);
                request_id.write(writer);
                prize.write(writer);
                balance.write(writer);
                unclaimed_winnings.write(writer);
                credited.write(writer);
                debited.write(writer);
            }
            Self::WinningsClaimed { player, amount } => {
                6u8.write(writer);
                player.write(writer);
                amount.write(writer);
            }
            Self::PoolClosed {
                operator,
                amount,
                reserved_winnings,
            } => {
                7u8.write(writer);
                operator.write(writer);
                amount.write(writer);
                reserved_winnings.write(writer);
            }
            Self::TransactionRejected {
                public,
                code,
                message,
            } => {
                8u8.write(writer);
                public.write(writer);
                code.write(writer);
                write_string(message, writer);
            }
        }
    }
}

impl Read for Event {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let event = match u8::read(reader)? {
            0 => Self::PoolCreated {
                operator: PublicKey::read(reader)?,
                coordinator: PublicKey::read(reader)?,
                entry_fee: u64::read(reader)?,
                spin_fee: u64::read(reader)?,
                minimum_funding: u64::read(reader)?,
            },
            1 => Self::PoolFunded {
                amount: u64::read(reader)?,
                total_held: u64::read(reader)?,
            },
            2 => Self::PoolOpened {
                total_held: u64::read(reader)?,
            },
            3 => Self::PlayerEntered {
                player: PublicKey::read(reader)?,
                payment: u64::read(reader)?,
                balance: u64::read(reader)?,
                first_entry: bool::read(reader)?,
            },
            4 => Self::SpinRequested {
                player: PublicKey::read(reader)?,
                request_id: Digest::read(reader)?,
            },
            5 => Self::PrizeResolved {
                player: PublicKey::read(reader)?,
                request_id: Digest::read(reader)?,
                prize: Prize::read(reader)?,
                balance: u64::read(reader)?,
                unclaimed_winnings: u64::read(reader)?,
                credited: u64::read(reader)?,
                debited: u64::read(reader)?,
            },
            6 => Self::WinningsClaimed {
                player: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
            },
            7 => Self::PoolClosed {
                operator: PublicKey::read(reader)?,
                amount: u64::read(reader)?,
                reserved_winnings: u64::read(reader)?,
            },
            8 => Self::TransactionRejected {
                public: PublicKey::read(reader)?,
                code: u8::read(reader)?,
                message: read_string(reader, MAX_MESSAGE_LENGTH)?,
            },
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(event)
    }
}

impl EncodeSize for Event {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::PoolCreated { .. } => PublicKey::SIZE * 2 + u64::SIZE * 3,
                Self::PoolFunded { .. } => u64::SIZE * 2,
                Self::PoolOpened { .. } => u64::SIZE,
                Self::PlayerEntered { .. } => PublicKey::SIZE + u64::SIZE * 2 + bool::SIZE,
                Self::SpinRequested { .. } => PublicKey::SIZE + Digest::SIZE,
                Self::PrizeResolved { .. } => {
                    PublicKey::SIZE + Digest::SIZE + Prize::SIZE + u64::SIZE * 4
                }
                Self::WinningsClaimed { .. } => PublicKey::SIZE + u64::SIZE,
                Self::PoolClosed { .. } => PublicKey::SIZE + u64::SIZE * 2,
                Self::TransactionRejected { message, .. } => {
                    PublicKey::SIZE + u8::SIZE + string_encode_size(message)
                }
            }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Event(Event),
    Transaction(Transaction),
}

impl Write for Output {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Event(event) => {
                0u8.write(writer);
                event.write(writer);
            }
            Self::Transaction(transaction) => {
                1u8.write(writer);
                transaction.write(writer);
            }
        }
    }
}

impl Read for Output {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        match u8::read(reader)? {
            0 => Ok(Self::Event(Event::read(reader)?)),
            1 => Ok(Self::Transaction(Transaction::read(reader)?)),
            i => Err(Error::InvalidEnum(i)),
        }
    }
}

impl EncodeSize for Output {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                Self::Event(event) => event.encode_size(),
                Self::Transaction(transaction) => transaction.encode_size(),
            }
    }
}
