//! Test helpers: deterministic keys and a harness that drives a pool through signed
//! transactions against an in-memory store.

use crate::{
    oracle::RandomnessSource,
    query::{query_player, query_pool},
    state::{nonce, Memory, State},
    Layer,
};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    sha256::Digest,
    Signer,
};
use commonware_math::algebra::Random;
use rand::{rngs::StdRng, SeedableRng};
use wheel_types::{
    execution::{Event, Instruction, Output, Transaction},
    wheel::{Player, Pool, Prize, FUNDING_THRESHOLD_MULTIPLE},
    NAMESPACE,
};

pub const TEST_ENTRY_FEE: u64 = 1_000_000_000;
pub const TEST_SPIN_FEE: u64 = 100_000_000;

/// Creates an account keypair for Ed25519 signatures used by users
pub fn create_account_keypair(seed: u64) -> (PrivateKey, PublicKey) {
    let mut rng = StdRng::seed_from_u64(seed);
    let private = PrivateKey::random(&mut rng);
    let public = private.public_key();
    (private, public)
}

/// A random word that lands on `prize`.
pub fn randomness_for(prize: Prize) -> Digest {
    let mut bytes = [0u8; 32];
    bytes[31] = prize.index() as u8;
    Digest::from(bytes)
}

/// Error code of the first rejection in `events`, if any.
pub fn rejection_code(events: &[Event]) -> Option<u8> {
    events.iter().find_map(|event| match event {
        Event::TransactionRejected { code, .. } => Some(*code),
        _ => None,
    })
}

pub type Keypair = (PrivateKey, PublicKey);

pub struct Harness {
    pub state: Memory,
    pub operator: Keypair,
    pub coordinator: Keypair,
}

impl Harness {
    /// A created (idle) pool with the test fees.
    pub async fn new() -> Self {
        let mut harness = Self {
            state: Memory::default(),
            operator: create_account_keypair(1),
            coordinator: create_account_keypair(2),
        };
        let coordinator = harness.coordinator.1.clone();
        let operator = harness.operator.0.clone();
        let events = harness
            .submit(
                &operator,
                Instruction::CreatePool {
                    entry_fee: TEST_ENTRY_FEE,
                    spin_fee: TEST_SPIN_FEE,
                    coordinator,
                },
            )
            .await;
        assert!(matches!(events[0], Event::PoolCreated { .. }));
        harness
    }

    /// A pool funded exactly to its opening threshold.
    pub async fn open() -> Self {
        let mut harness = Self::new().await;
        let events = harness
            .fund(TEST_ENTRY_FEE * FUNDING_THRESHOLD_MULTIPLE)
            .await;
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::PoolOpened { .. })));
        harness
    }

    pub fn player(&self, seed: u64) -> Keypair {
        create_account_keypair(seed)
    }

    /// Execute `transactions` as one batch and commit the result.
    pub async fn execute(&mut self, transactions: Vec<Transaction>) -> Vec<Event> {
        let (outputs, changes) = {
            let mut layer = Layer::new(&self.state, NAMESPACE);
            let (outputs, _) = layer.execute(transactions).await.expect("execute batch");
            (outputs, layer.commit())
        };
        self.state.apply(changes).await.expect("apply changes");
        outputs
            .into_iter()
            .filter_map(|output| match output {
                Output::Event(event) => Some(event),
                Output::Transaction(_) => None,
            })
            .collect()
    }

    /// Sign `instruction` with the signer's next nonce.
    pub async fn sign(&self, signer: &PrivateKey, instruction: Instruction) -> Transaction {
        let nonce = nonce(&self.state, &signer.public_key())
            .await
            .expect("read nonce");
        Transaction::sign(signer, nonce, instruction)
    }

    pub async fn submit(&mut self, signer: &PrivateKey, instruction: Instruction) -> Vec<Event> {
        let transaction = self.sign(signer, instruction).await;
        self.execute(vec![transaction]).await
    }

    pub async fn fund(&mut self, amount: u64) -> Vec<Event> {
        let operator = self.operator.0.clone();
        self.submit(&operator, Instruction::Fund { amount }).await
    }

    pub async fn enter(&mut self, who: &Keypair, payment: u64) -> Vec<Event> {
        self.submit(&who.0, Instruction::Enter { payment }).await
    }

    /// Request a spin, returning the request identifier if it was accepted.
    pub async fn spin(&mut self, who: &Keypair) -> Option<Digest> {
        let events = self.submit(&who.0, Instruction::Spin).await;
        events.into_iter().find_map(|event| match event {
            Event::SpinRequested { request_id, .. } => Some(request_id),
            _ => None,
        })
    }

    pub async fn fulfill(&mut self, request_id: Digest, randomness: Digest) -> Vec<Event> {
        let coordinator = self.coordinator.0.clone();
        self.submit(
            &coordinator,
            Instruction::FulfillRandomness {
                request_id,
                randomness,
            },
        )
        .await
    }

    pub async fn fulfill_from(
        &mut self,
        request_id: Digest,
        source: &mut impl RandomnessSource,
    ) -> Vec<Event> {
        let randomness = source.randomness(&request_id);
        self.fulfill(request_id, randomness).await
    }

    /// Spin and resolve immediately with the word for `prize`.
    pub async fn spin_to(&mut self, who: &Keypair, prize: Prize) -> Vec<Event> {
        let request_id = self.spin(who).await.expect("spin accepted");
        self.fulfill(request_id, randomness_for(prize)).await
    }

    pub async fn claim(&mut self, caller: &Keypair, player: &PublicKey) -> Vec<Event> {
        self.submit(
            &caller.0,
            Instruction::Claim {
                player: player.clone(),
            },
        )
        .await
    }

    pub async fn close(&mut self) -> Vec<Event> {
        let operator = self.operator.0.clone();
        self.submit(&operator, Instruction::Close).await
    }

    pub async fn pool(&self) -> Pool {
        query_pool(&self.state)
            .await
            .expect("read pool")
            .expect("pool exists")
    }

    pub async fn ledger(&self, public: &PublicKey) -> Option<Player> {
        query_player(&self.state, public).await.expect("read player")
    }
}

/// Replays a fixed list of words in order, then repeats the last one. Useful to force
/// specific prizes.
#[derive(Clone, Debug)]
pub struct FixedSource {
    words: Vec<Digest>,
    next: usize,
}

impl FixedSource {
    /// Words whose value modulo the table size is `index` for each entry.
    pub fn from_indices(indices: &[u8]) -> Self {
        let words = indices
            .iter()
            .map(|index| {
                let mut bytes = [0u8; 32];
                bytes[31] = *index;
                Digest::from(bytes)
            })
            .collect();
        Self { words, next: 0 }
    }
}

impl RandomnessSource for FixedSource {
    fn randomness(&mut self, _: &Digest) -> Digest {
        let index = self.next.min(self.words.len().saturating_sub(1));
        self.next += 1;
        self.words.get(index).cloned().unwrap_or(Digest::from([0u8; 32]))
    }
}
