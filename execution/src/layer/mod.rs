use anyhow::{Context as _, Result};
use commonware_cryptography::ed25519::PublicKey;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use wheel_types::{
    execution::{Event, Instruction, Key, Output, Transaction, Value},
    wheel::{Player, Pool, WheelError},
};

use crate::state::{
    load_account, validate_and_increment_nonce, ApplyError, PrepareError, State, Status,
};

mod handlers;

/// Executes transactions against a [State], buffering every write until [Layer::commit].
///
/// Each instruction's writes are staged separately and folded into the pending set only if
/// the instruction succeeds, so a rejected instruction leaves nothing behind except the
/// sender's consumed nonce.
pub struct Layer<'a, S: State> {
    state: &'a S,
    pending: BTreeMap<Key, Status>,
    staged: BTreeMap<Key, Status>,

    namespace: Vec<u8>,
}

impl<'a, S: State> Layer<'a, S> {
    pub fn new(state: &'a S, namespace: &[u8]) -> Self {
        Self {
            state,
            pending: BTreeMap::new(),
            staged: BTreeMap::new(),

            namespace: namespace.to_vec(),
        }
    }

    fn insert(&mut self, key: Key, value: Value) {
        self.staged.insert(key, Status::Update(value));
    }

    fn remove(&mut self, key: Key) {
        self.staged.insert(key, Status::Delete);
    }

    async fn prepare(&mut self, transaction: &Transaction) -> Result<(), PrepareError> {
        let mut account = load_account(self, &transaction.public)
            .await
            .map_err(PrepareError::State)?;
        validate_and_increment_nonce(&mut account, transaction.nonce)?;
        self.pending.insert(
            Key::Account(transaction.public.clone()),
            Status::Update(Value::Account(account)),
        );

        Ok(())
    }

    async fn load_pool(&self) -> Result<Pool, ApplyError> {
        match self.get(&Key::Pool).await? {
            Some(Value::Pool(pool)) => Ok(pool),
            _ => Err(WheelError::PoolNotFound.into()),
        }
    }

    fn store_pool(&mut self, pool: Pool) -> Result<()> {
        pool.check_conservation()
            .context("pool ledger out of balance")?;
        self.insert(Key::Pool, Value::Pool(pool));
        Ok(())
    }

    async fn load_player(&self, public: &PublicKey) -> Result<Option<Player>> {
        Ok(match self.get(&Key::Player(public.clone())).await? {
            Some(Value::Player(player)) => Some(player),
            _ => None,
        })
    }

    fn store_player(&mut self, public: &PublicKey, player: Player) {
        self.insert(Key::Player(public.clone()), Value::Player(player));
    }

    async fn dispatch(
        &mut self,
        public: &PublicKey,
        instruction: &Instruction,
    ) -> Result<Vec<Event>, ApplyError> {
        match instruction {
            Instruction::CreatePool {
                entry_fee,
                spin_fee,
                coordinator,
            } => {
                self.handle_create_pool(public, *entry_fee, *spin_fee, coordinator)
                    .await
            }
            Instruction::Fund { amount } => self.handle_fund(public, *amount).await,
            Instruction::Enter { payment } => self.handle_enter(public, *payment).await,
            Instruction::Spin => self.handle_spin(public).await,
            Instruction::FulfillRandomness {
                request_id,
                randomness,
            } => {
                self.handle_fulfill_randomness(public, request_id, randomness)
                    .await
            }
            Instruction::Claim { player } => self.handle_claim(public, player).await,
            Instruction::Close => self.handle_close(public).await,
        }
    }

    async fn apply(&mut self, transaction: &Transaction) -> Result<Vec<Event>> {
        let result = self
            .dispatch(&transaction.public, &transaction.instruction)
            .await;
        let staged = std::mem::take(&mut self.staged);
        match result {
            Ok(events) => {
                self.pending.extend(staged);
                Ok(events)
            }
            Err(ApplyError::Rejected(err)) => {
                if matches!(
                    transaction.instruction,
                    Instruction::FulfillRandomness { .. }
                ) {
                    warn!(public = ?transaction.public, code = err.code(), %err, "fulfillment rejected");
                } else {
                    debug!(public = ?transaction.public, code = err.code(), %err, "transaction rejected");
                }
                Ok(vec![Event::TransactionRejected {
                    public: transaction.public.clone(),
                    code: err.code(),
                    message: err.to_string(),
                }])
            }
            Err(ApplyError::State(err)) => Err(err),
        }
    }

    pub async fn execute(
        &mut self,
        transactions: Vec<Transaction>,
    ) -> Result<(Vec<Output>, BTreeMap<PublicKey, u64>)> {
        let mut processed_nonces = BTreeMap::new();
        let mut outputs = Vec::new();

        for tx in transactions {
            if !tx.verify() {
                debug!(public = ?tx.public, "invalid signature; dropping transaction");
                continue;
            }
            match self.prepare(&tx).await {
                Ok(()) => {}
                Err(PrepareError::NonceMismatch { expected, got }) => {
                    debug!(
                        public = ?tx.public,
                        expected,
                        got,
                        "nonce mismatch; dropping transaction"
                    );
                    continue;
                }
                Err(PrepareError::State(err)) => {
                    return Err(err).context("state error during prepare");
                }
            }
            processed_nonces.insert(tx.public.clone(), tx.nonce.saturating_add(1));
            outputs.extend(self.apply(&tx).await?.into_iter().map(Output::Event));
            outputs.push(Output::Transaction(tx));
        }

        Ok((outputs, processed_nonces))
    }

    pub fn commit(self) -> Vec<(Key, Status)> {
        self.pending.into_iter().collect()
    }
}

impl<'a, S: State> State for Layer<'a, S> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(match self.staged.get(key).or_else(|| self.pending.get(key)) {
            Some(Status::Update(value)) => Some(value.clone()),
            Some(Status::Delete) => None,
            None => self.state.get(key).await?,
        })
    }

    async fn insert(&mut self, key: Key, value: Value) -> Result<()> {
        self.staged.insert(key, Status::Update(value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> Result<()> {
        self.staged.insert(key.clone(), Status::Delete);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
