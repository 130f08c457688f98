//! A complete local pool lifecycle driven over the ledger mailbox.
//!
//! The operator creates and funds the pool, every player stakes and spins in rounds until
//! their spins are used up or their stake runs dry, winnings are claimed and the pool is
//! closed. The resulting [Report] is what the binary prints.

use crate::ledger;
use anyhow::{bail, Context as _, Result};
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    Signer,
};
use commonware_runtime::Clock;
use commonware_utils::hex;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};
use wheel_execution::PoolSummary;
use wheel_types::{
    execution::{Event, Instruction, Transaction},
    wheel::{PlayerStatus, Prize},
};

/// Parameters of a session.
#[derive(Clone, Debug)]
pub struct Config {
    pub entry_fee: u64,
    pub spin_fee: u64,
    /// House capital deposited by the operator.
    pub funding: u64,
    /// Amount each player stakes on entry.
    pub stake: u64,
    pub spins_per_player: u64,
    /// Close the pool once every claim is paid.
    pub close: bool,
    pub poll_interval: Duration,
    /// How long to wait for outstanding fulfillments after each round.
    pub resolution_timeout: Duration,
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerReport {
    pub public: String,
    pub spins: u64,
    pub balance: u64,
    pub unclaimed_winnings: u64,
    pub total_claimed: u64,
    pub last_prize: Option<Prize>,
    pub status: PlayerStatus,
}

#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub pool: PoolSummary,
    pub players: Vec<PlayerReport>,
    /// Transactions the ledger rejected during the session.
    pub rejected: u64,
}

pub struct Session<E: Clock> {
    context: E,
    config: Config,
    ledger: ledger::Mailbox,
    operator: PrivateKey,
    coordinator: PublicKey,
    players: Vec<PrivateKey>,

    rejected: u64,
}

impl<E: Clock> Session<E> {
    pub fn new(
        context: E,
        config: Config,
        ledger: ledger::Mailbox,
        operator: PrivateKey,
        coordinator: PublicKey,
        players: Vec<PrivateKey>,
    ) -> Self {
        Self {
            context,
            config,
            ledger,
            operator,
            coordinator,
            players,

            rejected: 0,
        }
    }

    pub async fn run(mut self) -> Result<Report> {
        let operator = self.operator.clone();
        let events = self
            .submit(
                &operator,
                Instruction::CreatePool {
                    entry_fee: self.config.entry_fee,
                    spin_fee: self.config.spin_fee,
                    coordinator: self.coordinator.clone(),
                },
            )
            .await?;
        if !events
            .iter()
            .any(|event| matches!(event, Event::PoolCreated { .. }))
        {
            bail!("pool was not created");
        }

        let events = self
            .submit(
                &operator,
                Instruction::Fund {
                    amount: self.config.funding,
                },
            )
            .await?;
        if !events
            .iter()
            .any(|event| matches!(event, Event::PoolOpened { .. }))
        {
            bail!("pool did not open after funding");
        }
        info!(funding = self.config.funding, "pool open");

        for player in self.players.clone() {
            self.submit(
                &player,
                Instruction::Enter {
                    payment: self.config.stake,
                },
            )
            .await?;
        }
        info!(
            players = self.players.len(),
            stake = self.config.stake,
            "players entered"
        );

        for round in 0..self.config.spins_per_player {
            let mut waiting = Vec::new();
            for player in self.players.clone() {
                let public = player.public_key();
                let Some(ledger) = self.ledger.player(public.clone()).await? else {
                    continue;
                };
                if ledger.status != PlayerStatus::Active || ledger.balance < self.config.spin_fee
                {
                    continue;
                }
                let events = self.submit(&player, Instruction::Spin).await?;
                if events
                    .iter()
                    .any(|event| matches!(event, Event::SpinRequested { .. }))
                {
                    waiting.push(public);
                }
            }
            if waiting.is_empty() {
                info!(round, "no player can spin; ending rounds");
                break;
            }
            let spins = waiting.len();
            self.await_resolution(waiting).await?;
            info!(round, spins, "round resolved");
        }

        for player in self.players.clone() {
            let public = player.public_key();
            let unclaimed = self
                .ledger
                .player(public.clone())
                .await?
                .map_or(0, |ledger| ledger.unclaimed_winnings);
            if unclaimed == 0 {
                continue;
            }
            self.submit(&player, Instruction::Claim { player: public })
                .await?;
        }

        if self.config.close {
            let events = self.submit(&operator, Instruction::Close).await?;
            if let Some(Event::PoolClosed {
                amount,
                reserved_winnings,
                ..
            }) = events
                .iter()
                .find(|event| matches!(event, Event::PoolClosed { .. }))
            {
                info!(amount, reserved_winnings, "pool closed");
            }
        }

        self.report().await
    }

    /// Sign `instruction` with the signer's next nonce and submit it.
    async fn submit(&mut self, signer: &PrivateKey, instruction: Instruction) -> Result<Vec<Event>> {
        let nonce = self.ledger.nonce(signer.public_key()).await?;
        let events = self
            .ledger
            .submit(Transaction::sign(signer, nonce, instruction))
            .await?;
        if events.is_empty() {
            bail!("ledger dropped transaction (nonce {nonce})");
        }
        for event in &events {
            if let Event::TransactionRejected { code, message, .. } = event {
                self.rejected += 1;
                warn!(code, reason = %message, "transaction rejected");
            }
        }
        Ok(events)
    }

    /// Poll until none of `waiting` has a spin pending.
    async fn await_resolution(&mut self, mut waiting: Vec<PublicKey>) -> Result<()> {
        let deadline = self.context.current() + self.config.resolution_timeout;
        loop {
            let mut still_waiting = Vec::with_capacity(waiting.len());
            for public in waiting {
                let pending = self
                    .ledger
                    .player(public.clone())
                    .await?
                    .is_some_and(|ledger| ledger.has_pending_spin());
                if pending {
                    still_waiting.push(public);
                }
            }
            if still_waiting.is_empty() {
                return Ok(());
            }
            if self.context.current() >= deadline {
                bail!(
                    "timed out waiting for {} fulfillments",
                    still_waiting.len()
                );
            }
            waiting = still_waiting;
            self.context.sleep(self.config.poll_interval).await;
        }
    }

    async fn report(&mut self) -> Result<Report> {
        let pool = self
            .ledger
            .summary()
            .await?
            .context("pool missing at end of session")?;
        let mut players = Vec::with_capacity(self.players.len());
        for player in &self.players {
            let public = player.public_key();
            let ledger = self.ledger.player(public.clone()).await?.unwrap_or_default();
            players.push(PlayerReport {
                public: hex(public.as_ref()),
                spins: ledger.spins,
                balance: ledger.balance,
                unclaimed_winnings: ledger.unclaimed_winnings,
                total_claimed: ledger.total_claimed,
                last_prize: ledger.last_prize,
                status: ledger.status,
            });
        }

        Ok(Report {
            pool,
            players,
            rejected: self.rejected,
        })
    }
}
