use super::{
    ingress::{Mailbox, Message},
    Config,
};
use crate::coordinator;
use anyhow::{Context as _, Result};
use commonware_runtime::{spawn_cell, ContextCell, Handle, Spawner};
use futures::{channel::mpsc, StreamExt};
use tracing::{debug, error, info};
use wheel_execution::{
    nonce,
    query::{query_player, query_pool, query_pool_summary},
    Layer, Memory, State,
};
use wheel_types::execution::{Event, Output, Transaction};

/// Applies transactions to the ledger one message at a time.
pub struct Actor<E: Spawner> {
    context: ContextCell<E>,
    mailbox: mpsc::Receiver<Message>,
    namespace: Vec<u8>,
    state: Memory,
}

impl<E: Spawner> Actor<E> {
    pub fn new(context: E, config: Config) -> (Self, Mailbox) {
        let (sender, mailbox) = mpsc::channel(config.mailbox_size);
        (
            Self {
                context: ContextCell::new(context),
                mailbox,
                namespace: config.namespace,
                state: Memory::default(),
            },
            Mailbox::new(sender),
        )
    }

    /// Start the ledger, forwarding every recorded spin request to `coordinator`.
    pub fn start(mut self, coordinator: coordinator::Mailbox) -> Handle<()> {
        spawn_cell!(self.context, self.run(coordinator).await)
    }

    async fn run(mut self, mut coordinator: coordinator::Mailbox) {
        while let Some(message) = self.mailbox.next().await {
            match message {
                Message::Submit {
                    transaction,
                    response,
                } => {
                    let events = match self.execute(transaction).await {
                        Ok(events) => events,
                        Err(err) => {
                            error!(?err, "failed to execute transaction");
                            return;
                        }
                    };
                    Self::forward_requests(&mut coordinator, &events).await;
                    let _ = response.send(events);
                }
                Message::Fulfill { transaction } => {
                    let events = match self.execute(transaction).await {
                        Ok(events) => events,
                        Err(err) => {
                            error!(?err, "failed to execute fulfillment");
                            return;
                        }
                    };
                    for event in &events {
                        if let Event::PrizeResolved {
                            player,
                            prize,
                            balance,
                            unclaimed_winnings,
                            ..
                        } = event
                        {
                            info!(
                                ?player,
                                ?prize,
                                balance,
                                unclaimed_winnings,
                                "spin resolved"
                            );
                        }
                    }
                }
                Message::Nonce { public, response } => match nonce(&self.state, &public).await {
                    Ok(nonce) => {
                        let _ = response.send(nonce);
                    }
                    Err(err) => error!(?err, "failed to read nonce"),
                },
                Message::Pool { response } => match query_pool(&self.state).await {
                    Ok(pool) => {
                        let _ = response.send(pool);
                    }
                    Err(err) => error!(?err, "failed to read pool"),
                },
                Message::Summary { response } => match query_pool_summary(&self.state).await {
                    Ok(summary) => {
                        let _ = response.send(summary);
                    }
                    Err(err) => error!(?err, "failed to read pool summary"),
                },
                Message::Player { public, response } => {
                    match query_player(&self.state, &public).await {
                        Ok(player) => {
                            let _ = response.send(player);
                        }
                        Err(err) => error!(?err, "failed to read player"),
                    }
                }
            }
        }
        debug!("ledger mailbox closed; shutting down");
    }

    /// Execute `transaction` in its own layer and commit the result.
    async fn execute(&mut self, transaction: Transaction) -> Result<Vec<Event>> {
        let (outputs, changes) = {
            let mut layer = Layer::new(&self.state, &self.namespace);
            let (outputs, _) = layer
                .execute(vec![transaction])
                .await
                .context("execute transaction")?;
            (outputs, layer.commit())
        };
        self.state
            .apply(changes)
            .await
            .context("apply committed changes")?;

        Ok(outputs
            .into_iter()
            .filter_map(|output| match output {
                Output::Event(event) => Some(event),
                Output::Transaction(_) => None,
            })
            .collect())
    }

    async fn forward_requests(coordinator: &mut coordinator::Mailbox, events: &[Event]) {
        for event in events {
            if let Event::SpinRequested { player, request_id } = event {
                coordinator.requested(*request_id, player.clone()).await;
            }
        }
    }
}
