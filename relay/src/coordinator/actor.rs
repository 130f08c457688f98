use super::{
    ingress::{Mailbox, Message},
    Config,
};
use crate::ledger;
use commonware_cryptography::{
    ed25519::{PrivateKey, PublicKey},
    sha256::Digest,
    Signer,
};
use commonware_macros::select;
use commonware_runtime::{spawn_cell, Clock, ContextCell, Handle, Spawner};
use futures::{
    channel::mpsc,
    future::{self, Either},
    StreamExt,
};
use rand::Rng;
use std::{
    collections::{BTreeMap, VecDeque},
    time::{Duration, SystemTime},
};
use tracing::{debug, info, warn};
use wheel_execution::RandomnessSource;
use wheel_types::execution::{Instruction, Transaction};

enum Wake {
    Nonce(Result<u64, ledger::MailboxError>),
    Message(Option<Message>),
    Due,
    Ready(Result<(), ledger::MailboxError>),
}

struct Delivery {
    request_id: Digest,
    player: PublicKey,
    randomness: Digest,
}

/// Answers spin requests with signed fulfillments.
pub struct Actor<E: Clock + Spawner + Rng, S: RandomnessSource + Send + 'static> {
    context: ContextCell<E>,
    mailbox: mpsc::Receiver<Message>,
    signer: PrivateKey,
    source: S,
    delay: Duration,
    jitter: Duration,

    // Keyed by (due time, arrival sequence) so equal deadlines keep request order.
    queue: BTreeMap<(SystemTime, u64), Delivery>,
    sequence: u64,
}

impl<E: Clock + Spawner + Rng, S: RandomnessSource + Send + 'static> Actor<E, S> {
    pub fn new(context: E, config: Config<S>) -> (Self, Mailbox) {
        let (sender, mailbox) = mpsc::channel(config.mailbox_size);
        (
            Self {
                context: ContextCell::new(context),
                mailbox,
                signer: config.signer,
                source: config.source,
                delay: config.delay,
                jitter: config.jitter,

                queue: BTreeMap::new(),
                sequence: 0,
            },
            Mailbox::new(sender),
        )
    }

    /// Start the coordinator, delivering fulfillments to `ledger`.
    pub fn start(mut self, ledger: ledger::Mailbox) -> Handle<()> {
        spawn_cell!(self.context, self.run(ledger).await)
    }

    async fn run(mut self, mut ledger: ledger::Mailbox) {
        // The ledger may block forwarding a request to us while we wait on it, so the mailbox
        // is read whenever we are waiting on the ledger.
        let public = self.signer.public_key();
        let mut nonce = {
            let request = ledger.nonce(public.clone());
            futures::pin_mut!(request);
            loop {
                let wake = select! {
                    result = &mut request => {
                        Wake::Nonce(result)
                    },
                    message = self.mailbox.next() => {
                        Wake::Message(message)
                    },
                };
                match wake {
                    Wake::Nonce(Ok(nonce)) => break nonce,
                    Wake::Nonce(Err(err)) => {
                        warn!(?err, "ledger unavailable; coordinator stopping");
                        return;
                    }
                    Wake::Message(Some(Message::Requested { request_id, player })) => {
                        self.schedule(request_id, player);
                    }
                    Wake::Message(None) => {
                        debug!("coordinator mailbox closed before start");
                        return;
                    }
                    Wake::Due | Wake::Ready(_) => {}
                }
            }
        };
        info!(?public, nonce, "coordinator started");

        // Signed fulfillments waiting for room in the ledger mailbox, in nonce order.
        let mut outbox: VecDeque<Transaction> = VecDeque::new();
        let mut open = true;
        loop {
            if !open && self.queue.is_empty() && outbox.is_empty() {
                debug!("coordinator mailbox closed; shutting down");
                return;
            }

            let deadline = match self.queue.keys().next() {
                Some((at, _)) => Either::Left(self.context.sleep_until(*at)),
                None => Either::Right(future::pending::<()>()),
            };
            let ready = if outbox.is_empty() {
                Either::Right(future::pending::<Result<(), ledger::MailboxError>>())
            } else {
                Either::Left(ledger.ready())
            };
            let next = if open {
                Either::Left(self.mailbox.next())
            } else {
                Either::Right(future::pending::<Option<Message>>())
            };
            let wake = select! {
                message = next => {
                    Wake::Message(message)
                },
                _ = deadline => {
                    Wake::Due
                },
                result = ready => {
                    Wake::Ready(result)
                },
            };
            match wake {
                Wake::Message(Some(Message::Requested { request_id, player })) => {
                    self.schedule(request_id, player);
                }
                Wake::Message(None) => open = false,
                Wake::Due | Wake::Nonce(_) => {}
                Wake::Ready(Err(err)) => {
                    warn!(?err, "ledger unavailable; coordinator stopping");
                    return;
                }
                Wake::Ready(Ok(())) => {
                    while let Some(transaction) = outbox.front() {
                        match ledger.fulfill(transaction.clone()) {
                            Ok(true) => {
                                outbox.pop_front();
                            }
                            Ok(false) => break,
                            Err(err) => {
                                warn!(?err, "ledger unavailable; coordinator stopping");
                                return;
                            }
                        }
                    }
                }
            }

            let now = self.context.current();
            while let Some(entry) = self.queue.first_entry() {
                if entry.key().0 > now {
                    break;
                }
                let delivery = entry.remove();
                debug!(
                    request_id = ?delivery.request_id,
                    player = ?delivery.player,
                    nonce,
                    "delivering randomness"
                );
                outbox.push_back(Transaction::sign(
                    &self.signer,
                    nonce,
                    Instruction::FulfillRandomness {
                        request_id: delivery.request_id,
                        randomness: delivery.randomness,
                    },
                ));
                nonce += 1;
            }
        }
    }

    fn schedule(&mut self, request_id: Digest, player: PublicKey) {
        let randomness = self.source.randomness(&request_id);
        let jitter = match self.jitter.as_millis() as u64 {
            0 => Duration::ZERO,
            max => Duration::from_millis(self.context.gen_range(0..=max)),
        };
        let due = self.context.current() + self.delay + jitter;
        debug!(?request_id, ?player, ?jitter, "scheduled fulfillment");

        self.queue.insert(
            (due, self.sequence),
            Delivery {
                request_id,
                player,
                randomness,
            },
        );
        self.sequence += 1;
    }
}
