use commonware_cryptography::ed25519::PublicKey;
use futures::{
    channel::{mpsc, oneshot},
    future, SinkExt,
};
use thiserror::Error;
use wheel_execution::PoolSummary;
use wheel_types::{
    execution::{Event, Transaction},
    wheel::{Player, Pool},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MailboxError {
    #[error("ledger mailbox closed")]
    Closed,
    #[error("ledger dropped the response")]
    Canceled,
}

/// Messages sent to the ledger.
pub enum Message {
    /// Execute one transaction and return the events it produced (empty if dropped).
    Submit {
        transaction: Transaction,
        response: oneshot::Sender<Vec<Event>>,
    },
    /// Execute a coordinator fulfillment without waiting for the outcome.
    Fulfill { transaction: Transaction },
    Nonce {
        public: PublicKey,
        response: oneshot::Sender<u64>,
    },
    Pool {
        response: oneshot::Sender<Option<Pool>>,
    },
    Summary {
        response: oneshot::Sender<Option<PoolSummary>>,
    },
    Player {
        public: PublicKey,
        response: oneshot::Sender<Option<Player>>,
    },
}

/// Mailbox for the ledger.
#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
}

impl Mailbox {
    pub(super) fn new(sender: mpsc::Sender<Message>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &mut self,
        message: impl FnOnce(oneshot::Sender<T>) -> Message,
    ) -> Result<T, MailboxError> {
        let (response, receiver) = oneshot::channel();
        self.sender
            .send(message(response))
            .await
            .map_err(|_| MailboxError::Closed)?;
        receiver.await.map_err(|_| MailboxError::Canceled)
    }

    pub async fn submit(&mut self, transaction: Transaction) -> Result<Vec<Event>, MailboxError> {
        self.request(|response| Message::Submit {
            transaction,
            response,
        })
        .await
    }

    /// Wait until the ledger can accept another message.
    pub async fn ready(&mut self) -> Result<(), MailboxError> {
        future::poll_fn(|cx| self.sender.poll_ready(cx))
            .await
            .map_err(|_| MailboxError::Closed)
    }

    /// Enqueue a fulfillment without waiting. Returns `false` if the mailbox is full.
    pub fn fulfill(&mut self, transaction: Transaction) -> Result<bool, MailboxError> {
        match self.sender.try_send(Message::Fulfill { transaction }) {
            Ok(()) => Ok(true),
            Err(err) if err.is_full() => Ok(false),
            Err(_) => Err(MailboxError::Closed),
        }
    }

    /// Next nonce expected from `public`.
    pub async fn nonce(&mut self, public: PublicKey) -> Result<u64, MailboxError> {
        self.request(|response| Message::Nonce { public, response })
            .await
    }

    pub async fn pool(&mut self) -> Result<Option<Pool>, MailboxError> {
        self.request(|response| Message::Pool { response }).await
    }

    pub async fn summary(&mut self) -> Result<Option<PoolSummary>, MailboxError> {
        self.request(|response| Message::Summary { response }).await
    }

    pub async fn player(&mut self, public: PublicKey) -> Result<Option<Player>, MailboxError> {
        self.request(|response| Message::Player { public, response })
            .await
    }
}
