use commonware_cryptography::{ed25519::PublicKey, sha256::Digest};
use futures::{channel::mpsc, SinkExt};
use tracing::warn;

/// Messages sent to the coordinator.
pub enum Message {
    Requested {
        request_id: Digest,
        player: PublicKey,
    },
}

/// Mailbox for the coordinator.
#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
}

impl Mailbox {
    pub(super) fn new(sender: mpsc::Sender<Message>) -> Self {
        Self { sender }
    }

    pub async fn requested(&mut self, request_id: Digest, player: PublicKey) {
        if self
            .sender
            .send(Message::Requested { request_id, player })
            .await
            .is_err()
        {
            warn!(?request_id, "coordinator mailbox closed; request dropped");
        }
    }
}
