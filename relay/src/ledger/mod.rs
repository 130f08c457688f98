//! Single owner of the ledger store.

mod actor;
pub use actor::Actor;
mod ingress;
pub use ingress::{Mailbox, MailboxError, Message};

/// Configuration for the ledger.
pub struct Config {
    /// Namespace request identifiers are derived under.
    pub namespace: Vec<u8>,

    /// Number of messages to hold in the backlog before blocking senders.
    pub mailbox_size: usize,
}
