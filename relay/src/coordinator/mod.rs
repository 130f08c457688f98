//! Randomness oracle adapter.
//!
//! Receives spin requests forwarded by the ledger, draws a word from a
//! [wheel_execution::RandomnessSource] and, once the delivery delay elapses, submits it back
//! as a `FulfillRandomness` signed with the coordinator key. With jitter enabled, requests
//! resolve in a different order than they were issued.

use commonware_cryptography::ed25519::PrivateKey;
use std::time::Duration;

mod actor;
pub use actor::Actor;
mod ingress;
pub use ingress::{Mailbox, Message};

/// Configuration for the coordinator.
pub struct Config<S> {
    /// Key the pool was created with as its coordinator.
    pub signer: PrivateKey,

    /// Source of random words.
    pub source: S,

    /// Minimum time between a request and its fulfillment.
    pub delay: Duration,

    /// Upper bound of the random extra delay added to each fulfillment.
    pub jitter: Duration,

    /// Number of messages to hold in the backlog before blocking senders.
    pub mailbox_size: usize,
}
