//! Wheel execution layer.
//!
//! This crate contains the deterministic transaction execution logic ([Layer]) for the
//! wheel pool: lifecycle (idle, open, closed), player stakes, the spin/resolve protocol
//! around an external randomness source, claims, and the conservation invariant
//! `total_held == house_reserve + total_balances + total_winnings`.
//!
//! ## Determinism requirements
//! - Do not use wall-clock time inside execution.
//! - Randomness only enters through `FulfillRandomness` instructions signed by the pool's
//!   coordinator.
//! - Avoid iteration order of hash-based collections influencing outputs.
//!
//! ## Minimal execution pipeline (example)
//! ```rust,ignore
//! use wheel_execution::{Layer, Memory, State};
//! use wheel_types::NAMESPACE;
//!
//! let mut state = Memory::default();
//! let mut layer = Layer::new(&state, NAMESPACE);
//! let (outputs, _nonces) = layer.execute(transactions).await?;
//! let changes = layer.commit();
//! state.apply(changes).await?;
//! ```

mod layer;
pub mod oracle;
pub mod query;
mod state;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;


pub use layer::Layer;
pub use oracle::{verify_randomness, HashChainSource, RandomnessSource};
pub use query::PoolSummary;
pub use state::{nonce, ApplyError, Memory, PrepareError, State, Status};
