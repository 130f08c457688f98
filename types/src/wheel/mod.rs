//! Wheel domain types.
//!
//! The pool ledger, per-player accounts, the prize table and the pending-spin registry
//! entries shared by the execution layer and the relay.

mod codec;
mod constants;
mod error;
mod player;
mod pool;
mod prize;
mod request;

pub use codec::{read_string, string_encode_size, write_string};
pub use constants::*;
pub use error::WheelError;
pub use player::*;
pub use pool::*;
pub use prize::*;
pub use request::*;

#[cfg(test)]
mod tests;
