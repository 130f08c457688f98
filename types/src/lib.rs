//! Types shared by the wheel execution layer and relay.

pub mod execution;
pub mod wheel;

pub use execution::{
    transaction_namespace, Account, Event, Instruction, Key, Output, Transaction, Value,
    NAMESPACE,
};
