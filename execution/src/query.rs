//! Read-only views over the wheel ledger.
//!
//! Every query runs against any [State], so the same calls serve the relay's live store
//! and a [crate::Layer] mid-batch.
//!
//! ```rust,ignore
//! use wheel_execution::query::{query_pool_summary, query_player};
//!
//! let summary = query_pool_summary(&state).await?;
//! let player = query_player(&state, &public).await?;
//! ```

use anyhow::Result;
use commonware_cryptography::{ed25519::PublicKey, sha256::Digest};
use serde::Serialize;
use wheel_types::{
    execution::{Key, Value},
    wheel::{PendingSpin, Player, Pool, PoolState},
};

use crate::state::State;

/// Aggregate view of the pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolSummary {
    pub state: PoolState,
    pub entry_fee: u64,
    pub spin_fee: u64,
    pub minimum_funding: u64,
    pub total_held: u64,
    pub house_reserve: u64,
    pub total_balances: u64,
    pub total_winnings: u64,
    pub participants: u64,
    pub requests_issued: u64,
    /// Whether `total_held` equals the sum of reserve, stakes and winnings.
    pub balanced: bool,
}

impl PoolSummary {
    pub fn from_pool(pool: &Pool) -> Self {
        Self {
            state: pool.state,
            entry_fee: pool.entry_fee,
            spin_fee: pool.spin_fee,
            minimum_funding: pool.minimum_funding,
            total_held: pool.total_held,
            house_reserve: pool.house_reserve,
            total_balances: pool.total_balances,
            total_winnings: pool.total_winnings,
            participants: pool.participants,
            requests_issued: pool.request_nonce,
            balanced: pool.check_conservation().is_ok(),
        }
    }
}

pub async fn query_pool<S: State>(state: &S) -> Result<Option<Pool>> {
    Ok(match state.get(&Key::Pool).await? {
        Some(Value::Pool(pool)) => Some(pool),
        _ => None,
    })
}

pub async fn query_pool_summary<S: State>(state: &S) -> Result<Option<PoolSummary>> {
    Ok(query_pool(state).await?.as_ref().map(PoolSummary::from_pool))
}

pub async fn query_pool_state<S: State>(state: &S) -> Result<Option<PoolState>> {
    Ok(query_pool(state).await?.map(|pool| pool.state))
}

/// Currency held by the pool (zero before creation).
pub async fn query_total_held<S: State>(state: &S) -> Result<u64> {
    Ok(query_pool(state).await?.map_or(0, |pool| pool.total_held))
}

pub async fn query_player<S: State>(state: &S, public: &PublicKey) -> Result<Option<Player>> {
    Ok(match state.get(&Key::Player(public.clone())).await? {
        Some(Value::Player(player)) => Some(player),
        _ => None,
    })
}

pub async fn query_participant_count<S: State>(state: &S) -> Result<u64> {
    Ok(query_pool(state).await?.map_or(0, |pool| pool.participants))
}

/// Entered accounts in entry order.
pub async fn query_participants<S: State>(state: &S) -> Result<Vec<PublicKey>> {
    let count = query_participant_count(state).await?;
    let mut participants = Vec::with_capacity(count as usize);
    for index in 0..count {
        match state.get(&Key::Participant(index)).await? {
            Some(Value::Participant(public)) => participants.push(public),
            _ => anyhow::bail!("participant {index} missing from registry"),
        }
    }
    Ok(participants)
}

pub async fn query_pending_spin<S: State>(
    state: &S,
    request_id: &Digest,
) -> Result<Option<PendingSpin>> {
    Ok(match state.get(&Key::PendingSpin(*request_id)).await? {
        Some(Value::PendingSpin(pending)) => Some(pending),
        _ => None,
    })
}
