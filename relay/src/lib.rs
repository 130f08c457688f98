//! Relay for the wheel pool.
//!
//! The [ledger::Actor] owns the ledger store and applies one message at a time. The
//! [coordinator::Actor] plays the randomness oracle: it observes spin requests forwarded by
//! the ledger and answers each with a signed `FulfillRandomness`. [session::Session] drives a
//! local pool through its whole lifecycle over the ledger mailbox.

use commonware_codec::DecodeExt;
use commonware_cryptography::{ed25519::PrivateKey, Signer};
use commonware_math::algebra::Random;
use commonware_utils::{from_hex_formatted, hex};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};
use thiserror::Error;
use tracing::Level;
use wheel_execution::oracle::SECRET_LEN;
use wheel_types::wheel::FUNDING_THRESHOLD_MULTIPLE;

pub mod coordinator;
pub mod ledger;
pub mod session;


#[derive(Clone, PartialEq, Eq)]
pub struct HexBytes(Vec<u8>);

impl HexBytes {
    pub fn from_hex_formatted(value: &str) -> Option<Self> {
        from_hex_formatted(value).map(Self)
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for HexBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex(self.as_ref()))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        let bytes = from_hex_formatted(&value)
            .ok_or_else(|| serde::de::Error::custom("expected a hex string"))?;
        Ok(Self(bytes))
    }
}

/// Configuration for the `wheel-relay` binary (from config file).
#[derive(Deserialize, Serialize)]
pub struct Config {
    pub operator_key: HexBytes,
    pub coordinator_key: HexBytes,
    pub randomness_secret: HexBytes,

    pub entry_fee: u64,
    pub spin_fee: u64,
    /// House capital deposited before play. Defaults to the opening threshold.
    #[serde(default)]
    pub funding: Option<u64>,

    pub players: usize,
    pub player_seed: u64,
    pub spins_per_player: u64,
    #[serde(default = "default_close")]
    pub close: bool,

    pub worker_threads: usize,
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
    pub mailbox_size: usize,

    #[serde(default = "default_fulfillment_delay_ms")]
    pub fulfillment_delay_ms: u64,
    #[serde(default)]
    pub fulfillment_jitter_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_resolution_timeout_ms")]
    pub resolution_timeout_ms: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("operator_key", &"<redacted>")
            .field("coordinator_key", &"<redacted>")
            .field("randomness_secret", &"<redacted>")
            .field("entry_fee", &self.entry_fee)
            .field("spin_fee", &self.spin_fee)
            .field("funding", &self.funding)
            .field("players", &self.players)
            .field("player_seed", &self.player_seed)
            .field("spins_per_player", &self.spins_per_player)
            .field("close", &self.close)
            .field("worker_threads", &self.worker_threads)
            .field("log_level", &self.log_level)
            .field("json_logs", &self.json_logs)
            .field("mailbox_size", &self.mailbox_size)
            .field("fulfillment_delay_ms", &self.fulfillment_delay_ms)
            .field("fulfillment_jitter_ms", &self.fulfillment_jitter_ms)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("resolution_timeout_ms", &self.resolution_timeout_ms)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} is invalid")]
    InvalidDecode {
        field: &'static str,
        #[source]
        source: commonware_codec::Error,
    },
    #[error("{field} must be {expected} bytes (got {got})")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("entry_fee * {FUNDING_THRESHOLD_MULTIPLE} overflows (entry_fee={entry_fee})")]
    FundingOverflow { entry_fee: u64 },
    #[error("funding {funding} is below the opening threshold {minimum}")]
    Underfunded { funding: u64, minimum: u64 },
    #[error("stake for {spins} spins overflows (entry_fee={entry_fee}, spin_fee={spin_fee})")]
    StakeOverflow {
        entry_fee: u64,
        spin_fee: u64,
        spins: u64,
    },
    #[error("operator_key and coordinator_key must differ")]
    SharedKey,
}

/// [Config] with every field parsed and checked.
pub struct ValidatedConfig {
    pub operator: PrivateKey,
    pub coordinator: PrivateKey,
    pub randomness_secret: [u8; SECRET_LEN],
    pub players: Vec<PrivateKey>,

    pub worker_threads: usize,
    pub log_level: Level,
    pub json_logs: bool,
    pub mailbox_size: usize,
    pub fulfillment_delay: Duration,
    pub fulfillment_jitter: Duration,

    pub session: session::Config,
}

impl Config {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        let operator: PrivateKey = decode_bytes("operator_key", &self.operator_key)?;
        let coordinator: PrivateKey = decode_bytes("coordinator_key", &self.coordinator_key)?;
        if operator.public_key() == coordinator.public_key() {
            return Err(ConfigError::SharedKey);
        }
        let randomness_secret: [u8; SECRET_LEN] = self
            .randomness_secret
            .as_ref()
            .try_into()
            .map_err(|_| ConfigError::InvalidLength {
                field: "randomness_secret",
                expected: SECRET_LEN,
                got: self.randomness_secret.as_ref().len(),
            })?;

        ensure_nonzero("entry_fee", self.entry_fee)?;
        ensure_nonzero("spin_fee", self.spin_fee)?;
        ensure_nonzero("players", self.players as u64)?;
        ensure_nonzero("worker_threads", self.worker_threads as u64)?;
        ensure_nonzero("mailbox_size", self.mailbox_size as u64)?;
        ensure_nonzero("poll_interval_ms", self.poll_interval_ms)?;
        ensure_nonzero("resolution_timeout_ms", self.resolution_timeout_ms)?;

        let minimum = self
            .entry_fee
            .checked_mul(FUNDING_THRESHOLD_MULTIPLE)
            .ok_or(ConfigError::FundingOverflow {
                entry_fee: self.entry_fee,
            })?;
        let funding = self.funding.unwrap_or(minimum);
        if funding < minimum {
            return Err(ConfigError::Underfunded { funding, minimum });
        }
        let stake = self
            .spin_fee
            .checked_mul(self.spins_per_player)
            .and_then(|fees| fees.checked_add(self.entry_fee))
            .ok_or(ConfigError::StakeOverflow {
                entry_fee: self.entry_fee,
                spin_fee: self.spin_fee,
                spins: self.spins_per_player,
            })?;

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        Ok(ValidatedConfig {
            operator,
            coordinator,
            randomness_secret,
            players: player_keys(self.player_seed, self.players),

            worker_threads: self.worker_threads,
            log_level,
            json_logs: self.json_logs,
            mailbox_size: self.mailbox_size,
            fulfillment_delay: Duration::from_millis(self.fulfillment_delay_ms),
            fulfillment_jitter: Duration::from_millis(self.fulfillment_jitter_ms),

            session: session::Config {
                entry_fee: self.entry_fee,
                spin_fee: self.spin_fee,
                funding,
                stake,
                spins_per_player: self.spins_per_player,
                close: self.close,
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                resolution_timeout: Duration::from_millis(self.resolution_timeout_ms),
            },
        })
    }
}

/// Deterministic player keys so repeated sessions reuse the same accounts.
pub fn player_keys(seed: u64, count: usize) -> Vec<PrivateKey> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (0..count).map(|_| PrivateKey::random(&mut rng)).collect()
}

fn default_close() -> bool {
    true
}

fn default_fulfillment_delay_ms() -> u64 {
    50
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_resolution_timeout_ms() -> u64 {
    10_000
}

fn decode_bytes<T: DecodeExt<()>>(field: &'static str, value: &HexBytes) -> Result<T, ConfigError> {
    T::decode(value.as_ref()).map_err(|source| ConfigError::InvalidDecode { field, source })
}

fn ensure_nonzero(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidNonZero { field, value });
    }
    Ok(())
}
