// Application state snapshot and readers
//
// Every routing decision reads a fresh StateSnapshot through a StateReader.
// The snapshot is owned by the surrounding application; this crate never
// writes to it.
//
// Numan Thabit 2025 Nov

use crate::transaction::{ChainId, SmartTransaction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkIdentity {
    pub chain_id: ChainId,
    /// `None` means the built-in default endpoint for the chain.
    #[serde(default)]
    pub rpc_url: Option<Url>,
}

impl Default for NetworkIdentity {
    fn default() -> Self {
        Self {
            chain_id: ChainId::new("0x1"),
            rpc_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyringKind {
    #[default]
    Hd,
    Simple,
    Ledger,
    Qr,
    Snap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    pub address: String,
    #[serde(default)]
    pub keyring: KeyringKind,
}

impl AccountIdentity {
    pub fn new(address: impl Into<String>, keyring: KeyringKind) -> Self {
        Self {
            address: address.into(),
            keyring,
        }
    }

    pub fn is_hardware_account(&self) -> bool {
        matches!(self.keyring, KeyringKind::Ledger | KeyringKind::Qr)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub show_incoming_transactions: HashMap<ChainId, bool>,
    pub use_transaction_simulations: bool,
}

/// Metric properties collected by confirmation screens for one transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionMetricProperties {
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub sensitive_properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateSnapshot {
    /// Raw swaps / remote feature flag document, see `flags::project`.
    pub swaps: serde_json::Value,
    pub network: NetworkIdentity,
    pub liveness: bool,
    pub account: Option<AccountIdentity>,
    pub opt_in: bool,
    pub smart_transactions: HashMap<ChainId, Vec<SmartTransaction>>,
    pub preferences: Preferences,
    pub confirmation_metrics: HashMap<String, TransactionMetricProperties>,
}

impl StateSnapshot {
    pub fn chain_id(&self) -> &ChainId {
        &self.network.chain_id
    }
}

/// Read access to the current application state.
pub trait StateReader: Send + Sync {
    fn snapshot(&self) -> StateSnapshot;
}

impl<F> StateReader for F
where
    F: Fn() -> StateSnapshot + Send + Sync,
{
    fn snapshot(&self) -> StateSnapshot {
        self()
    }
}

/// Shared, externally-updated snapshot. Writers are the owning subsystems
/// (flag fetcher, liveness poller, preferences); the router only reads.
#[derive(Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<StateSnapshot>>,
}

impl SharedState {
    pub fn new(snapshot: StateSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut StateSnapshot)) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard);
    }
}

impl StateReader for SharedState {
    fn snapshot(&self) -> StateSnapshot {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
