// Transaction records observed by the router
// TransactionMeta is owned by the transaction engine; SmartTransaction entries
// are owned by the smart transactions controller. Both are read-only here.
//
// Numan Thabit 2025 Nov

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Field decoder that falls back to the default when the value has an
/// unexpected shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: for<'a> Deserialize<'a> + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Hex chain id such as `0x1`. Stored lower-cased so `0xA` and `0xa` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ChainId(String);

impl ChainId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decimal form used in relay API paths. `None` if the id is not `0x` hex.
    pub fn decimal(&self) -> Option<u64> {
        let hex = self.0.strip_prefix("0x")?;
        u64::from_str_radix(hex, 16).ok()
    }
}

impl From<String> for ChainId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for ChainId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<ChainId> for String {
    fn from(value: ChainId) -> Self {
        value.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Unapproved,
    Approved,
    Rejected,
    Signed,
    Submitted,
    Confirmed,
    Failed,
    Dropped,
    Cancelled,
    /// Any status this crate does not know about yet.
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Rejected
                | TransactionStatus::Confirmed
                | TransactionStatus::Failed
                | TransactionStatus::Dropped
                | TransactionStatus::Cancelled
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Transaction record as emitted by the transaction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<ChainId>,
    pub status: TransactionStatus,
    #[serde(default, deserialize_with = "lenient")]
    pub tx_params: TxParams,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub time: u64,
    /// Signed raw transaction, present once the keyring has signed it.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub raw_tx: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Engine error record, usually `{ message, name, .. }`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl TransactionMeta {
    pub fn new(id: impl Into<String>, status: TransactionStatus) -> Self {
        Self {
            id: id.into(),
            chain_id: None,
            status,
            tx_params: TxParams::default(),
            hash: None,
            time: 0,
            raw_tx: None,
            origin: None,
            error: None,
        }
    }

    pub fn with_chain_id(mut self, chain_id: impl Into<ChainId>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    /// Human-readable error, from `error.message` or a bare string error.
    pub fn error_message(&self) -> Option<&str> {
        match self.error.as_ref()? {
            Value::String(message) => Some(message.as_str()),
            other => other.get("message")?.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartTransactionStatus {
    Pending,
    Success,
    Reverted,
    Unknown,
    Cancelled,
    CancelledUserCancelled,
    CancelledDeadlineMissed,
    Resolved,
}

/// Entry tracked by the smart transactions controller for one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmartTransaction {
    pub id: String,
    pub status: SmartTransactionStatus,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_params: Option<TxParams>,
}

impl SmartTransaction {
    /// Sender address, if the entry carries transaction params.
    pub fn address_from(&self) -> Option<&str> {
        self.tx_params.as_ref()?.from.as_deref()
    }
}
