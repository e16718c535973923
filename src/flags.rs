// Feature flag view
// Projects the raw swaps / remote-config document into typed smart
// transaction flags for one chain. Absent or malformed input yields None.
//
// Numan Thabit 2025 Nov

use crate::transaction::{lenient, ChainId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Smart transaction flags resolved for a single chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub extension_active: bool,
    pub mobile_active: bool,
    #[serde(rename = "mobileActiveIOS")]
    pub mobile_active_ios: bool,
    pub mobile_active_android: bool,
    /// Seconds the relay expects to need before inclusion.
    pub expected_deadline: Option<f64>,
    /// Hard deadline in seconds after which the relay gives up.
    pub max_deadline: Option<f64>,
    pub mobile_return_tx_hash_asap: bool,
}

/// Kill switches stored under `featureFlags.smart_transactions`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct GlobalFeatureFlags {
    #[serde(default)]
    pub mobile_active: bool,
    #[serde(default)]
    pub extension_active: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlatformSwitches {
    extension_active: bool,
    mobile_active: bool,
    #[serde(rename = "mobileActiveIOS")]
    mobile_active_ios: bool,
    mobile_active_android: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ChainRecord {
    #[serde(deserialize_with = "lenient")]
    expected_deadline: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    max_deadline: Option<f64>,
    mobile_return_tx_hash_asap: bool,
}

fn decode<T: for<'de> Deserialize<'de>>(value: Option<&Value>) -> Option<T> {
    let value = value.filter(|v| v.is_object())?;
    T::deserialize(value).ok()
}

/// Resolve the flags for `chain_id`.
///
/// The per-chain record lives at `raw[chain_id].featureFlags.smartTransactions`
/// and the platform switches at `raw.featureFlags.smartTransactions`. Returns
/// `None` when the per-chain record is missing or not decodable.
pub fn project(raw: &Value, chain_id: &ChainId) -> Option<FeatureFlags> {
    let chain: ChainRecord = decode(
        raw.get(chain_id.as_str())
            .and_then(|c| c.get("featureFlags"))
            .and_then(|f| f.get("smartTransactions")),
    )?;
    let switches: PlatformSwitches = decode(
        raw.get("featureFlags")
            .and_then(|f| f.get("smartTransactions")),
    )
    .unwrap_or_default();

    Some(FeatureFlags {
        extension_active: switches.extension_active,
        mobile_active: switches.mobile_active,
        mobile_active_ios: switches.mobile_active_ios,
        mobile_active_android: switches.mobile_active_android,
        expected_deadline: chain.expected_deadline,
        max_deadline: chain.max_deadline,
        mobile_return_tx_hash_asap: chain.mobile_return_tx_hash_asap,
    })
}

/// Resolve the global kill switches, `None` when the record is absent.
pub fn global(raw: &Value) -> Option<GlobalFeatureFlags> {
    decode(
        raw.get("featureFlags")
            .and_then(|f| f.get("smart_transactions")),
    )
}
