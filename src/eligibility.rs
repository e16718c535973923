// Smart transaction eligibility
//
// Reduces feature flags, platform switches, relay liveness, account type and
// network identity into the `enabled` verdict, then layers the user opt-in on
// top to get `should_use`. Everything is a pure function of the snapshot.
//
// Numan Thabit 2025 Nov

use crate::config::{MobileOs, Platform, RoutingSettings};
use crate::flags::{self, FeatureFlags, GlobalFeatureFlags};
use crate::state::StateSnapshot;
use crate::transaction::SmartTransaction;
use std::fmt;
use tracing::debug;
use url::Url;

/// First check that disabled smart transactions for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledReason {
    MissingChainFlags,
    ChainNotAllowed,
    PlatformInactive,
    RelayNotLive,
    HardwareAccount,
    CustomRpc,
}

impl fmt::Display for DisabledReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DisabledReason::MissingChainFlags => "missing_chain_flags",
            DisabledReason::ChainNotAllowed => "chain_not_allowed",
            DisabledReason::PlatformInactive => "platform_inactive",
            DisabledReason::RelayNotLive => "relay_not_live",
            DisabledReason::HardwareAccount => "hardware_account",
            DisabledReason::CustomRpc => "custom_rpc",
        };
        f.write_str(s)
    }
}

fn platform_active(
    platform: Platform,
    global: Option<GlobalFeatureFlags>,
    flags: &FeatureFlags,
) -> bool {
    let Some(global) = global else {
        return false;
    };
    match platform {
        Platform::Extension => global.extension_active && flags.extension_active,
        Platform::Mobile(os) => {
            let os_rollout = match os {
                MobileOs::Ios => flags.mobile_active_ios,
                MobileOs::Android => flags.mobile_active_android,
            };
            global.mobile_active && (flags.mobile_active || os_rollout)
        }
    }
}

fn same_endpoint(a: &Url, b: &Url) -> bool {
    a.as_str().trim_end_matches('/') == b.as_str().trim_end_matches('/')
}

/// Run every eligibility check against `state`, reporting the first failure.
pub fn evaluate(state: &StateSnapshot, settings: &RoutingSettings) -> Result<(), DisabledReason> {
    let chain_id = state.chain_id();

    let flags = flags::project(&state.swaps, chain_id).ok_or(DisabledReason::MissingChainFlags)?;
    if !settings.is_allowed_chain(chain_id) {
        return Err(DisabledReason::ChainNotAllowed);
    }
    if !platform_active(settings.platform, flags::global(&state.swaps), &flags) {
        return Err(DisabledReason::PlatformInactive);
    }
    if !state.liveness {
        return Err(DisabledReason::RelayNotLive);
    }
    if state
        .account
        .as_ref()
        .is_some_and(|account| account.is_hardware_account())
    {
        return Err(DisabledReason::HardwareAccount);
    }
    if let Some(rpc_url) = &state.network.rpc_url {
        let canonical = settings.canonical_rpc(chain_id);
        if !canonical.is_some_and(|canonical| same_endpoint(canonical, rpc_url)) {
            return Err(DisabledReason::CustomRpc);
        }
    }
    Ok(())
}

/// Whether the relay path is available for the current chain, ignoring opt-in.
pub fn is_enabled(state: &StateSnapshot, settings: &RoutingSettings) -> bool {
    match evaluate(state, settings) {
        Ok(()) => true,
        Err(reason) => {
            debug!(chain_id = %state.chain_id(), reason = %reason, "smart transactions disabled");
            false
        }
    }
}

/// `is_enabled` and the user has opted in.
pub fn should_use(state: &StateSnapshot, settings: &RoutingSettings) -> bool {
    state.opt_in && is_enabled(state, settings)
}

/// Stored smart transactions for the current chain, in stored order.
pub fn transactions_for_current_chain(state: &StateSnapshot) -> Vec<SmartTransaction> {
    state
        .smart_transactions
        .get(state.chain_id())
        .cloned()
        .unwrap_or_default()
}
