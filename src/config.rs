// Configuration management module
// This file handles loading and parsing of configuration settings
// from environment variables and an optional config file
//
// Numan Thabit 2025 Nov

use crate::transaction::ChainId;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;

const DEFAULT_ALLOWED_CHAINS: &[&str] = &["0x1", "0xaa36a7"];

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Target platform: extension, ios or android
    pub platform: Option<String>,
    /// Smart transactions relay API base, e.g. https://transaction.api.cx.metamask.io
    pub relay_endpoint: Option<Url>,
    /// Chains where relay submission may be used (hex ids)
    pub allowed_chain_ids: Option<Vec<String>>,
    /// Canonical RPC endpoint per chain; a user RPC must match it to use the relay
    pub canonical_rpc_urls: Option<HashMap<String, Url>>,
    /// JSON state snapshot consumed by the inspector binary
    pub snapshot_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name("stx-router").required(false))
            .add_source(
                config::Environment::with_prefix("STX")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("allowed_chain_ids")
                    .try_parsing(true),
            )
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn platform(&self) -> Result<Platform> {
        let raw = self
            .platform
            .as_deref()
            .unwrap_or("extension")
            .to_ascii_lowercase();
        match raw.as_str() {
            "extension" | "browser" => Ok(Platform::Extension),
            "ios" => Ok(Platform::Mobile(MobileOs::Ios)),
            "android" => Ok(Platform::Mobile(MobileOs::Android)),
            other => bail!("unsupported platform: {other}"),
        }
    }

    pub fn routing_settings(&self) -> Result<RoutingSettings> {
        let platform = self.platform().context("resolve platform")?;

        let allowed_chain_ids = match &self.allowed_chain_ids {
            Some(ids) if ids.is_empty() => bail!("STX__ALLOWED_CHAIN_IDS must not be empty"),
            Some(ids) => ids.iter().map(ChainId::new).collect(),
            None => DEFAULT_ALLOWED_CHAINS.iter().copied().map(ChainId::new).collect(),
        };

        let canonical_rpc_urls = self
            .canonical_rpc_urls
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|(chain, url)| (ChainId::new(chain), url))
            .collect();

        Ok(RoutingSettings {
            platform,
            allowed_chain_ids,
            canonical_rpc_urls,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobileOs {
    Ios,
    Android,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Extension,
    Mobile(MobileOs),
}

/// Static inputs of the eligibility decision that do not live in app state.
#[derive(Debug, Clone)]
pub struct RoutingSettings {
    pub platform: Platform,
    pub allowed_chain_ids: Vec<ChainId>,
    pub canonical_rpc_urls: HashMap<ChainId, Url>,
}

impl RoutingSettings {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            allowed_chain_ids: DEFAULT_ALLOWED_CHAINS.iter().copied().map(ChainId::new).collect(),
            canonical_rpc_urls: HashMap::new(),
        }
    }

    pub fn is_allowed_chain(&self, chain_id: &ChainId) -> bool {
        self.allowed_chain_ids.contains(chain_id)
    }

    pub fn canonical_rpc(&self, chain_id: &ChainId) -> Option<&Url> {
        self.canonical_rpc_urls.get(chain_id)
    }
}
