// Smart transaction relay HTTP client
// This file implements submission of signed transactions to the relay API.
// Settlement and retries happen on the relay side.
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use crate::flags::FeatureFlags;
use crate::relay::{RelayOutcome, RelayRequest, RelaySubmitter};
use crate::transaction::ChainId;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpRelayClient {
    http: Client,
    base: Url,
}

impl HttpRelayClient {
    pub fn new(base: Url) -> Self {
        Self {
            http: Client::new(),
            base,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    fn submit_url(&self, chain_id: &ChainId) -> Result<Url, RouterError> {
        let chain = chain_id
            .decimal()
            .ok_or_else(|| RouterError::BuildTx(format!("invalid chain id: {chain_id}")))?;
        let url = format!(
            "{}/networks/{chain}/submitTransactions",
            self.base.as_str().trim_end_matches('/')
        );
        Url::parse(&url).map_err(|e| RouterError::BuildTx(format!("relay url: {e}")))
    }

    pub async fn submit_raw(
        &self,
        chain_id: &ChainId,
        raw_tx: &str,
    ) -> Result<SubmitResp, RouterError> {
        let payload = json!({
            "rawTxs": [raw_tx],
            "rawCancelTxs": []
        });
        let resp = self
            .http
            .post(self.submit_url(chain_id)?)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RouterError::Transport(format!("relay send: {e}")))?;
        if !resp.status().is_success() {
            return Err(RouterError::Provider(format!("http {}", resp.status())));
        }
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| RouterError::Transport(format!("json parse: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(RouterError::Relay(err.to_string()));
        }
        serde_json::from_value(body)
            .map_err(|e| RouterError::Provider(format!("decode result: {e}")))
    }
}

#[async_trait]
impl RelaySubmitter for HttpRelayClient {
    async fn submit(&self, request: RelayRequest) -> Result<RelayOutcome, RouterError> {
        let meta = &request.transaction_meta;
        let chain_id = meta
            .chain_id
            .as_ref()
            .ok_or_else(|| RouterError::BuildTx(format!("transaction {} has no chain id", meta.id)))?;
        let raw_tx = meta
            .raw_tx
            .as_deref()
            .ok_or_else(|| RouterError::BuildTx(format!("transaction {} is not signed", meta.id)))?;

        let resp = self.submit_raw(chain_id, raw_tx).await?;
        Ok(resp.into_outcome(request.feature_flags.as_ref()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResp {
    pub uuid: Option<String>,
    pub tx_hash: Option<String>,
}

impl SubmitResp {
    /// The relay hash is only surfaced when the chain asks for it asap.
    pub fn into_outcome(self, flags: Option<&FeatureFlags>) -> RelayOutcome {
        let return_hash = flags.is_some_and(|flags| flags.mobile_return_tx_hash_asap);
        RelayOutcome {
            uuid: self.uuid,
            transaction_hash: if return_hash { self.tx_hash } else { None },
        }
    }
}
