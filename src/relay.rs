// Relay collaborator contracts
// The relay backend owns execution, retries and settlement of protected
// transactions. This module only fixes the request/outcome shapes.
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use crate::flags::FeatureFlags;
use crate::state::StateReader;
use crate::transaction::{SmartTransaction, SmartTransactionStatus, TransactionMeta};
use async_trait::async_trait;
use std::sync::Arc;

/// Request handed to the relay when a transaction is routed there.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayRequest {
    pub transaction_meta: TransactionMeta,
    pub should_use_smart_transaction: bool,
    pub feature_flags: Option<FeatureFlags>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayOutcome {
    pub uuid: Option<String>,
    /// Returned immediately only when the relay is asked to return the hash asap.
    pub transaction_hash: Option<String>,
}

#[async_trait]
pub trait RelaySubmitter: Send + Sync {
    async fn submit(&self, request: RelayRequest) -> Result<RelayOutcome, RouterError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartTransactionQuery {
    pub address_from: String,
    pub status: SmartTransactionStatus,
}

/// Read access to smart transactions tracked by the relay controller.
pub trait SmartTransactionsSource: Send + Sync {
    fn get_transactions(&self, query: &SmartTransactionQuery) -> Vec<SmartTransaction>;
}

impl SmartTransactionQuery {
    pub fn matches(&self, stx: &SmartTransaction) -> bool {
        stx.status == self.status
            && stx
                .address_from()
                .is_some_and(|from| from.eq_ignore_ascii_case(&self.address_from))
    }
}

/// Serves queries from the smart transaction buckets of the state snapshot,
/// current chain only.
#[derive(Clone)]
pub struct SnapshotSmartTransactions {
    state: Arc<dyn StateReader>,
}

impl SnapshotSmartTransactions {
    pub fn new(state: Arc<dyn StateReader>) -> Self {
        Self { state }
    }
}

impl SmartTransactionsSource for SnapshotSmartTransactions {
    fn get_transactions(&self, query: &SmartTransactionQuery) -> Vec<SmartTransaction> {
        let state = self.state.snapshot();
        state
            .smart_transactions
            .get(state.chain_id())
            .map(|bucket| bucket.iter().filter(|stx| query.matches(stx)).cloned().collect())
            .unwrap_or_default()
    }
}
