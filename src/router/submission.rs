// Submission router - publish-time hook
// Decides per pending transaction whether it goes to the smart transaction
// relay or through the default network path, plus the engine policies that
// hang off the same decision inputs
//
// Numan Thabit 2025 Nov

use crate::config::RoutingSettings;
use crate::eligibility;
use crate::errors::RouterError;
use crate::flags;
use crate::metrics::{RELAY_LATENCY, RELAY_SUBMISSIONS, ROUTING_DECISIONS};
use crate::relay::{
    RelayOutcome, RelayRequest, RelaySubmitter, SmartTransactionQuery, SmartTransactionsSource,
};
use crate::state::StateReader;
use crate::transaction::{SmartTransaction, SmartTransactionStatus, TransactionMeta};
use futures::future::{self, BoxFuture, FutureExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of the publish hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The relay accepted (or rejected) the transaction; the engine must not broadcast it.
    RoutedToRelay(RelayOutcome),
    /// Not eligible; the engine submits through its own network path.
    UseDefaultPath,
}

pub type PublishFuture = BoxFuture<'static, Result<PublishOutcome, RouterError>>;
pub type PublishHook = Arc<dyn Fn(TransactionMeta) -> PublishFuture + Send + Sync>;

pub struct SubmissionRouter {
    state: Arc<dyn StateReader>,
    settings: RoutingSettings,
    relay: Arc<dyn RelaySubmitter>,
}

impl SubmissionRouter {
    pub fn new(
        state: Arc<dyn StateReader>,
        settings: RoutingSettings,
        relay: Arc<dyn RelaySubmitter>,
    ) -> Self {
        Self {
            state,
            settings,
            relay,
        }
    }

    pub fn settings(&self) -> &RoutingSettings {
        &self.settings
    }

    /// Take the routing decision now and return the deferred submission.
    ///
    /// The relay is called at most once and its error is returned unchanged;
    /// a failed relay submission is never retried through the default path.
    pub fn route(&self, tx: TransactionMeta) -> PublishFuture {
        let state = self.state.snapshot();
        if !eligibility::should_use(&state, &self.settings) {
            ROUTING_DECISIONS.with_label_values(&["default"]).inc();
            debug!(id = %tx.id, "publishing through default network path");
            return future::ready(Ok(PublishOutcome::UseDefaultPath)).boxed();
        }

        let chain_id = tx
            .chain_id
            .clone()
            .unwrap_or_else(|| state.chain_id().clone());
        let request = RelayRequest {
            feature_flags: flags::project(&state.swaps, &chain_id),
            transaction_meta: tx,
            should_use_smart_transaction: true,
        };
        ROUTING_DECISIONS.with_label_values(&["relay"]).inc();

        let relay = self.relay.clone();
        async move {
            let id = request.transaction_meta.id.clone();
            info!(id = %id, chain_id = %chain_id, "routing transaction to smart transaction relay");

            let timer = RELAY_LATENCY.with_label_values(&["submit"]).start_timer();
            let result = relay.submit(request).await;
            timer.observe_duration();

            match result {
                Ok(outcome) => {
                    RELAY_SUBMISSIONS.with_label_values(&["success"]).inc();
                    debug!(id = %id, uuid = ?outcome.uuid, hash = ?outcome.transaction_hash, "relay accepted transaction");
                    Ok(PublishOutcome::RoutedToRelay(outcome))
                }
                Err(err) => {
                    RELAY_SUBMISSIONS.with_label_values(&["failure"]).inc();
                    warn!(id = %id, error = %err, "relay submission failed");
                    Err(err)
                }
            }
        }
        .boxed()
    }

    pub async fn publish(&self, tx: TransactionMeta) -> Result<PublishOutcome, RouterError> {
        self.route(tx).await
    }

    /// The publish hook in the form the transaction engine stores it.
    pub fn publish_hook(self: &Arc<Self>) -> PublishHook {
        let router = self.clone();
        Arc::new(move |tx: TransactionMeta| router.route(tx))
    }
}

/// Whether incoming transactions are polled for the current chain.
#[derive(Clone)]
pub struct IncomingTransactionsPolicy {
    state: Arc<dyn StateReader>,
    pub update_transactions: bool,
}

impl IncomingTransactionsPolicy {
    pub fn new(state: Arc<dyn StateReader>) -> Self {
        Self {
            state,
            update_transactions: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        let state = self.state.snapshot();
        state
            .preferences
            .show_incoming_transactions
            .get(state.chain_id())
            .copied()
            .unwrap_or(false)
    }
}

/// Resubmission of stuck transactions is owned by the relay, never the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingTransactionsPolicy;

impl PendingTransactionsPolicy {
    pub fn is_resubmit_enabled(&self) -> bool {
        false
    }
}

/// Pending relay transactions sent from `address`, empty when there are none.
pub fn external_pending_transactions(
    source: &dyn SmartTransactionsSource,
    address: &str,
) -> Vec<SmartTransaction> {
    source.get_transactions(&SmartTransactionQuery {
        address_from: address.to_string(),
        status: SmartTransactionStatus::Pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::tests::{enabled_state, ios};
    use crate::state::SharedState;
    use crate::transaction::{ChainId, TransactionStatus};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockRelay {
        requests: Mutex<Vec<RelayRequest>>,
        fail_with: Option<RouterError>,
    }

    #[async_trait]
    impl RelaySubmitter for MockRelay {
        async fn submit(&self, request: RelayRequest) -> Result<RelayOutcome, RouterError> {
            self.requests.lock().unwrap().push(request);
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(RelayOutcome {
                    uuid: Some("uuid-1".into()),
                    transaction_hash: None,
                }),
            }
        }
    }

    fn router(state: SharedState, relay: Arc<MockRelay>) -> Arc<SubmissionRouter> {
        Arc::new(SubmissionRouter::new(Arc::new(state), ios(), relay))
    }

    fn tx() -> TransactionMeta {
        TransactionMeta::new("123", TransactionStatus::Approved)
    }

    #[tokio::test]
    async fn eligible_transaction_goes_to_relay_once() {
        let relay = Arc::new(MockRelay::default());
        let router = router(SharedState::new(enabled_state()), relay.clone());

        let outcome = router.publish(tx()).await.unwrap();
        assert_eq!(
            outcome,
            PublishOutcome::RoutedToRelay(RelayOutcome {
                uuid: Some("uuid-1".into()),
                transaction_hash: None,
            })
        );

        let requests = relay.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].transaction_meta, tx());
        assert!(requests[0].should_use_smart_transaction);
        let flags = requests[0].feature_flags.as_ref().unwrap();
        assert_eq!(flags.max_deadline, Some(160.0));
    }

    #[tokio::test]
    async fn ineligible_transaction_uses_default_path() {
        let relay = Arc::new(MockRelay::default());
        let state = SharedState::new(enabled_state());
        state.update(|s| s.opt_in = false);
        let router = router(state, relay.clone());

        assert_eq!(router.publish(tx()).await.unwrap(), PublishOutcome::UseDefaultPath);
        assert!(relay.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn decision_uses_state_at_call_time() {
        let relay = Arc::new(MockRelay::default());
        let state = SharedState::new(enabled_state());
        let router = router(state.clone(), relay.clone());

        let pending = router.route(tx());
        state.update(|s| s.liveness = false);
        assert!(matches!(pending.await.unwrap(), PublishOutcome::RoutedToRelay(_)));

        assert_eq!(router.publish(tx()).await.unwrap(), PublishOutcome::UseDefaultPath);
        assert_eq!(relay.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn relay_failure_is_not_downgraded() {
        let relay = Arc::new(MockRelay {
            fail_with: Some(RouterError::Relay("bundle rejected".into())),
            ..MockRelay::default()
        });
        let router = router(SharedState::new(enabled_state()), relay.clone());

        let err = router.publish(tx()).await.unwrap_err();
        assert_eq!(err, RouterError::Relay("bundle rejected".into()));
        assert_eq!(relay.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn flags_follow_transaction_chain() {
        let relay = Arc::new(MockRelay::default());
        let router = router(SharedState::new(enabled_state()), relay.clone());

        let hook = router.publish_hook();
        hook(tx().with_chain_id("0x89")).await.unwrap();

        let requests = relay.requests.lock().unwrap();
        assert_eq!(requests[0].transaction_meta.chain_id, Some(ChainId::new("0x89")));
        assert_eq!(requests[0].feature_flags, None);
    }

    #[test]
    fn incoming_transactions_follow_chain_preference() {
        let state = SharedState::new(enabled_state());
        let policy = IncomingTransactionsPolicy::new(Arc::new(state.clone()));
        assert!(!policy.is_enabled());
        assert!(policy.update_transactions);

        state.update(|s| {
            s.preferences
                .show_incoming_transactions
                .insert(ChainId::new("0x1"), true);
        });
        assert!(policy.is_enabled());

        state.update(|s| s.network.chain_id = ChainId::new("0x89"));
        assert!(!policy.is_enabled());
    }

    #[test]
    fn resubmit_is_always_disabled() {
        assert!(!PendingTransactionsPolicy.is_resubmit_enabled());
    }

    #[test]
    fn external_pending_queries_pending_status_for_address() {
        struct Source(Mutex<Vec<SmartTransactionQuery>>);
        impl SmartTransactionsSource for Source {
            fn get_transactions(&self, query: &SmartTransactionQuery) -> Vec<SmartTransaction> {
                self.0.lock().unwrap().push(query.clone());
                Vec::new()
            }
        }

        let source = Source(Mutex::new(Vec::new()));
        assert!(external_pending_transactions(&source, "0x123").is_empty());
        assert_eq!(
            source.0.lock().unwrap().as_slice(),
            &[SmartTransactionQuery {
                address_from: "0x123".into(),
                status: SmartTransactionStatus::Pending,
            }]
        );
    }
}
