// Transaction controller bootstrap
//
// Resolves the collaborating controllers, assembles the option set the
// transaction engine is constructed from, and attaches the lifecycle event
// router once the engine exists. Lookup and construction errors are returned
// to the caller unchanged.
//
// Numan Thabit 2025 Nov

use crate::bus::MessageBus;
use crate::config::RoutingSettings;
use crate::errors::RouterError;
use crate::relay::{RelaySubmitter, SmartTransactionsSource};
use crate::router::events::LifecycleEventRouter;
use crate::router::handlers::{HandlerContext, HandlerTable};
use crate::router::submission::{
    self, IncomingTransactionsPolicy, PendingTransactionsPolicy, PublishHook, SubmissionRouter,
};
use crate::state::StateReader;
use crate::transaction::{ChainId, SmartTransaction, TransactionMeta};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    pub chain_id: ChainId,
    pub selected_network_client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkClientConfiguration {
    pub chain_id: ChainId,
    pub rpc_url: Url,
}

pub type NetworkClientRegistry = HashMap<String, NetworkClientConfiguration>;

pub trait NetworkController: Send + Sync {
    fn state(&self) -> NetworkState;
    fn eip1559_compatibility(&self) -> Result<bool, RouterError>;
    fn network_client_registry(&self) -> NetworkClientRegistry;
}

#[async_trait]
pub trait GasFeeController: Send + Sync {
    async fn fetch_gas_fee_estimates(&self) -> Result<serde_json::Value, RouterError>;
}

#[async_trait]
pub trait KeyringController: Send + Sync {
    /// Returns the signed raw transaction.
    async fn sign_transaction(&self, tx: TransactionMeta, from: String) -> Result<String, RouterError>;
}

/// Lookup of sibling controllers. Each getter fails if the controller is not
/// registered yet.
pub trait ControllerRegistry: Send + Sync {
    fn network_controller(&self) -> Result<Arc<dyn NetworkController>, RouterError>;
    fn gas_fee_controller(&self) -> Result<Arc<dyn GasFeeController>, RouterError>;
    fn keyring_controller(&self) -> Result<Arc<dyn KeyringController>, RouterError>;
    fn smart_transactions_controller(&self)
        -> Result<Arc<dyn SmartTransactionsSource>, RouterError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionControllerState {
    pub transactions: Vec<TransactionMeta>,
}

pub type BoolFn = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Clone)]
pub struct IncomingTransactionsOptions {
    pub is_enabled: BoolFn,
    pub update_transactions: bool,
}

#[derive(Clone)]
pub struct PendingTransactionsOptions {
    pub is_resubmit_enabled: BoolFn,
}

#[derive(Clone)]
pub struct TransactionHooks {
    pub publish: PublishHook,
}

/// Everything the transaction engine needs from the outside world.
#[derive(Clone)]
pub struct TransactionControllerOptions {
    pub state: Option<TransactionControllerState>,
    pub get_external_pending_transactions: Arc<dyn Fn(&str) -> Vec<SmartTransaction> + Send + Sync>,
    pub is_simulation_enabled: BoolFn,
    pub incoming_transactions: IncomingTransactionsOptions,
    pub pending_transactions: PendingTransactionsOptions,
    pub hooks: TransactionHooks,
    pub get_network_state: Arc<dyn Fn() -> NetworkState + Send + Sync>,
    pub get_current_network_eip1559_compatibility:
        Arc<dyn Fn() -> Result<bool, RouterError> + Send + Sync>,
    pub get_gas_fee_estimates:
        Arc<dyn Fn() -> BoxFuture<'static, Result<serde_json::Value, RouterError>> + Send + Sync>,
    pub get_network_client_registry: Arc<dyn Fn() -> NetworkClientRegistry + Send + Sync>,
    pub sign: Arc<
        dyn Fn(TransactionMeta, String) -> BoxFuture<'static, Result<String, RouterError>>
            + Send
            + Sync,
    >,
}

pub struct ControllerInitRequest {
    pub controllers: Arc<dyn ControllerRegistry>,
    pub persisted_state: Option<TransactionControllerState>,
    pub init_messenger: Arc<dyn MessageBus>,
    pub state: Arc<dyn StateReader>,
    pub settings: RoutingSettings,
    pub relay: Arc<dyn RelaySubmitter>,
    pub handlers: HandlerTable,
}

pub struct TransactionControllerInit<E> {
    pub controller: E,
    pub submission: Arc<SubmissionRouter>,
    pub event_router: LifecycleEventRouter,
}

/// Build the engine with `build` and wire the routing layer around it.
pub fn init_transaction_controller<E>(
    request: ControllerInitRequest,
    build: impl FnOnce(TransactionControllerOptions) -> Result<E, RouterError>,
) -> Result<TransactionControllerInit<E>, RouterError> {
    let ControllerInitRequest {
        controllers,
        persisted_state,
        init_messenger,
        state,
        settings,
        relay,
        handlers,
    } = request;

    let network = controllers.network_controller()?;
    let gas_fees = controllers.gas_fee_controller()?;
    let keyring = controllers.keyring_controller()?;
    let smart_transactions = controllers.smart_transactions_controller()?;

    if LifecycleEventRouter::is_attached(init_messenger.as_ref()) {
        return Err(RouterError::Construction(
            "lifecycle events are already routed on this messenger".into(),
        ));
    }

    let submission = Arc::new(SubmissionRouter::new(state.clone(), settings, relay));
    let incoming = IncomingTransactionsPolicy::new(state.clone());
    let pending = PendingTransactionsPolicy;

    let options = TransactionControllerOptions {
        state: persisted_state,
        get_external_pending_transactions: Arc::new(move |address: &str| {
            submission::external_pending_transactions(smart_transactions.as_ref(), address)
        }),
        is_simulation_enabled: {
            let state = state.clone();
            Arc::new(move || state.snapshot().preferences.use_transaction_simulations)
        },
        incoming_transactions: IncomingTransactionsOptions {
            update_transactions: incoming.update_transactions,
            is_enabled: Arc::new(move || incoming.is_enabled()),
        },
        pending_transactions: PendingTransactionsOptions {
            is_resubmit_enabled: Arc::new(move || pending.is_resubmit_enabled()),
        },
        hooks: TransactionHooks {
            publish: submission.publish_hook(),
        },
        get_network_state: {
            let network = network.clone();
            Arc::new(move || network.state())
        },
        get_current_network_eip1559_compatibility: {
            let network = network.clone();
            Arc::new(move || network.eip1559_compatibility())
        },
        get_gas_fee_estimates: Arc::new(move || {
            let gas_fees = gas_fees.clone();
            async move { gas_fees.fetch_gas_fee_estimates().await }.boxed()
        }),
        get_network_client_registry: Arc::new(move || network.network_client_registry()),
        sign: Arc::new(move |tx: TransactionMeta, from: String| {
            let keyring = keyring.clone();
            async move { keyring.sign_transaction(tx, from).await }.boxed()
        }),
    };

    let controller = build(options)?;

    let context = HandlerContext::new(state);
    let event_router = LifecycleEventRouter::attach(init_messenger, handlers, context);
    info!(
        subscriptions = event_router.subscription_count(),
        "transaction controller initialized"
    );

    Ok(TransactionControllerInit {
        controller,
        submission,
        event_router,
    })
}
