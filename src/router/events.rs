// Transaction lifecycle event router
// Subscribes once to each of the seven engine lifecycle events, decodes the
// per-event payload shape and hands the bare TransactionMeta to its handler
//
// Numan Thabit 2025 Nov

use crate::bus::{MessageBus, SubscriptionId};
use crate::errors::RouterError;
use crate::router::handlers::{HandlerContext, HandlerTable};
use crate::transaction::{TransactionMeta, TransactionStatus};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Added,
    Approved,
    Confirmed,
    Dropped,
    Failed,
    Rejected,
    Submitted,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 7] = [
        LifecycleEvent::Added,
        LifecycleEvent::Approved,
        LifecycleEvent::Confirmed,
        LifecycleEvent::Dropped,
        LifecycleEvent::Failed,
        LifecycleEvent::Rejected,
        LifecycleEvent::Submitted,
    ];

    /// Name the transaction engine publishes this event under.
    pub fn bus_name(&self) -> &'static str {
        match self {
            LifecycleEvent::Added => "TransactionController:unapprovedTransactionAdded",
            LifecycleEvent::Approved => "TransactionController:transactionApproved",
            LifecycleEvent::Confirmed => "TransactionController:transactionConfirmed",
            LifecycleEvent::Dropped => "TransactionController:transactionDropped",
            LifecycleEvent::Failed => "TransactionController:transactionFailed",
            LifecycleEvent::Rejected => "TransactionController:transactionRejected",
            LifecycleEvent::Submitted => "TransactionController:transactionSubmitted",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LifecycleEvent::Added => "added",
            LifecycleEvent::Approved => "approved",
            LifecycleEvent::Confirmed => "confirmed",
            LifecycleEvent::Dropped => "dropped",
            LifecycleEvent::Failed => "failed",
            LifecycleEvent::Rejected => "rejected",
            LifecycleEvent::Submitted => "submitted",
        }
    }

    /// Status a transaction ends in when this event is its last one.
    pub fn terminal_status(&self) -> Option<TransactionStatus> {
        match self {
            LifecycleEvent::Confirmed => Some(TransactionStatus::Confirmed),
            LifecycleEvent::Dropped => Some(TransactionStatus::Dropped),
            LifecycleEvent::Failed => Some(TransactionStatus::Failed),
            LifecycleEvent::Rejected => Some(TransactionStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope {
    pub transaction_meta: TransactionMeta,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedEnvelope {
    pub transaction_meta: TransactionMeta,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Payload of each lifecycle event in the exact shape the engine emits it.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionEvent {
    Added(TransactionMeta),
    Approved(TransactionEnvelope),
    Confirmed(TransactionMeta),
    Dropped(TransactionEnvelope),
    Failed(FailedEnvelope),
    Rejected(TransactionEnvelope),
    Submitted(TransactionEnvelope),
}

fn from_payload<T: for<'de> Deserialize<'de>>(
    event: LifecycleEvent,
    payload: Value,
) -> Result<T, RouterError> {
    serde_json::from_value(payload)
        .map_err(|e| RouterError::Payload(format!("{}: {e}", event.bus_name())))
}

impl TransactionEvent {
    pub fn decode(event: LifecycleEvent, payload: Value) -> Result<Self, RouterError> {
        Ok(match event {
            LifecycleEvent::Added => TransactionEvent::Added(from_payload(event, payload)?),
            LifecycleEvent::Approved => TransactionEvent::Approved(from_payload(event, payload)?),
            LifecycleEvent::Confirmed => TransactionEvent::Confirmed(from_payload(event, payload)?),
            LifecycleEvent::Dropped => TransactionEvent::Dropped(from_payload(event, payload)?),
            LifecycleEvent::Failed => TransactionEvent::Failed(from_payload(event, payload)?),
            LifecycleEvent::Rejected => TransactionEvent::Rejected(from_payload(event, payload)?),
            LifecycleEvent::Submitted => TransactionEvent::Submitted(from_payload(event, payload)?),
        })
    }

    pub fn kind(&self) -> LifecycleEvent {
        match self {
            TransactionEvent::Added(_) => LifecycleEvent::Added,
            TransactionEvent::Approved(_) => LifecycleEvent::Approved,
            TransactionEvent::Confirmed(_) => LifecycleEvent::Confirmed,
            TransactionEvent::Dropped(_) => LifecycleEvent::Dropped,
            TransactionEvent::Failed(_) => LifecycleEvent::Failed,
            TransactionEvent::Rejected(_) => LifecycleEvent::Rejected,
            TransactionEvent::Submitted(_) => LifecycleEvent::Submitted,
        }
    }

    /// Unwrap envelopes so every handler sees the bare metadata.
    pub fn into_meta(self) -> TransactionMeta {
        match self {
            TransactionEvent::Added(meta) | TransactionEvent::Confirmed(meta) => meta,
            TransactionEvent::Approved(env)
            | TransactionEvent::Dropped(env)
            | TransactionEvent::Rejected(env)
            | TransactionEvent::Submitted(env) => env.transaction_meta,
            TransactionEvent::Failed(env) => env.transaction_meta,
        }
    }
}

/// Dispatch one decoded event to its handler. Handler errors are returned as-is.
pub fn dispatch(
    handlers: &HandlerTable,
    context: &HandlerContext,
    event: TransactionEvent,
) -> Result<(), RouterError> {
    let kind = event.kind();
    if let TransactionEvent::Failed(FailedEnvelope { error: Some(err), transaction_meta }) = &event {
        warn!(id = %transaction_meta.id, error = %err, "engine reported transaction failure");
    }
    let meta = event.into_meta();
    trace!(event = kind.label(), id = %meta.id, "dispatching lifecycle event");
    handlers.handler_for(kind).handle(&meta, context)
}

/// Owns the seven bus subscriptions for one transaction engine instance.
pub struct LifecycleEventRouter {
    bus: Arc<dyn MessageBus>,
    subscriptions: Vec<SubscriptionId>,
}

impl LifecycleEventRouter {
    /// Subscribe one callback per lifecycle event on `bus`.
    ///
    /// Attaching twice to the same bus without disposing the first router
    /// delivers every event twice. Use `is_attached` to check first.
    pub fn attach(bus: Arc<dyn MessageBus>, handlers: HandlerTable, context: HandlerContext) -> Self {
        let handlers = Arc::new(handlers);
        let subscriptions = LifecycleEvent::ALL
            .iter()
            .map(|&event| {
                let handlers = handlers.clone();
                let context = context.clone();
                bus.subscribe(
                    event.bus_name(),
                    Arc::new(move |payload: Value| {
                        let decoded = TransactionEvent::decode(event, payload)?;
                        dispatch(&handlers, &context, decoded)
                    }),
                )
            })
            .collect::<Vec<_>>();
        debug!(subscriptions = subscriptions.len(), "lifecycle event router attached");
        Self { bus, subscriptions }
    }

    /// Whether any lifecycle event already has a subscriber on `bus`.
    pub fn is_attached(bus: &dyn MessageBus) -> bool {
        LifecycleEvent::ALL
            .iter()
            .any(|event| bus.subscriber_count(event.bus_name()) > 0)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Drop every subscription. Must run before attaching a replacement router.
    pub fn dispose(&mut self) {
        if self.subscriptions.is_empty() {
            return;
        }
        for id in self.subscriptions.drain(..) {
            self.bus.unsubscribe(id);
        }
        debug!("lifecycle event router disposed");
    }
}

impl Drop for LifecycleEventRouter {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::LocalBus;
    use crate::router::handlers::{LifecycleRecorder, TransactionEventHandler};
    use crate::state::SharedState;
    use serde_json::json;
    use std::sync::Mutex;

    type Calls = Arc<Mutex<Vec<(LifecycleEvent, TransactionMeta)>>>;

    fn recording_table(calls: &Calls) -> HandlerTable {
        HandlerTable::from_fn(|event| {
            let calls = calls.clone();
            Arc::new(move |meta: &TransactionMeta, ctx: &HandlerContext| -> Result<(), RouterError> {
                let _ = ctx.transaction_metric_properties(&meta.id);
                calls.lock().unwrap().push((event, meta.clone()));
                Ok(())
            })
        })
    }

    fn attach(bus: &LocalBus, calls: &Calls) -> LifecycleEventRouter {
        let context = HandlerContext::new(Arc::new(SharedState::default()));
        LifecycleEventRouter::attach(Arc::new(bus.clone()), recording_table(calls), context)
    }

    fn meta() -> TransactionMeta {
        TransactionMeta::new("123", TransactionStatus::Approved)
    }

    fn payload_for(event: LifecycleEvent) -> Value {
        let meta = serde_json::to_value(meta()).unwrap();
        match event {
            LifecycleEvent::Added | LifecycleEvent::Confirmed => meta,
            LifecycleEvent::Failed => json!({ "transactionMeta": meta, "error": { "message": "reverted" } }),
            _ => json!({ "transactionMeta": meta }),
        }
    }

    /// Payloads in the shape the transaction engine publishes them, with the
    /// extra fields it carries that this crate does not model.
    fn engine_payload(event: LifecycleEvent) -> Value {
        let meta = |status: &str| {
            json!({
                "id": "tx-9",
                "chainId": "0x1",
                "networkClientId": "mainnet",
                "status": status,
                "type": "simpleSend",
                "time": 1730000000000u64,
                "origin": "metamask",
                "txParams": {
                    "from": "0xc4955c0d639d99699bfd7ec54d9fafee40e4d272",
                    "to": "0x0000000000000000000000000000000000000001",
                    "value": "0x0",
                    "gas": "0x5208",
                    "type": "0x2"
                },
                "defaultGasEstimates": { "gas": "0x5208", "estimateType": "medium" },
                "userEditedGasLimit": false
            })
        };
        match event {
            LifecycleEvent::Added => meta("unapproved"),
            LifecycleEvent::Approved => json!({ "transactionMeta": meta("approved") }),
            LifecycleEvent::Submitted => {
                let mut tx = meta("submitted");
                tx["hash"] = json!("0xfeed");
                tx["submittedTime"] = json!(1730000001000u64);
                json!({ "transactionMeta": tx })
            }
            LifecycleEvent::Confirmed => {
                let mut tx = meta("confirmed");
                tx["hash"] = json!("0xfeed");
                tx["txReceipt"] = json!({ "status": "0x1", "gasUsed": "0x5208" });
                tx
            }
            LifecycleEvent::Failed => {
                let mut tx = meta("failed");
                tx["error"] = json!({ "message": "nonce too low", "name": "Error" });
                json!({ "transactionMeta": tx, "error": "nonce too low" })
            }
            LifecycleEvent::Dropped => json!({ "transactionMeta": meta("dropped") }),
            LifecycleEvent::Rejected => {
                let mut tx = meta("rejected");
                tx["error"] = json!({ "message": "User rejected the request.", "code": 4001 });
                json!({ "transactionMeta": tx, "actionId": "abc" })
            }
        }
    }

    #[test]
    fn engine_shaped_payloads_reach_their_handlers() {
        let bus = LocalBus::new();
        let calls = Calls::default();
        let _router = attach(&bus, &calls);

        for event in LifecycleEvent::ALL {
            assert_eq!(bus.publish(event.bus_name(), engine_payload(event)).unwrap(), 1);
        }

        let calls = calls.lock().unwrap();
        let events: Vec<_> = calls.iter().map(|(event, _)| *event).collect();
        assert_eq!(events, LifecycleEvent::ALL.to_vec());
        assert!(calls.iter().all(|(_, meta)| meta.id == "tx-9"));

        let (_, failed) = &calls[4];
        assert_eq!(failed.status, TransactionStatus::Failed);
        assert_eq!(failed.error_message(), Some("nonce too low"));
        let (_, confirmed) = &calls[2];
        assert_eq!(confirmed.hash.as_deref(), Some("0xfeed"));
    }

    #[test]
    fn failed_and_cancelled_transactions_land_in_history() {
        let bus = LocalBus::new();
        let recorder = LifecycleRecorder::default();
        let _router = LifecycleEventRouter::attach(
            Arc::new(bus.clone()),
            recorder.handlers(),
            HandlerContext::new(Arc::new(SharedState::default())),
        );

        let failed = json!({
            "transactionMeta": {
                "id": "1",
                "status": "failed",
                "chainId": "0x1",
                "error": { "message": "nonce too low", "name": "Error" }
            },
            "error": "nonce too low"
        });
        let cancelled = json!({
            "transactionMeta": { "id": "2", "status": "cancelled", "chainId": "0x1" }
        });
        bus.publish(LifecycleEvent::Failed.bus_name(), failed).unwrap();
        bus.publish(LifecycleEvent::Dropped.bus_name(), cancelled).unwrap();

        let history = recorder.history().entries();
        let ids: Vec<_> = history.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(history[0].status, TransactionStatus::Failed);
        assert_eq!(history[1].status, TransactionStatus::Dropped);
    }

    #[test]
    fn registers_exactly_seven_subscriptions() {
        let bus = LocalBus::new();
        let calls = Calls::default();
        let router = attach(&bus, &calls);

        assert_eq!(router.subscription_count(), 7);
        assert_eq!(bus.total_subscriptions(), 7);
        for event in LifecycleEvent::ALL {
            assert_eq!(bus.subscriber_count(event.bus_name()), 1);
        }
    }

    #[test]
    fn each_event_reaches_one_handler_with_bare_meta() {
        let bus = LocalBus::new();
        let calls = Calls::default();
        let _router = attach(&bus, &calls);

        for event in LifecycleEvent::ALL {
            assert_eq!(bus.publish(event.bus_name(), payload_for(event)).unwrap(), 1);
        }

        let calls = calls.lock().unwrap();
        let events: Vec<_> = calls.iter().map(|(event, _)| *event).collect();
        assert_eq!(events, LifecycleEvent::ALL.to_vec());
        assert!(calls.iter().all(|(_, received)| *received == meta()));
    }

    #[test]
    fn wrong_payload_shape_is_rejected() {
        let bus = LocalBus::new();
        let calls = Calls::default();
        let _router = attach(&bus, &calls);

        let bare = serde_json::to_value(meta()).unwrap();
        let err = bus
            .publish(LifecycleEvent::Approved.bus_name(), bare)
            .unwrap_err();
        assert!(matches!(err, RouterError::Payload(_)));

        let wrapped = json!({ "transactionMeta": meta() });
        assert!(bus
            .publish(LifecycleEvent::Confirmed.bus_name(), wrapped)
            .is_err());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn handler_errors_propagate_to_the_bus() {
        let bus = LocalBus::new();
        let failing: Arc<dyn TransactionEventHandler> =
            Arc::new(|_: &TransactionMeta, _: &HandlerContext| -> Result<(), RouterError> {
                Err(RouterError::Handler("metrics lookup failed".into()))
            });
        let context = HandlerContext::new(Arc::new(SharedState::default()));
        let _router = LifecycleEventRouter::attach(
            Arc::new(bus.clone()),
            HandlerTable::from_fn(|_| failing.clone()),
            context,
        );

        assert_eq!(
            bus.publish(
                LifecycleEvent::Submitted.bus_name(),
                payload_for(LifecycleEvent::Submitted)
            ),
            Err(RouterError::Handler("metrics lookup failed".into()))
        );
    }

    #[test]
    fn dispose_unsubscribes_everything() {
        let bus = LocalBus::new();
        let calls = Calls::default();
        let mut router = attach(&bus, &calls);
        router.dispose();

        assert_eq!(router.subscription_count(), 0);
        assert_eq!(bus.total_subscriptions(), 0);
        assert_eq!(
            bus.publish(LifecycleEvent::Added.bus_name(), payload_for(LifecycleEvent::Added))
                .unwrap(),
            0
        );

        let replacement = attach(&bus, &calls);
        drop(replacement);
        assert_eq!(bus.total_subscriptions(), 0);
    }

    #[test]
    fn is_attached_tracks_live_router() {
        let bus = LocalBus::new();
        let calls = Calls::default();
        assert!(!LifecycleEventRouter::is_attached(&bus));

        let mut router = attach(&bus, &calls);
        assert!(LifecycleEventRouter::is_attached(&bus));

        router.dispose();
        assert!(!LifecycleEventRouter::is_attached(&bus));
    }
}
