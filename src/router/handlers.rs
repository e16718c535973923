// Lifecycle handler table and the stock recorder
//
// Each lifecycle event maps to exactly one handler. The context gives
// handlers lazy access to confirmation metric properties.
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use crate::metrics::LIFECYCLE_EVENTS;
use crate::router::events::LifecycleEvent;
use crate::state::{StateReader, TransactionMetricProperties};
use crate::transaction::{ChainId, TransactionMeta, TransactionStatus};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

pub trait TransactionEventHandler: Send + Sync {
    fn handle(&self, meta: &TransactionMeta, context: &HandlerContext) -> Result<(), RouterError>;
}

impl<F> TransactionEventHandler for F
where
    F: Fn(&TransactionMeta, &HandlerContext) -> Result<(), RouterError> + Send + Sync,
{
    fn handle(&self, meta: &TransactionMeta, context: &HandlerContext) -> Result<(), RouterError> {
        self(meta, context)
    }
}

/// Capabilities passed to every handler call.
#[derive(Clone)]
pub struct HandlerContext {
    state: Arc<dyn StateReader>,
}

impl HandlerContext {
    pub fn new(state: Arc<dyn StateReader>) -> Self {
        Self { state }
    }

    /// Metric properties recorded for `transaction_id`, read at call time.
    pub fn transaction_metric_properties(
        &self,
        transaction_id: &str,
    ) -> Option<TransactionMetricProperties> {
        self.state
            .snapshot()
            .confirmation_metrics
            .remove(transaction_id)
    }
}

pub type SharedHandler = Arc<dyn TransactionEventHandler>;

/// One handler per lifecycle event.
#[derive(Clone)]
pub struct HandlerTable {
    pub added: SharedHandler,
    pub approved: SharedHandler,
    pub confirmed: SharedHandler,
    pub dropped: SharedHandler,
    pub failed: SharedHandler,
    pub rejected: SharedHandler,
    pub submitted: SharedHandler,
}

impl HandlerTable {
    /// Build the table by asking `make` for each event's handler.
    pub fn from_fn(mut make: impl FnMut(LifecycleEvent) -> SharedHandler) -> Self {
        Self {
            added: make(LifecycleEvent::Added),
            approved: make(LifecycleEvent::Approved),
            confirmed: make(LifecycleEvent::Confirmed),
            dropped: make(LifecycleEvent::Dropped),
            failed: make(LifecycleEvent::Failed),
            rejected: make(LifecycleEvent::Rejected),
            submitted: make(LifecycleEvent::Submitted),
        }
    }

    pub fn handler_for(&self, event: LifecycleEvent) -> &dyn TransactionEventHandler {
        let handler = match event {
            LifecycleEvent::Added => &self.added,
            LifecycleEvent::Approved => &self.approved,
            LifecycleEvent::Confirmed => &self.confirmed,
            LifecycleEvent::Dropped => &self.dropped,
            LifecycleEvent::Failed => &self.failed,
            LifecycleEvent::Rejected => &self.rejected,
            LifecycleEvent::Submitted => &self.submitted,
        };
        handler.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub chain_id: Option<ChainId>,
    pub status: TransactionStatus,
    pub hash: Option<String>,
}

/// Terminal transactions in the order their final event arrived.
#[derive(Clone, Default)]
pub struct TransactionHistory {
    entries: Arc<RwLock<Vec<HistoryEntry>>>,
}

impl TransactionHistory {
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn push(&self, entry: HistoryEntry) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }
}

/// Stock handlers: count every event, log it, and move terminal
/// transactions into history.
#[derive(Clone, Default)]
pub struct LifecycleRecorder {
    history: TransactionHistory,
}

impl LifecycleRecorder {
    pub fn new(history: TransactionHistory) -> Self {
        Self { history }
    }

    pub fn history(&self) -> &TransactionHistory {
        &self.history
    }

    pub fn handlers(&self) -> HandlerTable {
        HandlerTable::from_fn(|event| {
            Arc::new(RecordEvent {
                event,
                history: self.history.clone(),
            })
        })
    }
}

struct RecordEvent {
    event: LifecycleEvent,
    history: TransactionHistory,
}

impl TransactionEventHandler for RecordEvent {
    fn handle(&self, meta: &TransactionMeta, context: &HandlerContext) -> Result<(), RouterError> {
        LIFECYCLE_EVENTS.with_label_values(&[self.event.label()]).inc();

        let properties = context.transaction_metric_properties(&meta.id);
        let property_count = properties.as_ref().map_or(0, |p| p.properties.len());

        match self.event {
            LifecycleEvent::Confirmed => info!(
                id = %meta.id,
                hash = ?meta.hash,
                properties = property_count,
                "transaction confirmed"
            ),
            LifecycleEvent::Failed | LifecycleEvent::Dropped => warn!(
                id = %meta.id,
                event = self.event.label(),
                error = meta.error_message().unwrap_or("unknown"),
                properties = property_count,
                "transaction did not land"
            ),
            _ => debug!(
                id = %meta.id,
                event = self.event.label(),
                properties = property_count,
                "transaction lifecycle event"
            ),
        }

        if let Some(status) = self.event.terminal_status() {
            self.history.push(HistoryEntry {
                id: meta.id.clone(),
                chain_id: meta.chain_id.clone(),
                status,
                hash: meta.hash.clone(),
            });
        }
        Ok(())
    }
}
