// Router module - publish-time routing and lifecycle event plumbing
// This file wires the submission router that picks relay or default path
// and the event router that fans engine events out to handlers
//
// Numan Thabit 2025 Nov

pub mod events;
pub mod handlers;
pub mod submission;

pub use events::{LifecycleEvent, LifecycleEventRouter, TransactionEvent};
pub use handlers::{HandlerContext, HandlerTable, LifecycleRecorder, TransactionEventHandler};
pub use submission::{PublishHook, PublishOutcome, SubmissionRouter};
