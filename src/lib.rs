// Library root module for stx-router
// This file defines the public API and module structure: the smart transaction
// routing decision, the publish hook and the lifecycle event router
//
// Numan Thabit 2025 Nov

pub mod bootstrap;
pub mod bus;
pub mod config;
pub mod eligibility;
pub mod errors;
pub mod flags;
pub mod metrics;
pub mod relay;
pub mod router;
pub mod state;
pub mod transaction;
pub mod transport;
