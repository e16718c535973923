// Error types and error handling module
// This file defines the error type shared by the routing decision,
// the relay transport and the lifecycle event router
//
// Numan Thabit 2025 Nov

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("build tx error: {0}")]
    BuildTx(String),
    #[error("relay error: {0}")]
    Relay(String),
    #[error("{0}")]
    ControllerNotFound(String),
    #[error("{0}")]
    Construction(String),
    #[error("handler error: {0}")]
    Handler(String),
    #[error("payload error: {0}")]
    Payload(String),
}

pub type Result<T, E = RouterError> = std::result::Result<T, E>;
