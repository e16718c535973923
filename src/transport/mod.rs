// Transport module - outbound clients
//
// Numan Thabit 2025 Nov

pub mod relay_http;

pub use relay_http::HttpRelayClient;
