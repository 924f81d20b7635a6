//! Adapters for the application's outbound ports.

mod reqwest_transport;

pub use reqwest_transport::{DEFAULT_API_URL, DEFAULT_TIMEOUT, ReqwestTransport};
