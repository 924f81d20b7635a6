//! Resource cache stores.
//!
//! Client-held copies of backend-owned collections, kept consistent under
//! optimistic mutation, partial failure and re-fetch.

mod analytics;
mod optimistic;
mod state;
mod store;

pub use analytics::AnalyticsStore;
pub use optimistic::mutate_or_refresh;
pub use state::{AnalyticsState, ResourceState};
pub use store::ResourceStore;
