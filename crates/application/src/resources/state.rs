//! Observable store state.

use tokio::sync::watch;

use artdesk_domain::{DashboardSnapshot, ResourceCollection, ResourceRecord};

/// State of a resource cache store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceState {
    /// The cached collection.
    pub collection: ResourceCollection,
    /// The record loaded by the last single fetch.
    pub current: Option<ResourceRecord>,
    /// Message of the last failed operation.
    pub error: Option<String>,
    in_flight: usize,
}

impl ResourceState {
    /// Whether any operation is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Drops all cached data, keeping the in-flight count.
    pub(crate) fn reset(&mut self) {
        *self = Self {
            in_flight: self.in_flight,
            ..Self::default()
        };
    }
}

/// State of the analytics store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalyticsState {
    /// Last successfully fetched snapshot.
    pub snapshot: Option<DashboardSnapshot>,
    /// Message of the last failed fetch.
    pub error: Option<String>,
    in_flight: usize,
}

impl AnalyticsState {
    /// Whether a fetch is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub(crate) fn reset(&mut self) {
        *self = Self {
            in_flight: self.in_flight,
            ..Self::default()
        };
    }
}

/// States that count in-flight operations.
pub(crate) trait Tracked {
    fn in_flight_mut(&mut self) -> &mut usize;
    fn error_mut(&mut self) -> &mut Option<String>;
}

impl Tracked for ResourceState {
    fn in_flight_mut(&mut self) -> &mut usize {
        &mut self.in_flight
    }

    fn error_mut(&mut self) -> &mut Option<String> {
        &mut self.error
    }
}

impl Tracked for AnalyticsState {
    fn in_flight_mut(&mut self) -> &mut usize {
        &mut self.in_flight
    }

    fn error_mut(&mut self) -> &mut Option<String> {
        &mut self.error
    }
}

/// Marks an operation in flight until dropped.
///
/// Starting an operation clears the previous error.
pub(crate) struct InFlight<'a, S: Tracked> {
    state: &'a watch::Sender<S>,
}

impl<'a, S: Tracked> InFlight<'a, S> {
    pub(crate) fn start(state: &'a watch::Sender<S>) -> Self {
        state.send_modify(|s| {
            *s.in_flight_mut() += 1;
            *s.error_mut() = None;
        });
        Self { state }
    }
}

impl<S: Tracked> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            let count = s.in_flight_mut();
            *count = count.saturating_sub(1);
        });
    }
}
