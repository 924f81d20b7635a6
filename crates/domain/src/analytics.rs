//! Dashboard analytics snapshot.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Headline figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    /// Sum of all sales.
    pub total_sales: f64,
    /// Mean sale value.
    pub average_sale_value: f64,
    /// Contacts added in the reporting window.
    pub new_contacts: u64,
}

/// One entry of the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Activity {
    /// Entry identifier (string or number on the wire).
    pub id: Value,
    /// Short icon glyph.
    pub icon: String,
    /// Display text.
    pub text: String,
    /// Relative time label.
    pub time: String,
}

/// The read-only analytics snapshot served by `/analytics/dashboard`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSnapshot {
    /// Headline figures.
    pub stats: DashboardStats,
    /// Sales trend points; opaque to the client.
    #[serde(rename = "trends")]
    pub sales_trend: Vec<Value>,
    /// Recent activity feed.
    #[serde(rename = "recentActivities")]
    pub activities: Vec<Activity>,
}
