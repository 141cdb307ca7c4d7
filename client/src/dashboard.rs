//! Dashboard aggregator.
//!
//! DESIGN
//! ======
//! A dashboard is a fixed set of independent metric queries sharing one
//! filter. [`DashboardAggregator::load_with`] fires all of them at once and
//! folds each state into a [`DashboardSnapshot`] as it settles, handing every
//! intermediate snapshot to the caller. Results are cached per
//! `(metric, filter)` for a configurable time-to-live.
//!
//! Metric bodies are read raw. A `{ "data": ... }` envelope is stripped only
//! when `data` is its sole key, so chart payloads like `{ labels, data }`
//! survive intact.
//!
//! ERROR HANDLING
//! ==============
//! Queries fail independently. A failed query is reported by the gateway,
//! recorded in the snapshot, and never cached, so the next load asks again.
//! Nothing is retried within a load.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use serde_json::Value;
use time::Date;
use time::format_description::StaticFormatDescription;
use time::macros::format_description;
use tracing::{debug, info};

use crate::error::{ClientError, FieldErrors};
use crate::net::gateway::ApiClient;
use crate::net::transport::{ApiRequest, Method};

const DATE_FORMAT: StaticFormatDescription = format_description!("[year]-[month]-[day]");

// =============================================================================
// METRICS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardMetric {
    Summary,
    RequisitionStatus,
    RequisitionTrend,
    MachineStatus,
    MachineUtilization,
    MaintenanceDue,
    InventoryValue,
    LowStock,
    TopConsumedItems,
    SiteActivity,
}

impl DashboardMetric {
    pub const ALL: [Self; 10] = [
        Self::Summary,
        Self::RequisitionStatus,
        Self::RequisitionTrend,
        Self::MachineStatus,
        Self::MachineUtilization,
        Self::MaintenanceDue,
        Self::InventoryValue,
        Self::LowStock,
        Self::TopConsumedItems,
        Self::SiteActivity,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::RequisitionStatus => "requisition-status",
            Self::RequisitionTrend => "requisition-trend",
            Self::MachineStatus => "machine-status",
            Self::MachineUtilization => "machine-utilization",
            Self::MaintenanceDue => "maintenance-due",
            Self::InventoryValue => "inventory-value",
            Self::LowStock => "low-stock",
            Self::TopConsumedItems => "top-consumed-items",
            Self::SiteActivity => "site-activity",
        }
    }

    #[must_use]
    pub fn path(self) -> String {
        format!("/dashboard/{}", self.name())
    }
}

impl fmt::Display for DashboardMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// FILTER
// =============================================================================

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`ClientError::Validation`] keyed by `field` when `raw` is not a
/// calendar date in that format.
pub fn parse_date(field: &str, raw: &str) -> Result<Date, ClientError> {
    Date::parse(raw.trim(), DATE_FORMAT)
        .map_err(|_| ClientError::Validation(FieldErrors::single(field, "Expected a date as YYYY-MM-DD")))
}

fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DashboardFilter {
    site_id: Option<String>,
    start_date: Date,
    end_date: Date,
}

impl DashboardFilter {
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] when `start_date` is after
    /// `end_date`.
    pub fn new(site_id: Option<String>, start_date: Date, end_date: Date) -> Result<Self, ClientError> {
        if start_date > end_date {
            return Err(ClientError::Validation(FieldErrors::single(
                "dateRange",
                "Start date must not be after end date",
            )));
        }
        let site_id = site_id.filter(|id| !id.trim().is_empty());
        Ok(Self { site_id, start_date, end_date })
    }

    /// The `days`-long window ending on `end_date`, inclusive.
    ///
    /// # Errors
    ///
    /// As [`Self::new`]; a window that would start before the earliest
    /// representable date is clamped to it.
    pub fn last_days(site_id: Option<String>, end_date: Date, days: u16) -> Result<Self, ClientError> {
        let span = time::Duration::days(i64::from(days.saturating_sub(1)));
        Self::new(site_id, end_date.saturating_sub(span), end_date)
    }

    #[must_use]
    pub fn site_id(&self) -> Option<&str> {
        self.site_id.as_deref()
    }

    #[must_use]
    pub fn start_date(&self) -> Date {
        self.start_date
    }

    #[must_use]
    pub fn end_date(&self) -> Date {
        self.end_date
    }

    /// Query string pairs in wire order; `siteId` is left out when unset.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(site_id) = &self.site_id {
            pairs.push(("siteId".to_owned(), site_id.clone()));
        }
        pairs.push(("dateRange[startDate]".to_owned(), format_date(self.start_date)));
        pairs.push(("dateRange[endDate]".to_owned(), format_date(self.end_date)));
        pairs
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QueryKey {
    metric: DashboardMetric,
    filter: DashboardFilter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    Pending,
    Ready(Value),
    Failed(String),
}

/// Per-metric query states for one filter, in [`DashboardMetric::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub filter: DashboardFilter,
    pub queries: Vec<(DashboardMetric, QueryState)>,
}

impl DashboardSnapshot {
    /// Every metric pending, as a view shows before the first load settles.
    #[must_use]
    pub fn pending(filter: DashboardFilter) -> Self {
        let queries = DashboardMetric::ALL
            .into_iter()
            .map(|metric| (metric, QueryState::Pending))
            .collect();
        Self { filter, queries }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.queries.iter().any(|(_, state)| matches!(state, QueryState::Pending))
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.queries.iter().any(|(_, state)| matches!(state, QueryState::Failed(_)))
    }

    #[must_use]
    pub fn errors(&self) -> Vec<(DashboardMetric, &str)> {
        self.queries
            .iter()
            .filter_map(|(metric, state)| match state {
                QueryState::Failed(message) => Some((*metric, message.as_str())),
                _ => None,
            })
            .collect()
    }

    fn settle(&mut self, metric: DashboardMetric, state: QueryState) {
        if let Some((_, slot)) = self.queries.iter_mut().find(|(m, _)| *m == metric) {
            *slot = state;
        }
    }

    #[must_use]
    pub fn get(&self, metric: DashboardMetric) -> Option<&Value> {
        self.queries.iter().find_map(|(m, state)| match state {
            QueryState::Ready(value) if *m == metric => Some(value),
            _ => None,
        })
    }
}

// =============================================================================
// AGGREGATOR
// =============================================================================

pub struct DashboardAggregator {
    api: ApiClient,
    ttl: Duration,
    cache: Mutex<HashMap<QueryKey, (Instant, Value)>>,
}

impl DashboardAggregator {
    pub fn new(api: ApiClient, ttl: Duration) -> Self {
        Self { api, ttl, cache: Mutex::new(HashMap::new()) }
    }

    /// Fetch every metric for `filter` concurrently and return the settled
    /// snapshot.
    pub async fn load(&self, filter: &DashboardFilter) -> DashboardSnapshot {
        self.load_with(filter, |_| {}).await
    }

    /// As [`Self::load`], calling `on_update` with the all-pending snapshot
    /// first and again each time one metric settles.
    pub async fn load_with(
        &self,
        filter: &DashboardFilter,
        mut on_update: impl FnMut(&DashboardSnapshot),
    ) -> DashboardSnapshot {
        let mut snapshot = DashboardSnapshot::pending(filter.clone());
        on_update(&snapshot);

        let mut settled = stream::iter(DashboardMetric::ALL)
            .map(|metric| self.query(metric, filter))
            .buffer_unordered(DashboardMetric::ALL.len());
        while let Some((metric, state)) = settled.next().await {
            snapshot.settle(metric, state);
            on_update(&snapshot);
        }

        info!(
            site_id = filter.site_id().unwrap_or("all"),
            failed = snapshot.errors().len(),
            "dashboard loaded"
        );
        snapshot
    }

    /// Drop every cached result.
    pub fn invalidate(&self) {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();
    }

    async fn query(&self, metric: DashboardMetric, filter: &DashboardFilter) -> (DashboardMetric, QueryState) {
        let key = QueryKey { metric, filter: filter.clone() };
        if let Some(value) = self.cached(&key) {
            debug!(%metric, "dashboard cache hit");
            return (metric, QueryState::Ready(value));
        }

        let request = ApiRequest::new(Method::Get, metric.path()).with_query(filter.query_pairs());
        match self.api.execute(request).await {
            Ok(value) => {
                let value = unwrap_data(value);
                self.cache
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .insert(key, (Instant::now(), value.clone()));
                (metric, QueryState::Ready(value))
            }
            Err(e) => (metric, QueryState::Failed(e.to_string())),
        }
    }

    fn cached(&self, key: &QueryKey) -> Option<Value> {
        let mut cache = self.cache.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match cache.get(key) {
            Some((stored, value)) if stored.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                cache.remove(key);
                None
            }
            None => None,
        }
    }
}

/// Metric payloads may arrive wrapped as `{ "data": ... }`.
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
