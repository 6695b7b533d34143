//! Dashboard metrics and range reports, computed over fetched rows.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, NaiveTime, TimeZone, Utc};
use neonflake_core::Price;
use neonflake_core::time::ist;
use serde::Deserialize;

use super::notifications::Notifier;
use crate::db::{CustomerRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::models::{Customer, Order};

/// Orders shown in the dashboard's recent list.
pub const RECENT_ORDERS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportRange {
    #[default]
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
}

impl ReportRange {
    pub const ALL: [Self; 4] = [Self::Today, Self::Yesterday, Self::ThisWeek, Self::ThisMonth];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::ThisWeek => "this_week",
            Self::ThisMonth => "this_month",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::ThisWeek => "This Week",
            Self::ThisMonth => "This Month",
        }
    }

    /// Half-open `[start, end)` interval in UTC for this range as of `now`.
    ///
    /// Days start at IST midnight and weeks start on Monday.
    #[must_use]
    pub fn bounds(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let tz = ist();
        let today = now.with_timezone(&tz).date_naive();
        let midnight = |date: chrono::NaiveDate| {
            tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
                .single()
                .map_or(now, |dt| dt.with_timezone(&Utc))
        };
        let start_of_today = midnight(today);

        match self {
            Self::Today => (start_of_today, now),
            Self::Yesterday => {
                let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
                (midnight(yesterday), start_of_today)
            }
            Self::ThisWeek => {
                let offset = u64::from(today.weekday().num_days_from_monday());
                let monday = today.checked_sub_days(Days::new(offset)).unwrap_or(today);
                (midnight(monday), now)
            }
            Self::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                (midnight(first), now)
            }
        }
    }
}

/// Figures for one [`ReportRange`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeSummary {
    pub orders: usize,
    pub revenue: Price,
    pub new_customers: usize,
}

/// Count orders, sum revenue, and count new customers within `range`.
#[must_use]
pub fn summarize(orders: &[Order], customers: &[Customer], range: ReportRange, now: DateTime<Utc>) -> RangeSummary {
    let (start, end) = range.bounds(now);
    let within = |at: &DateTime<Utc>| *at >= start && *at < end;

    let in_range: Vec<&Order> = orders.iter().filter(|o| within(&o.created_at)).collect();
    RangeSummary {
        orders: in_range.len(),
        revenue: revenue(in_range.into_iter()),
        new_customers: customers.iter().filter(|c| within(&c.created_at)).count(),
    }
}

/// Sum of amounts of orders that count towards revenue.
pub fn revenue<'a>(orders: impl Iterator<Item = &'a Order>) -> Price {
    orders
        .filter(|o| o.status.counts_towards_revenue())
        .map(|o| o.amount)
        .sum()
}

/// Dashboard landing page figures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardMetrics {
    pub customers: u64,
    pub products: u64,
    pub orders: usize,
    pub revenue: Price,
    pub recent_orders: Vec<Order>,
}

/// Loads dashboard and report figures.
#[derive(Clone)]
pub struct ReportService {
    customers: Arc<dyn CustomerRepository>,
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
    notifier: Notifier,
}

impl ReportService {
    #[must_use]
    pub fn new(
        customers: Arc<dyn CustomerRepository>,
        products: Arc<dyn ProductRepository>,
        orders: Arc<dyn OrderRepository>,
        notifier: Notifier,
    ) -> Self {
        Self {
            customers,
            products,
            orders,
            notifier,
        }
    }

    /// Counts, revenue, and the most recent orders.
    ///
    /// # Errors
    ///
    /// Returns the first repository error after notifying.
    pub async fn dashboard(&self) -> Result<DashboardMetrics, RepositoryError> {
        let result = tokio::try_join!(
            self.customers.count(),
            self.products.count(),
            self.orders.list(None),
        );
        match result {
            Ok((customers, products, orders)) => Ok(DashboardMetrics {
                customers,
                products,
                orders: orders.len(),
                revenue: revenue(orders.iter()),
                recent_orders: orders.into_iter().take(RECENT_ORDERS).collect(),
            }),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load dashboard");
                self.notifier.error("Failed to load dashboard data");
                Err(e)
            }
        }
    }

    /// Figures for `range` as of `now`.
    ///
    /// # Errors
    ///
    /// Returns the first repository error after notifying.
    pub async fn report(&self, range: ReportRange, now: DateTime<Utc>) -> Result<RangeSummary, RepositoryError> {
        let result = tokio::try_join!(self.orders.list(None), self.customers.list_with_orders());
        match result {
            Ok((orders, customers)) => Ok(summarize(&orders, &customers, range, now)),
            Err(e) => {
                tracing::error!(range = range.as_str(), error = %e, "Failed to load report");
                self.notifier.error("Failed to load report");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService").finish_non_exhaustive()
    }
}
