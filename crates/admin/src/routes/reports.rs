//! Range reports.

use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::services::ReportRange;
use crate::state::AppState;

use super::{Layout, render};

/// A range tab.
#[derive(Debug, Clone)]
pub struct RangeTab {
    pub label: &'static str,
    pub href: String,
    pub current: bool,
}

#[derive(Template)]
#[template(path = "reports.html")]
pub struct ReportsTemplate {
    pub layout: Layout,
    pub ranges: Vec<RangeTab>,
    pub range_label: &'static str,
    pub orders: usize,
    pub revenue: String,
    pub new_customers: usize,
    pub loaded: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub range: Option<String>,
}

impl ReportQuery {
    fn range(&self) -> ReportRange {
        self.range
            .as_deref()
            .and_then(|r| ReportRange::ALL.into_iter().find(|range| range.as_str() == r))
            .unwrap_or_default()
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/reports", get(reports))
}

/// GET /reports
#[instrument(skip(admin, state))]
async fn reports(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Response {
    let range = query.range();
    let summary = state.reports().report(range, Utc::now()).await.ok();

    let template = ReportsTemplate {
        layout: Layout::new(&state, &admin, "/reports"),
        ranges: ReportRange::ALL
            .into_iter()
            .map(|r| RangeTab {
                label: r.label(),
                href: format!("/reports?range={}", r.as_str()),
                current: r == range,
            })
            .collect(),
        range_label: range.label(),
        orders: summary.map_or(0, |s| s.orders),
        revenue: summary.unwrap_or_default().revenue.to_string(),
        new_customers: summary.map_or(0, |s| s.new_customers),
        loaded: summary.is_some(),
    };
    render(&template)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use neonflake_core::OrderStatus;
    use testresult::TestResult;

    use super::super::test_helpers::{Mocks, body_text, get, send, signed_in_app};
    use crate::models::tests::order;

    #[tokio::test]
    async fn test_today_counts_orders_placed_today() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.orders.expect_list().returning(|_| {
            let mut today = order("2001", 1500, OrderStatus::New, 1);
            today.created_at = Utc::now() - chrono::Duration::seconds(1);
            Ok(vec![today, order("1001", 999, OrderStatus::New, 1)])
        });
        mocks.customers.expect_list_with_orders().returning(|| Ok(Vec::new()));
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let body = body_text(send(&app, get("/reports?range=today", Some(&cookie))).await).await;
        assert!(body.contains("₹1,500"));
        assert!(body.contains(r#"aria-current="page">Today"#));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_range_falls_back_to_today() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.orders.expect_list().returning(|_| Ok(Vec::new()));
        mocks.customers.expect_list_with_orders().returning(|| Ok(Vec::new()));
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let body = body_text(send(&app, get("/reports?range=fortnight", Some(&cookie))).await).await;
        assert!(body.contains(r#"aria-current="page">Today"#));
        Ok(())
    }
}
