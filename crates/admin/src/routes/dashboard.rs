//! Dashboard route handler.

use askama::Template;
use axum::{Router, extract::State, response::Response, routing::get};
use tracing::instrument;

use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

use super::orders::OrderRowView;
use super::{Layout, render};

/// A headline figure.
#[derive(Debug, Clone)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    pub href: &'static str,
}

/// Dashboard page template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub stats: Vec<StatCard>,
    pub recent_orders: Vec<OrderRowView>,
    pub loaded: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

/// Dashboard page handler.
#[instrument(skip(admin, state))]
async fn dashboard(RequireAdminAuth(admin): RequireAdminAuth, State(state): State<AppState>) -> Response {
    let metrics = state.reports().dashboard().await.ok();
    let loaded = metrics.is_some();
    let metrics = metrics.unwrap_or_default();

    let template = DashboardTemplate {
        layout: Layout::new(&state, &admin, "/"),
        stats: vec![
            StatCard {
                label: "Total Customers",
                value: metrics.customers.to_string(),
                href: "/customers",
            },
            StatCard {
                label: "Total Products",
                value: metrics.products.to_string(),
                href: "/products",
            },
            StatCard {
                label: "Total Orders",
                value: metrics.orders.to_string(),
                href: "/orders",
            },
            StatCard {
                label: "Revenue",
                value: metrics.revenue.to_string(),
                href: "/reports",
            },
        ],
        recent_orders: metrics.recent_orders.iter().map(OrderRowView::from).collect(),
        loaded,
    };
    render(&template)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use neonflake_core::OrderStatus;
    use testresult::TestResult;

    use super::super::test_helpers::{Mocks, body_text, get, location, resolve, router, send, signed_in_app};
    use crate::backend::BackendError;
    use crate::db::RepositoryError;
    use crate::models::tests::order;

    #[tokio::test]
    async fn test_dashboard_shows_counts_and_revenue() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.customers.expect_count().returning(|| Ok(12));
        mocks.products.expect_count().returning(|| Ok(7));
        mocks.orders.expect_list().returning(|_| {
            Ok(vec![
                order("1003", 1000, OrderStatus::New, 3),
                order("1002", 500, OrderStatus::Cancelled, 2),
                order("1001", 2499, OrderStatus::Delivered, 1),
            ])
        });
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let response = send(&app, get("/", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Total Customers"));
        assert!(body.contains(">12<"));
        assert!(body.contains("₹3,499"));
        assert!(body.contains("#1003"));
        Ok(())
    }

    #[tokio::test]
    async fn test_dashboard_survives_backend_failure() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.customers.expect_count().returning(|| {
            Err(RepositoryError::Backend(BackendError::Parse("down".into())))
        });
        mocks.products.expect_count().returning(|| Ok(0));
        mocks.orders.expect_list().returning(|_| Ok(Vec::new()));
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let response = send(&app, get("/", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Failed to load dashboard data"));
        Ok(())
    }

    #[tokio::test]
    async fn test_dashboard_requires_login() {
        let state = Mocks::default().state();
        resolve(&state, None);
        let app = router(state);

        let response = send(&app, get("/", None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/login"));
    }

    #[tokio::test]
    async fn test_loading_page_until_session_resolved() {
        let app = router(Mocks::default().state());
        let response = send(&app, get("/", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Loading"));
    }
}
