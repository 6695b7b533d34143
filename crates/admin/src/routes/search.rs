//! Global search over orders, products, and customers.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::services::SearchResult;
use crate::state::AppState;

use super::{Layout, render};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub layout: Layout,
    pub query: String,
    pub results: Vec<SearchResult>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search_page))
        .route("/api/search", get(search_json))
}

/// GET /search
#[instrument(skip(admin, state))]
async fn search_page(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let results = state.search().search(&query.q).await;
    render(&SearchTemplate {
        layout: Layout::new(&state, &admin, "/search"),
        query: query.q,
        results,
    })
}

/// GET /api/search
#[instrument(skip(_admin, state))]
async fn search_json(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<SearchResult>> {
    Json(state.search().search(&query.q).await)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use neonflake_core::{OrderStatus, ProductCategory};
    use testresult::TestResult;

    use super::super::test_helpers::{Mocks, body_text, get, send, signed_in_app};
    use crate::models::tests::{customer, order, product};

    fn searching(mocks: &mut Mocks) {
        mocks
            .orders
            .expect_search()
            .returning(|_, _| Ok(vec![order("1001", 2500, OrderStatus::New, 1)]));
        mocks
            .products
            .expect_search()
            .returning(|_, _| Ok(vec![product("p-1", "Kurta", ProductCategory::Clothing, 1499, 1)]));
        mocks
            .customers
            .expect_search()
            .returning(|_, _| Ok(vec![customer("c-1", "Kiran", "Rao", "kiran@example.in")]));
    }

    #[tokio::test]
    async fn test_json_results_are_grouped_in_order() -> TestResult {
        let mut mocks = Mocks::signed_in();
        searching(&mut mocks);
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let response = send(&app, get("/api/search?q=k", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await)?;
        let kinds: Vec<&str> = json
            .as_array()
            .map(|results| results.iter().filter_map(|r| r["kind"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(kinds, vec!["order", "product", "customer"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_query_renders_empty_page() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.orders.expect_search().never();
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let body = body_text(send(&app, get("/search?q=+", Some(&cookie))).await).await;
        assert!(body.contains("Type to search"));
        Ok(())
    }

    #[tokio::test]
    async fn test_page_links_to_results() -> TestResult {
        let mut mocks = Mocks::signed_in();
        searching(&mut mocks);
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let body = body_text(send(&app, get("/search?q=k", Some(&cookie))).await).await;
        assert!(body.contains("Kiran Rao"));
        assert!(body.contains("/customers/c-1"));
        Ok(())
    }
}
