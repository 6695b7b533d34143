//! Order list, new-orders queue, status commands, and CSV export.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use neonflake_core::listing::{ListParams, ListState, SortSpec};
use chrono::{DateTime, Utc};
use neonflake_core::{OrderId, OrderStatus, PaymentStatus, Price};
use serde::Deserialize;
use tracing::instrument;

use crate::components::{DataTable, TableColumn};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{CurrentAdmin, Order, OrderSearchField};
use crate::services::OrderCommand;
use crate::state::AppState;

use super::{Layout, csv_download, redirect_back, render};

const COLUMNS: &[TableColumn] = &[
    TableColumn::sortable("id", "Order ID"),
    TableColumn::new("customer", "Customer"),
    TableColumn::sortable("amount", "Amount"),
    TableColumn::sortable("created_at", "Date"),
    TableColumn::new("payment_status", "Payment"),
    TableColumn::new("status", "Status"),
    TableColumn::new("actions", "Actions"),
];

fn default_sort() -> SortSpec {
    SortSpec::desc("created_at")
}

/// An action button on an order row.
#[derive(Debug, Clone)]
pub struct OrderAction {
    pub href: String,
    pub label: &'static str,
    pub danger: bool,
}

/// Order row for templates.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub amount: Price,
    pub date: DateTime<Utc>,
    pub status: &'static str,
    pub status_label: &'static str,
    pub payment_status: &'static str,
    pub payment_label: &'static str,
    pub actions: Vec<OrderAction>,
}

impl From<&Order> for OrderRowView {
    fn from(order: &Order) -> Self {
        let action = |command: OrderCommand, label, danger| OrderAction {
            href: format!("/orders/{}/{}", order.id, command.as_str()),
            label,
            danger,
        };
        let mut actions = Vec::new();
        if order.status == OrderStatus::New {
            actions.push(action(OrderCommand::Process, "Process", false));
        }
        if order.status == OrderStatus::Processing {
            actions.push(action(OrderCommand::Deliver, "Mark Delivered", false));
        }
        if order.payment_status != PaymentStatus::Paid {
            actions.push(action(OrderCommand::AcceptPayment, "Accept Payment", false));
        }
        if !matches!(order.status, OrderStatus::Cancelled | OrderStatus::Delivered) {
            actions.push(action(OrderCommand::Cancel, "Cancel", true));
        }

        Self {
            id: order.id.to_string(),
            customer_name: order.customer_name.clone(),
            customer_email: order.customer_email.clone(),
            amount: order.amount,
            date: order.created_at,
            status: order.status.as_str(),
            status_label: order.status.label(),
            payment_status: order.payment_status.as_str(),
            payment_label: order.payment_status.label(),
            actions,
        }
    }
}

/// A `<select>` option.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Orders list page template (all orders and the new-orders queue).
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub path: &'static str,
    pub table: DataTable,
    pub orders: Vec<OrderRowView>,
    pub search_fields: Vec<SelectOption>,
    /// `None` on the new-orders page, which has no status filter.
    pub statuses: Option<Vec<SelectOption>>,
    pub export_href: Option<String>,
    pub return_to: String,
}

/// Orders list query: list inputs plus the search field and status filter.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub field: Option<String>,
    pub status: Option<String>,
}

impl OrdersQuery {
    fn search_field(&self) -> OrderSearchField {
        self.field
            .as_deref()
            .and_then(OrderSearchField::parse)
            .unwrap_or_default()
    }

    /// `None` for `all`, missing, or unknown values.
    fn status(&self) -> Option<OrderStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}

#[derive(Debug, Deserialize)]
pub struct CommandForm {
    #[serde(default)]
    pub return_to: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/new", get(new_orders))
        .route("/orders/new/export", get(export_new_orders))
        .route("/orders/{id}/{command}", post(command))
}

/// Current URL of a list page, for redirects back after a command.
fn current_url(path: &str, state: &ListState, query: &OrdersQuery) -> String {
    let params = state.to_params();
    let mut url = url::form_urlencoded::Serializer::new(String::new());
    url.append_pair("field", query.search_field().as_str());
    if let Some(status) = query.status() {
        url.append_pair("status", status.as_str());
    }
    for (key, value) in [
        ("q", params.q),
        ("sort", params.sort),
        ("dir", params.dir),
        ("per_page", params.per_page),
        ("page", params.page),
    ] {
        if let Some(value) = value {
            url.append_pair(key, &value);
        }
    }
    format!("{path}?{}", url.finish())
}

/// Fetch, filter, sort, and page orders for one list page.
async fn list_page(
    state: &AppState,
    admin: &CurrentAdmin,
    query: &OrdersQuery,
    new_only: bool,
) -> OrdersIndexTemplate {
    let (path, title) = if new_only {
        ("/orders/new", "New Orders")
    } else {
        ("/orders", "All Orders")
    };
    let status = if new_only { Some(OrderStatus::New) } else { query.status() };
    let orders = state.orders().list(status).await.unwrap_or_default();

    let field = query.search_field();
    let list_state = ListState::from_params(&query.list, default_sort(), &TableColumn::sortable_keys(COLUMNS));
    let view = list_state.view_by(&orders, |order| vec![field.field_of(order)]);

    let status_param = if new_only {
        ""
    } else {
        status.map_or("", OrderStatus::as_str)
    };
    let extra = [("field", field.as_str()), ("status", status_param)];
    let table = DataTable::new(path, COLUMNS, &list_state, &view, &extra)
        .search_placeholder("Search orders...")
        .empty_state("No orders found");

    let export_href = new_only.then(|| {
        let mut href = format!("{path}/export?field={}", field.as_str());
        if !list_state.query().is_empty() {
            let q: String = url::form_urlencoded::byte_serialize(list_state.query().as_bytes()).collect();
            href.push_str("&q=");
            href.push_str(&q);
        }
        href
    });

    OrdersIndexTemplate {
        layout: Layout::new(state, admin, path),
        title,
        path,
        table,
        orders: view.rows.iter().map(|order| OrderRowView::from(*order)).collect(),
        search_fields: OrderSearchField::ALL
            .iter()
            .map(|f| SelectOption {
                value: f.as_str(),
                label: f.label(),
                selected: *f == field,
            })
            .collect(),
        statuses: (!new_only).then(|| {
            std::iter::once(SelectOption {
                value: "all",
                label: "All Statuses",
                selected: status.is_none(),
            })
            .chain(OrderStatus::ALL.iter().map(|s| SelectOption {
                value: s.as_str(),
                label: s.label(),
                selected: Some(*s) == status,
            }))
            .collect()
        }),
        export_href,
        return_to: current_url(path, &list_state, query),
    }
}

/// GET /orders
#[instrument(skip(admin, state))]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Response {
    render(&list_page(&state, &admin, &query, false).await)
}

/// GET /orders/new
#[instrument(skip(admin, state))]
async fn new_orders(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Response {
    render(&list_page(&state, &admin, &query, true).await)
}

/// CSV of the new orders matching the current search.
///
/// GET /orders/new/export
#[instrument(skip(_admin, state, headers))]
async fn export_new_orders(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Query(query): Query<OrdersQuery>,
) -> Response {
    let Ok(orders) = state.orders().list(Some(OrderStatus::New)).await else {
        return redirect_back(&headers, "/orders/new").into_response();
    };
    let field = query.search_field();
    let list_state = ListState::from_params(&query.list, default_sort(), &TableColumn::sortable_keys(COLUMNS));
    let mut matching =
        neonflake_core::listing::filter_by(&orders, list_state.query(), |order| vec![field.field_of(order)]);
    neonflake_core::listing::sort(&mut matching, list_state.sort_spec());

    match state.export().new_orders(&matching) {
        Some(bytes) => csv_download("new-orders.csv", bytes),
        None => redirect_back(&headers, "/orders/new").into_response(),
    }
}

/// Apply a status command, then go back to the list it came from.
///
/// POST /orders/{id}/{command}
#[instrument(skip(_admin, state, form))]
async fn command(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path((id, command)): Path<(String, String)>,
    Form(form): Form<CommandForm>,
) -> Response {
    let Some(command) = OrderCommand::parse(&command) else {
        return (StatusCode::NOT_FOUND, "Unknown order command").into_response();
    };

    // Outcome is reported through the notifier either way
    let _ = state.orders().execute(command, &OrderId::new(id)).await;

    let target = if form.return_to.starts_with("/orders") && !form.return_to.starts_with("//") {
        form.return_to
    } else {
        "/orders".to_string()
    };
    Redirect::to(&target).into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};
    use neonflake_core::{OrderId, OrderStatus, PaymentStatus};
    use testresult::TestResult;

    use super::super::test_helpers::{Mocks, body_text, get, location, post_form, send, signed_in_app};
    use crate::models::OrderPatch;
    use crate::models::tests::order;

    fn orders() -> Vec<crate::models::Order> {
        let mut rows = vec![
            order("1001", 2499, OrderStatus::New, 1),
            order("1002", 999, OrderStatus::Processing, 2),
            order("1003", 6990, OrderStatus::New, 3),
        ];
        rows[1].customer_name = "Vikram Shah".to_string();
        rows[1].customer_email = "vikram@example.in".to_string();
        rows
    }

    #[tokio::test]
    async fn test_orders_search_uses_selected_field() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks
            .orders
            .expect_list()
            .withf(|status| status.is_none())
            .returning(|_| Ok(orders()));
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let body = body_text(send(&app, get("/orders?field=customer&q=vikram", Some(&cookie))).await).await;
        assert!(body.contains("#1002"));
        assert!(!body.contains("#1001"));

        let body = body_text(send(&app, get("/orders?field=order_id&q=vikram", Some(&cookie))).await).await;
        assert!(body.contains("No orders found"));
        Ok(())
    }

    #[tokio::test]
    async fn test_status_filter_is_sent_to_backend() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks
            .orders
            .expect_list()
            .once()
            .withf(|status| *status == Some(OrderStatus::Processing))
            .returning(|_| Ok(vec![order("1002", 999, OrderStatus::Processing, 2)]));
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let response = send(&app, get("/orders?status=processing", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("#1002"));
        Ok(())
    }

    #[tokio::test]
    async fn test_new_orders_default_to_newest_first() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks
            .orders
            .expect_list()
            .withf(|status| *status == Some(OrderStatus::New))
            .returning(|_| {
                Ok(vec![
                    order("1001", 2499, OrderStatus::New, 1),
                    order("1003", 6990, OrderStatus::New, 3),
                ])
            });
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let body = body_text(send(&app, get("/orders/new", Some(&cookie))).await).await;
        let newer = body.find("#1003").ok_or("missing 1003")?;
        let older = body.find("#1001").ok_or("missing 1001")?;
        assert!(newer < older);
        Ok(())
    }

    #[tokio::test]
    async fn test_accept_payment_writes_then_redirects_back() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks
            .orders
            .expect_get()
            .returning(|_| Ok(order("1001", 2499, OrderStatus::New, 1)));
        mocks
            .orders
            .expect_update()
            .once()
            .withf(|id, patch| {
                id == &OrderId::new("1001")
                    && *patch
                        == OrderPatch {
                            status: Some(OrderStatus::Processing),
                            payment_status: Some(PaymentStatus::Paid),
                        }
            })
            .returning(|_, _| {
                let mut row = order("1001", 2499, OrderStatus::Processing, 1);
                row.payment_status = PaymentStatus::Paid;
                Ok(row)
            });
        let (state, app, cookie) = signed_in_app(mocks).await;

        let response = send(
            &app,
            post_form(
                "/orders/1001/accept_payment",
                "return_to=%2Forders%2Fnew%3Fpage%3D1",
                Some(&cookie),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/orders/new?page=1"));
        assert!(
            state
                .notifier()
                .snapshot()
                .iter()
                .any(|t| t.message == "Order #1001 has been set to processing and payment accepted")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_command_is_404() -> TestResult {
        let (_state, app, cookie) = signed_in_app(Mocks::signed_in()).await;
        let response = send(&app, post_form("/orders/1001/ship", "", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_export_new_orders_as_csv() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.orders.expect_list().returning(|_| {
            Ok(vec![
                order("1001", 2499, OrderStatus::New, 1),
                order("1003", 6990, OrderStatus::New, 3),
            ])
        });
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let response = send(&app, get("/orders/new/export?field=order_id&q=1003", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).map(|v| v.to_str().unwrap_or("")),
            Some("text/csv; charset=utf-8")
        );
        let body = body_text(response).await;
        assert!(body.starts_with("Order ID,Customer,Email,Amount,Date,Payment Status,Order Status"));
        assert!(body.contains("1003"));
        assert!(!body.contains("1001"));
        Ok(())
    }
}
