//! Customer list, details, form, delete, and export.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use neonflake_core::{CustomerId, Price};
use neonflake_core::form::FormErrors;
use neonflake_core::listing::{self, ListParams, ListState, SortSpec};
use neonflake_core::time::{format_date, format_datetime};
use tracing::instrument;

use crate::components::{DataTable, TableColumn};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{CUSTOMER_FIELDS, CurrentAdmin, CustomerDraft, CustomerSummary};
use crate::services::CustomerFormError;
use crate::state::AppState;

use super::{Layout, csv_download, redirect_back, render};

const COLUMNS: &[TableColumn] = &[
    TableColumn::sortable("name", "Name"),
    TableColumn::new("email", "Email"),
    TableColumn::new("phone", "Phone"),
    TableColumn::sortable("total_orders", "Orders"),
    TableColumn::sortable("total_spent", "Total Spent"),
    TableColumn::sortable("created_at", "Registered"),
    TableColumn::new("actions", "Actions"),
];

fn default_sort() -> SortSpec {
    SortSpec::asc("name")
}

/// Customer row for templates.
#[derive(Debug, Clone)]
pub struct CustomerRowView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub total_orders: usize,
    pub total_spent: Price,
    pub registered: DateTime<Utc>,
}

impl From<&CustomerSummary> for CustomerRowView {
    fn from(summary: &CustomerSummary) -> Self {
        Self {
            id: summary.customer.id.to_string(),
            name: summary.name.clone(),
            email: summary.customer.email.clone(),
            phone: summary.customer.phone.clone(),
            total_orders: summary.total_orders,
            total_spent: summary.total_spent,
            registered: summary.customer.created_at,
        }
    }
}

#[derive(Template)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub layout: Layout,
    pub table: DataTable,
    pub customers: Vec<CustomerRowView>,
    pub export_href: String,
}

/// Label/value pair on the detail page.
#[derive(Debug, Clone)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
}

/// An order on the detail page.
#[derive(Debug, Clone)]
pub struct CustomerOrderView {
    pub id: String,
    pub amount: Price,
    pub status: &'static str,
    pub status_label: &'static str,
    pub date: DateTime<Utc>,
}

#[derive(Template)]
#[template(path = "customers/show.html")]
pub struct CustomerShowTemplate {
    pub layout: Layout,
    pub id: String,
    pub name: String,
    pub contact: Vec<DetailRow>,
    pub address: Vec<DetailRow>,
    pub business: Vec<DetailRow>,
    pub stats: Vec<DetailRow>,
    pub orders: Vec<CustomerOrderView>,
}

/// One input on the customer form.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub required: bool,
    pub value: String,
    pub error: Option<String>,
}

/// Labels and input types for [`CUSTOMER_FIELDS`].
fn field_meta(field: &str) -> (&'static str, &'static str, bool) {
    match field {
        "first_name" => ("First Name", "text", true),
        "last_name" => ("Last Name", "text", true),
        "email" => ("Email", "email", true),
        "phone" => ("Phone Number", "tel", true),
        "street_address" => ("Street Address", "text", true),
        "country" => ("Country", "text", true),
        "city" => ("City", "text", true),
        "state" => ("State", "text", true),
        "zip_code" => ("ZIP Code", "text", true),
        "company_name" => ("Company Name", "text", false),
        "gst_number" => ("GST Number", "text", false),
        _ => ("", "text", false),
    }
}

fn form_fields(draft: &CustomerDraft, errors: &FormErrors) -> Vec<FormField> {
    CUSTOMER_FIELDS
        .iter()
        .map(|&name| {
            let (label, input_type, required) = field_meta(name);
            FormField {
                name,
                label,
                input_type,
                required,
                value: draft.get(name).unwrap_or_default().to_string(),
                error: errors.get(name).map(str::to_string),
            }
        })
        .collect()
}

#[derive(Template)]
#[template(path = "customers/form.html")]
pub struct CustomerFormTemplate {
    pub layout: Layout,
    pub title: &'static str,
    pub action: String,
    pub submit_label: &'static str,
    pub cancel_href: String,
    pub fields: Vec<FormField>,
}

impl CustomerFormTemplate {
    fn create(layout: Layout, draft: &CustomerDraft, errors: &FormErrors) -> Self {
        Self {
            layout,
            title: "Add New Customer",
            action: "/customers".to_string(),
            submit_label: "Add Customer",
            cancel_href: "/customers".to_string(),
            fields: form_fields(draft, errors),
        }
    }

    fn edit(layout: Layout, id: &CustomerId, draft: &CustomerDraft, errors: &FormErrors) -> Self {
        Self {
            layout,
            title: "Edit Customer",
            action: format!("/customers/{id}"),
            submit_label: "Update Customer",
            cancel_href: format!("/customers/{id}"),
            fields: form_fields(draft, errors),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(index).post(create))
        .route("/customers/export", get(export))
        .route("/customers/new", get(new_form))
        .route("/customers/{id}", get(show).post(update))
        .route("/customers/{id}/edit", get(edit_form))
        .route("/customers/{id}/delete", post(delete))
}

fn list_state(params: &ListParams) -> ListState {
    ListState::from_params(params, default_sort(), &TableColumn::sortable_keys(COLUMNS))
}

/// Customers list page handler.
///
/// GET /customers
#[instrument(skip(admin, state))]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let customers = state.customers().list().await.unwrap_or_default();
    let list_state = list_state(&params);
    let view = list_state.view(&customers);

    let mut export = url::form_urlencoded::Serializer::new(String::new());
    if !list_state.query().is_empty() {
        export.append_pair("q", list_state.query());
    }
    export
        .append_pair("sort", &list_state.sort_spec().field)
        .append_pair("dir", list_state.sort_spec().direction.as_str());

    let template = CustomersIndexTemplate {
        layout: Layout::new(&state, &admin, "/customers"),
        table: DataTable::new("/customers", COLUMNS, &list_state, &view, &[])
            .search_placeholder("Search by name, email, or phone...")
            .empty_state("No customers found"),
        customers: view.rows.iter().map(|c| CustomerRowView::from(*c)).collect(),
        export_href: format!("/customers/export?{}", export.finish()),
    };
    render(&template)
}

/// CSV of every customer matching the current search, in list order.
///
/// GET /customers/export
#[instrument(skip(_admin, state, headers))]
async fn export(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response {
    let Ok(customers) = state.customers().list().await else {
        return redirect_back(&headers, "/customers").into_response();
    };
    let list_state = list_state(&params);
    let mut matching = listing::filter(&customers, list_state.query());
    listing::sort(&mut matching, list_state.sort_spec());

    match state.export().customers(&matching) {
        Some(bytes) => csv_download("customers.csv", bytes),
        None => redirect_back(&headers, "/customers").into_response(),
    }
}

/// GET /customers/{id}
#[instrument(skip(admin, state))]
async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let summary = state.customers().get(&CustomerId::new(id)).await?;
    let customer = &summary.customer;
    let or_dash = |value: &str| {
        if value.is_empty() { "-".to_string() } else { value.to_string() }
    };

    let mut orders = customer.orders.clone();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let template = CustomerShowTemplate {
        layout: Layout::new(&state, &admin, "/customers"),
        id: customer.id.to_string(),
        name: summary.name.clone(),
        contact: vec![
            DetailRow {
                label: "Email",
                value: customer.email.clone(),
            },
            DetailRow {
                label: "Phone",
                value: or_dash(&customer.phone),
            },
        ],
        address: vec![
            DetailRow {
                label: "Street Address",
                value: or_dash(&customer.street_address),
            },
            DetailRow {
                label: "City",
                value: or_dash(&customer.city),
            },
            DetailRow {
                label: "State",
                value: or_dash(&customer.state),
            },
            DetailRow {
                label: "ZIP Code",
                value: or_dash(&customer.zip_code),
            },
            DetailRow {
                label: "Country",
                value: or_dash(&customer.country),
            },
        ],
        business: vec![
            DetailRow {
                label: "Company",
                value: or_dash(customer.company_name.as_deref().unwrap_or_default()),
            },
            DetailRow {
                label: "GST Number",
                value: or_dash(customer.gst_number.as_deref().unwrap_or_default()),
            },
        ],
        stats: vec![
            DetailRow {
                label: "Total Orders",
                value: summary.total_orders.to_string(),
            },
            DetailRow {
                label: "Total Spent",
                value: summary.total_spent.to_string(),
            },
            DetailRow {
                label: "Last Purchase",
                value: summary
                    .last_purchase
                    .as_ref()
                    .map_or_else(|| "-".to_string(), format_datetime),
            },
            DetailRow {
                label: "Customer Since",
                value: format_date(&customer.created_at),
            },
        ],
        orders: orders
            .iter()
            .map(|order| CustomerOrderView {
                id: order.id.to_string(),
                amount: order.amount,
                status: order.status.as_str(),
                status_label: order.status.label(),
                date: order.created_at,
            })
            .collect(),
    };
    Ok(render(&template))
}

/// GET /customers/new
#[instrument(skip(admin, state))]
async fn new_form(RequireAdminAuth(admin): RequireAdminAuth, State(state): State<AppState>) -> Response {
    let layout = Layout::new(&state, &admin, "/customers");
    render(&CustomerFormTemplate::create(
        layout,
        &CustomerDraft::default(),
        &FormErrors::new(),
    ))
}

/// GET /customers/{id}/edit
#[instrument(skip(admin, state))]
async fn edit_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = CustomerId::new(id);
    let customer = state.customers().get_record(&id).await?;
    let layout = Layout::new(&state, &admin, "/customers");
    Ok(render(&CustomerFormTemplate::edit(
        layout,
        &id,
        &CustomerDraft::from_customer(&customer),
        &FormErrors::new(),
    )))
}

/// Re-render a rejected submission with its field errors.
fn rejected(state: &AppState, admin: &CurrentAdmin, template: impl FnOnce(Layout) -> CustomerFormTemplate) -> Response {
    let layout = Layout::new(state, admin, "/customers");
    (StatusCode::UNPROCESSABLE_ENTITY, render(&template(layout))).into_response()
}

/// POST /customers
#[instrument(skip(admin, state, draft))]
async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Form(mut draft): Form<CustomerDraft>,
) -> Response {
    match state.customer_form().submit(&mut draft, None).await {
        Ok(_) => Redirect::to("/customers").into_response(),
        Err(e) => {
            let errors = e.field_errors();
            rejected(&state, &admin, |layout| CustomerFormTemplate::create(layout, &draft, &errors))
        }
    }
}

/// POST /customers/{id}
#[instrument(skip(admin, state, draft))]
async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(mut draft): Form<CustomerDraft>,
) -> Result<Response, AppError> {
    let id = CustomerId::new(id);
    match state.customer_form().submit(&mut draft, Some(&id)).await {
        Ok(customer) => Ok(Redirect::to(&format!("/customers/{}", customer.id)).into_response()),
        Err(CustomerFormError::NotFound) => Err(AppError::NotFound(format!("customer {id}"))),
        Err(e) => {
            let errors = e.field_errors();
            Ok(rejected(&state, &admin, |layout| {
                CustomerFormTemplate::edit(layout, &id, &draft, &errors)
            }))
        }
    }
}

/// POST /customers/{id}/delete
#[instrument(skip(_admin, state))]
async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Redirect {
    // The notifier reports failures
    let _ = state.customers().delete(&CustomerId::new(id)).await;
    Redirect::to("/customers")
}
