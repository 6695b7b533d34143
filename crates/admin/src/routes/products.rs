//! Product catalog list, create form, and delete.

use askama::Template;
use axum::{
    Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use neonflake_core::form::FormErrors;
use neonflake_core::listing::{ListParams, ListState, SortSpec};
use chrono::{DateTime, Utc};
use neonflake_core::{GstRate, Price, ProductCategory, ProductColor, ProductId, ProductStatus};
use serde::Deserialize;
use tracing::instrument;

use crate::components::{DataTable, TableColumn};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{CurrentAdmin, PRODUCT_IMAGE_SLOTS, Product, ProductDraft};
use crate::services::ImageUpload;
use crate::services::products::PRODUCT_IMAGES_BUCKET;
use crate::state::AppState;

use super::orders::SelectOption;
use super::{Layout, read_upload, render};

const COLUMNS: &[TableColumn] = &[
    TableColumn::new("image", "Image"),
    TableColumn::sortable("name", "Name"),
    TableColumn::sortable("category", "Category"),
    TableColumn::sortable("list_price", "List Price"),
    TableColumn::sortable("sale_price", "Sale Price"),
    TableColumn::new("status", "Status"),
    TableColumn::sortable("created_at", "Added"),
    TableColumn::new("actions", "Actions"),
];

fn default_sort() -> SortSpec {
    SortSpec::desc("created_at")
}

/// Product row for templates.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: String,
    pub name: String,
    pub category: &'static str,
    pub list_price: Price,
    pub sale_price: Price,
    pub status: &'static str,
    pub status_label: &'static str,
    pub added: DateTime<Utc>,
    pub image_url: Option<String>,
}

impl ProductRowView {
    fn new(product: &Product, state: &AppState) -> Self {
        let image_url = product.images.first().and_then(|path| {
            state
                .backend()
                .public_object_url(PRODUCT_IMAGES_BUCKET, path)
                .inspect_err(|e| tracing::warn!(error = %e, path = %path, "No public URL for product image"))
                .ok()
        });
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            category: product.category.label(),
            list_price: product.list_price,
            sale_price: product.sale_price,
            status: product.status.as_str(),
            status_label: product.status.label(),
            added: product.created_at,
            image_url,
        }
    }
}

#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub table: DataTable,
    pub products: Vec<ProductRowView>,
    pub categories: Vec<SelectOption>,
    pub statuses: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    pub draft: ProductDraft,
    pub errors: FormErrors,
    pub categories: Vec<SelectOption>,
    pub gst_rates: Vec<SelectOption>,
    pub statuses: Vec<SelectOption>,
    pub colors: Vec<SelectOption>,
    pub image_slots: Vec<usize>,
}

impl ProductFormTemplate {
    fn new(layout: Layout, draft: ProductDraft, errors: FormErrors) -> Self {
        Self {
            categories: options(ProductCategory::ALL, &draft.category, |c| (c.as_str(), c.label())),
            gst_rates: options(GstRate::ALL, &draft.gst, |g| (g.as_str(), g.label())),
            statuses: options(ProductStatus::ALL, &draft.status, |s| (s.as_str(), s.label())),
            colors: options(ProductColor::ALL, &draft.colors, |c| (c.as_str(), c.label())),
            image_slots: (1..=PRODUCT_IMAGE_SLOTS).collect(),
            layout,
            draft,
            errors,
        }
    }

    /// Error message for `field`, empty when valid.
    fn error(&self, field: &str) -> &str {
        self.errors.get(field).unwrap_or_default()
    }
}

/// Options for an enum `<select>`, marking `selected` as chosen.
fn options<T: Copy>(
    all: &[T],
    selected: &str,
    describe: impl Fn(T) -> (&'static str, &'static str),
) -> Vec<SelectOption> {
    all.iter()
        .map(|&item| {
            let (value, label) = describe(item);
            SelectOption {
                value,
                label,
                selected: value == selected,
            }
        })
        .collect()
}

/// Products list query: list inputs plus the category and status filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub category: Option<String>,
    pub status: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/new", get(new_form))
        .route("/products/{id}/delete", post(delete))
}

/// GET /products
#[instrument(skip(admin, state))]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Response {
    let products = state.products().list().await.unwrap_or_default();

    // "all" and unknown values mean no filter
    let category: Option<ProductCategory> = query.category.as_deref().and_then(|c| c.parse().ok());
    let status: Option<ProductStatus> = query.status.as_deref().and_then(|s| s.parse().ok());
    let matching: Vec<Product> = products
        .into_iter()
        .filter(|p| category.is_none_or(|c| p.category == c))
        .filter(|p| status.is_none_or(|s| p.status == s))
        .collect();

    let list_state = ListState::from_params(&query.list, default_sort(), &TableColumn::sortable_keys(COLUMNS));
    let view = list_state.view(&matching);
    let extra = [
        ("category", category.map_or("", ProductCategory::as_str)),
        ("status", status.map_or("", ProductStatus::as_str)),
    ];

    let all = |label| SelectOption {
        value: "all",
        label,
        selected: false,
    };
    let mut categories = vec![SelectOption {
        selected: category.is_none(),
        ..all("All Categories")
    }];
    categories.extend(options(ProductCategory::ALL, extra[0].1, |c| (c.as_str(), c.label())));
    let mut statuses = vec![SelectOption {
        selected: status.is_none(),
        ..all("All Statuses")
    }];
    statuses.extend(options(ProductStatus::ALL, extra[1].1, |s| (s.as_str(), s.label())));

    let template = ProductsIndexTemplate {
        layout: Layout::new(&state, &admin, "/products"),
        table: DataTable::new("/products", COLUMNS, &list_state, &view, &extra)
            .search_placeholder("Search products...")
            .empty_state("No products found"),
        products: view.rows.iter().map(|p| ProductRowView::new(p, &state)).collect(),
        categories,
        statuses,
    };
    render(&template)
}

/// GET /products/new
#[instrument(skip(admin, state))]
async fn new_form(RequireAdminAuth(admin): RequireAdminAuth, State(state): State<AppState>) -> Response {
    let layout = Layout::new(&state, &admin, "/products");
    render(&ProductFormTemplate::new(layout, ProductDraft::default(), FormErrors::new()))
}

/// Split the multipart body into text fields and image slots.
async fn read_form(multipart: &mut Multipart) -> Result<(ProductDraft, Vec<Option<ImageUpload>>), AppError> {
    let mut draft = ProductDraft::default();
    let mut images: Vec<Option<ImageUpload>> = vec![None; PRODUCT_IMAGE_SLOTS];

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(slot) = name
            .strip_prefix("image_")
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
        {
            let upload = read_upload(field).await?;
            if let Some(entry) = images.get_mut(slot) {
                *entry = upload;
            }
            continue;
        }

        let text = field.text().await.map_err(|e| AppError::BadRequest(e.to_string()))?;
        let target = match name.as_str() {
            "name" => &mut draft.name,
            "category" => &mut draft.category,
            "list_price" => &mut draft.list_price,
            "sale_price" => &mut draft.sale_price,
            "gst" => &mut draft.gst,
            "status" => &mut draft.status,
            "description" => &mut draft.description,
            "colors" => &mut draft.colors,
            _ => continue,
        };
        *target = text;
    }
    Ok((draft, images))
}

/// POST /products
#[instrument(skip(admin, state, multipart))]
async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let (draft, images) = read_form(&mut multipart).await?;

    match state.products().submit(&draft, images).await {
        Ok(_) => Ok(Redirect::to("/products").into_response()),
        Err(e) => {
            let layout = Layout::new(&state, &admin, "/products");
            let template = ProductFormTemplate::new(layout, draft, e.field_errors());
            Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&template)).into_response())
        }
    }
}

/// POST /products/{id}/delete
#[instrument(skip(_admin, state))]
async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Redirect {
    // The notifier reports failures
    let _ = state.products().delete(&ProductId::new(id)).await;
    Redirect::to("/products")
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use neonflake_core::{ProductCategory, ProductId, ProductStatus};
    use testresult::TestResult;

    use super::super::test_helpers::{Mocks, body_text, get, location, post_form, send, signed_in_app};
    use crate::backend::BackendError;
    use crate::models::tests::product;

    const BOUNDARY: &str = "neonflake-test-boundary";

    /// Build a multipart body from text fields and `(field, file name, bytes)` files.
    pub(crate) fn multipart(uri: &str, texts: &[(&str, &str)], files: &[(&str, &str, &[u8])], cookie: &str) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in texts {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                    .as_bytes(),
            );
        }
        for (name, file_name, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .header(header::COOKIE, cookie)
            .body(Body::from(body))
            .unwrap()
    }

    const VALID_FIELDS: &[(&str, &str)] = &[
        ("name", "Cotton Kurta"),
        ("category", "clothing"),
        ("list_price", "1999"),
        ("sale_price", "1499"),
        ("gst", "12"),
        ("status", "active"),
        ("description", "Hand block printed."),
        ("colors", "blue"),
    ];

    #[tokio::test]
    async fn test_filters_by_category_and_status() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.products.expect_list().returning(|| {
            let mut hidden = product("p-3", "Silk Scarf", ProductCategory::Accessories, 799, 3);
            hidden.status = ProductStatus::Inactive;
            Ok(vec![
                product("p-1", "Cotton Kurta", ProductCategory::Clothing, 1499, 1),
                product("p-2", "Earbuds", ProductCategory::Electronics, 2499, 2),
                hidden,
                product("p-4", "Leather Belt", ProductCategory::Accessories, 599, 4),
            ])
        });
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let body = body_text(
            send(&app, get("/products?category=accessories&status=active", Some(&cookie))).await,
        )
        .await;
        assert!(body.contains("Leather Belt"));
        assert!(!body.contains("Silk Scarf"));
        assert!(!body.contains("Earbuds"));

        let body = body_text(send(&app, get("/products?category=all&status=all", Some(&cookie))).await).await;
        assert!(body.contains("Silk Scarf"));
        assert!(body.contains("Earbuds"));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_uploads_images_then_inserts() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks
            .images
            .expect_upload()
            .times(2)
            .withf(|bucket, path, _, _| bucket == "product-images" && (path.ends_with("-front.png") || path.ends_with("-back.png")))
            .returning(|_, path, _, _| Ok(path.to_string()));
        mocks
            .products
            .expect_insert()
            .once()
            .withf(|product, images| product.name == "Cotton Kurta" && images.len() == 2)
            .returning(|_, _| Ok(product("p-9", "Cotton Kurta", ProductCategory::Clothing, 1499, 9)));
        let (state, app, cookie) = signed_in_app(mocks).await;

        let request = multipart(
            "/products",
            VALID_FIELDS,
            &[("image_1", "front.png", b"png-1"), ("image_2", "", b""), ("image_3", "back.png", b"png-3")],
            &cookie,
        );
        let response = send(&app, request).await;
        assert_eq!(location(&response), Some("/products"));
        assert!(
            state
                .notifier()
                .snapshot()
                .iter()
                .any(|t| t.message == "Product added successfully")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_first_image_is_rejected_before_upload() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks.images.expect_upload().never();
        mocks.products.expect_insert().never();
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let request = multipart("/products", VALID_FIELDS, &[("image_2", "side.png", b"png")], &cookie);
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_text(response).await;
        assert!(body.contains("Product image is required"));
        assert!(body.contains(r#"value="Cotton Kurta""#));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_upload_skips_insert() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks
            .images
            .expect_upload()
            .returning(|_, _, _, _| Err(BackendError::Parse("storage down".into())));
        mocks.products.expect_insert().never();
        let (state, app, cookie) = signed_in_app(mocks).await;

        let request = multipart("/products", VALID_FIELDS, &[("image_1", "front.png", b"png")], &cookie);
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(
            state
                .notifier()
                .snapshot()
                .iter()
                .any(|t| t.message == "Failed to add product")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product() -> TestResult {
        let mut mocks = Mocks::signed_in();
        mocks
            .products
            .expect_delete()
            .once()
            .withf(|id| id == &ProductId::new("p-2"))
            .returning(|_| Ok(()));
        let (_state, app, cookie) = signed_in_app(mocks).await;

        let response = send(&app, post_form("/products/p-2/delete", "", Some(&cookie))).await;
        assert_eq!(location(&response), Some("/products"));
        Ok(())
    }
}
