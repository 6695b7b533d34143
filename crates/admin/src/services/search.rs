//! Global search across orders, products, and customers.

use std::sync::Arc;

use serde::Serialize;
use url::form_urlencoded;

use super::notifications::Notifier;
use crate::db::{CustomerRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::models::{Customer, Order, Product};

/// Results per entity type.
pub const SEARCH_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Order,
    Product,
    Customer,
}

impl SearchKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Order => "Order",
            Self::Product => "Product",
            Self::Customer => "Customer",
        }
    }
}

/// One entry in the search dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub kind: SearchKind,
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub route: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

fn list_route(path: &str, params: &[(&str, &str)]) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{path}?{query}")
}

impl From<Order> for SearchResult {
    fn from(order: Order) -> Self {
        let subtitle = if order.customer_name.is_empty() {
            order.amount.to_string()
        } else {
            format!("{} - {}", order.customer_name, order.amount)
        };
        Self {
            kind: SearchKind::Order,
            title: format!("Order #{}", order.id),
            subtitle,
            route: list_route("/orders", &[("field", "order_id"), ("q", order.id.as_str())]),
            status: Some(order.status.to_string()),
            contact: None,
            id: order.id.into_inner(),
        }
    }
}

impl From<Product> for SearchResult {
    fn from(product: Product) -> Self {
        Self {
            kind: SearchKind::Product,
            subtitle: format!("{} - {}", product.sale_price, product.category.label()),
            route: list_route("/products", &[("q", &product.name)]),
            title: product.name,
            status: Some(product.status.to_string()),
            contact: None,
            id: product.id.into_inner(),
        }
    }
}

impl From<Customer> for SearchResult {
    fn from(customer: Customer) -> Self {
        Self {
            kind: SearchKind::Customer,
            title: format!("{} {}", customer.first_name, customer.last_name)
                .trim()
                .to_string(),
            subtitle: customer.email,
            route: format!("/customers/{}", customer.id),
            status: None,
            contact: Some(customer.phone).filter(|p| !p.is_empty()),
            id: customer.id.into_inner(),
        }
    }
}

/// Runs the three entity searches concurrently.
#[derive(Clone)]
pub struct SearchService {
    orders: Arc<dyn OrderRepository>,
    products: Arc<dyn ProductRepository>,
    customers: Arc<dyn CustomerRepository>,
    notifier: Notifier,
}

impl SearchService {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        products: Arc<dyn ProductRepository>,
        customers: Arc<dyn CustomerRepository>,
        notifier: Notifier,
    ) -> Self {
        Self {
            orders,
            products,
            customers,
            notifier,
        }
    }

    /// Orders, then products, then customers matching `query`.
    ///
    /// A blank query returns nothing without touching the backend; a
    /// failed query notifies and returns nothing.
    #[tracing::instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        match self.query_all(query).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(error = %e, "Search failed");
                self.notifier.error("Search failed");
                Vec::new()
            }
        }
    }

    async fn query_all(&self, query: &str) -> Result<Vec<SearchResult>, RepositoryError> {
        let (orders, products, customers) = tokio::try_join!(
            self.orders.search(query, SEARCH_LIMIT),
            self.products.search(query, SEARCH_LIMIT),
            self.customers.search(query, SEARCH_LIMIT),
        )?;

        Ok(orders
            .into_iter()
            .map(SearchResult::from)
            .chain(products.into_iter().map(SearchResult::from))
            .chain(customers.into_iter().map(SearchResult::from))
            .collect())
    }
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::backend::BackendError;
    use crate::db::{MockCustomerRepository, MockOrderRepository, MockProductRepository};
    use crate::models::tests::{customer, order, product};
    use neonflake_core::{OrderStatus, ProductCategory};

    fn service(
        orders: MockOrderRepository,
        products: MockProductRepository,
        customers: MockCustomerRepository,
    ) -> (SearchService, Notifier) {
        let notifier = Notifier::new(Duration::from_secs(5));
        (
            SearchService::new(Arc::new(orders), Arc::new(products), Arc::new(customers), notifier.clone()),
            notifier,
        )
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_calls() {
        let mut orders = MockOrderRepository::new();
        orders.expect_search().never();
        let mut products = MockProductRepository::new();
        products.expect_search().never();
        let mut customers = MockCustomerRepository::new();
        customers.expect_search().never();

        let (service, _) = service(orders, products, customers);
        assert!(service.search("   ").await.is_empty());
    }

    #[tokio::test]
    async fn test_results_are_grouped_orders_products_customers() {
        let mut orders = MockOrderRepository::new();
        orders
            .expect_search()
            .withf(|q, limit| q == "asha" && *limit == SEARCH_LIMIT)
            .return_once(|_, _| Ok(vec![order("1042", 2499, OrderStatus::New, 3)]));
        let mut products = MockProductRepository::new();
        products
            .expect_search()
            .return_once(|_, _| Ok(vec![product("p-1", "Asha Saree", ProductCategory::Clothing, 3200, 1)]));
        let mut customers = MockCustomerRepository::new();
        customers
            .expect_search()
            .return_once(|_, _| Ok(vec![customer("c-1", "Asha", "Rao", "asha@example.in")]));

        let (service, _) = service(orders, products, customers);
        let results = service.search(" asha ").await;

        let kinds: Vec<_> = results.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![SearchKind::Order, SearchKind::Product, SearchKind::Customer]);
        assert_eq!(results[0].title, "Order #1042");
        assert_eq!(results[0].subtitle, "Asha Rao - ₹2,499");
        assert_eq!(results[0].route, "/orders?field=order_id&q=1042");
        assert_eq!(results[1].subtitle, "₹3,200 - Clothing");
        assert_eq!(results[1].route, "/products?q=Asha+Saree");
        assert_eq!(results[2].title, "Asha Rao");
        assert_eq!(results[2].route, "/customers/c-1");
    }

    #[tokio::test]
    async fn test_any_failure_notifies_and_returns_nothing() {
        let mut orders = MockOrderRepository::new();
        orders.expect_search().return_once(|_, _| Ok(Vec::new()));
        let mut products = MockProductRepository::new();
        products.expect_search().return_once(|_, _| {
            Err(RepositoryError::Backend(BackendError::Parse("unexpected body".into())))
        });
        let mut customers = MockCustomerRepository::new();
        customers.expect_search().returning(|_, _| Ok(Vec::new()));

        let (service, notifier) = service(orders, products, customers);
        assert!(service.search("kurta").await.is_empty());
        assert_eq!(notifier.snapshot()[0].message, "Search failed");
    }
}
