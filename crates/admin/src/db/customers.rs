//! Customer repository.

use async_trait::async_trait;
use mockall::automock;
use neonflake_core::CustomerId;

use super::{RepositoryError, first_row};
use crate::backend::{BackendClient, TableQuery};
use crate::models::{CUSTOMER_SELECT, Customer, CustomerDraft};

const TABLE: &str = "customers";

#[automock]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Every customer with embedded orders, newest first.
    async fn list_with_orders(&self) -> Result<Vec<Customer>, RepositoryError>;

    /// One customer with embedded orders.
    async fn get(&self, id: &CustomerId) -> Result<Customer, RepositoryError>;

    /// Customers registered under `email`, compared ignoring case.
    async fn find_by_email(&self, email: &str) -> Result<Vec<Customer>, RepositoryError>;

    async fn insert(&self, draft: &CustomerDraft) -> Result<Customer, RepositoryError>;

    async fn update(&self, id: &CustomerId, draft: &CustomerDraft) -> Result<Customer, RepositoryError>;

    async fn delete(&self, id: &CustomerId) -> Result<(), RepositoryError>;

    /// Customers whose name, email, or phone contains `term`.
    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Customer>, RepositoryError>;

    async fn count(&self) -> Result<u64, RepositoryError>;
}

/// Customer repository over the REST API.
#[derive(Debug, Clone)]
pub struct RestCustomerRepository {
    client: BackendClient,
}

impl RestCustomerRepository {
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Rows whose email equals `email` up to case. Older rows were stored
    /// as typed, so an exact `eq` would miss them.
    fn email_query(&self, email: &str) -> TableQuery {
        self.client.table(TABLE).select("*").ilike_exact("email", email)
    }
}

#[async_trait]
impl CustomerRepository for RestCustomerRepository {
    async fn list_with_orders(&self) -> Result<Vec<Customer>, RepositoryError> {
        Ok(self
            .client
            .table(TABLE)
            .select(CUSTOMER_SELECT)
            .order("created_at", false)
            .fetch()
            .await?)
    }

    async fn get(&self, id: &CustomerId) -> Result<Customer, RepositoryError> {
        Ok(self
            .client
            .table(TABLE)
            .select(CUSTOMER_SELECT)
            .eq("id", id)
            .fetch_one()
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Customer>, RepositoryError> {
        Ok(self.email_query(email).fetch().await?)
    }

    async fn insert(&self, draft: &CustomerDraft) -> Result<Customer, RepositoryError> {
        let rows = self
            .client
            .table(TABLE)
            .select(CUSTOMER_SELECT)
            .insert(&[draft.record()])
            .await?;
        first_row(rows, TABLE)
    }

    async fn update(&self, id: &CustomerId, draft: &CustomerDraft) -> Result<Customer, RepositoryError> {
        let rows = self
            .client
            .table(TABLE)
            .select(CUSTOMER_SELECT)
            .eq("id", id)
            .update(&draft.record())
            .await?;
        rows.into_iter().next().ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: &CustomerId) -> Result<(), RepositoryError> {
        Ok(self.client.table(TABLE).eq("id", id).delete().await?)
    }

    async fn search(&self, term: &str, limit: usize) -> Result<Vec<Customer>, RepositoryError> {
        Ok(self
            .client
            .table(TABLE)
            .select("*")
            .ilike_any(&["first_name", "last_name", "email", "phone"], term)
            .limit(limit)
            .fetch()
            .await?)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.client.table(TABLE).select("id").count().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests::test_client;

    #[test]
    fn test_email_lookup_ignores_case() {
        let repo = RestCustomerRepository::new(test_client());
        let url = repo.email_query("asha_rao@example.in").url().unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("select".into(), "*".into()),
                ("email".into(), "ilike.asha\\_rao@example.in".into()),
            ]
        );
    }
}
