//! PostgREST-style table queries.
//!
//! Filters are query parameters (`email=eq.a@b.co`, `or=(a.ilike.*x*,...)`),
//! writes send JSON bodies, and `Prefer` / `Accept` headers choose the
//! response shape.

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_RANGE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::{BackendClient, BackendError};

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

/// Parameters that shape a response rather than filter rows.
const NON_FILTER_PARAMS: &[&str] = &["select", "order", "limit", "offset"];

/// Characters with meaning inside PostgREST filter values.
const RESERVED: &[char] = &[',', '(', ')', '*', '%', '"', '\\'];

/// Build an `ilike` pattern matching `term` anywhere.
///
/// Reserved characters are dropped so user input cannot alter the filter.
#[must_use]
pub fn ilike_pattern(term: &str) -> String {
    let cleaned: String = term.trim().chars().filter(|c| !RESERVED.contains(c)).collect();
    format!("*{cleaned}*")
}

/// Build an `ilike` pattern matching `term` exactly, ignoring case.
///
/// LIKE wildcards in `term` are escaped so they match literally; `*` is
/// dropped since PostgREST reads it as a wildcard.
#[must_use]
pub fn ilike_exact_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len());
    for c in term.trim().chars() {
        match c {
            '*' => {}
            '%' | '_' | '\\' => {
                pattern.push('\\');
                pattern.push(c);
            }
            _ => pattern.push(c),
        }
    }
    pattern
}

/// A query against one REST table, consumed by a terminal method.
#[derive(Debug, Clone)]
pub struct TableQuery {
    client: BackendClient,
    table: String,
    params: Vec<(String, String)>,
}

impl TableQuery {
    pub(crate) fn new(client: BackendClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            params: Vec::new(),
        }
    }

    /// Columns (and embedded resources) to return.
    #[must_use]
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    #[must_use]
    pub fn eq(mut self, column: &str, value: impl std::fmt::Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// Case-insensitive substring match on one column.
    #[must_use]
    pub fn ilike(mut self, column: &str, term: &str) -> Self {
        self.params
            .push((column.to_string(), format!("ilike.{}", ilike_pattern(term))));
        self
    }

    /// Case-insensitive whole-value match on one column.
    #[must_use]
    pub fn ilike_exact(mut self, column: &str, term: &str) -> Self {
        self.params
            .push((column.to_string(), format!("ilike.{}", ilike_exact_pattern(term))));
        self
    }

    /// Case-insensitive substring match on any of `columns`.
    #[must_use]
    pub fn ilike_any(mut self, columns: &[&str], term: &str) -> Self {
        let pattern = ilike_pattern(term);
        let filters: Vec<String> = columns
            .iter()
            .map(|column| format!("{column}.ilike.{pattern}"))
            .collect();
        self.params
            .push(("or".to_string(), format!("({})", filters.join(","))));
        self
    }

    #[must_use]
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{column}.{direction}")));
        self
    }

    #[must_use]
    pub fn limit(mut self, count: usize) -> Self {
        self.params.push(("limit".to_string(), count.to_string()));
        self
    }

    fn has_filter(&self) -> bool {
        self.params
            .iter()
            .any(|(key, _)| !NON_FILTER_PARAMS.contains(&key.as_str()))
    }

    /// Full request URL.
    pub(crate) fn url(&self) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.client.endpoint(&format!("/rest/v1/{}", self.table)))
            .map_err(|e| BackendError::Config(format!("Invalid table URL: {e}")))?;
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.params);
        }
        Ok(url)
    }

    /// Fetch every matching row.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or rows do not deserialize.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, BackendError> {
        let url = self.url()?;
        let response = self.client.request(Method::GET, url.as_str()).await.send().await?;
        BackendClient::handle_response(response).await
    }

    /// Fetch zero or one row.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Parse` if more than one row matches.
    pub async fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>, BackendError> {
        let table = self.table.clone();
        let mut rows: Vec<T> = self.fetch().await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(BackendError::Parse(format!(
                "expected at most one row from {table}, got {n}"
            ))),
        }
    }

    /// Fetch exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no row matches.
    pub async fn fetch_one<T: DeserializeOwned>(self) -> Result<T, BackendError> {
        let url = self.url()?;
        let response = self
            .client
            .request(Method::GET, url.as_str())
            .await
            .header(ACCEPT, SINGLE_OBJECT)
            .send()
            .await?;
        // 406 means the result was not exactly one row
        if response.status() == reqwest::StatusCode::NOT_ACCEPTABLE {
            return Err(BackendError::NotFound);
        }
        BackendClient::handle_response(response).await
    }

    /// Count matching rows without fetching them.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or `Content-Range` is missing.
    pub async fn count(self) -> Result<u64, BackendError> {
        let url = self.url()?;
        let response = self
            .client
            .request(Method::HEAD, url.as_str())
            .await
            .header("Prefer", "count=exact")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(BackendError::from_response_body(response.status().as_u16(), ""));
        }
        let range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| BackendError::Parse("missing Content-Range header".to_string()))?;
        parse_content_range_total(range)
    }

    /// Insert one or more rows and return them as stored.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or a constraint is violated.
    pub async fn insert<B, T>(self, body: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.write(Method::POST, RETURN_REPRESENTATION, body).await
    }

    /// Insert rows without reading them back.
    ///
    /// For tables the caller may write but not read.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or a constraint is violated.
    pub async fn insert_only<B>(self, body: &B) -> Result<(), BackendError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.url()?;
        let response = self
            .client
            .request(Method::POST, url.as_str())
            .await
            .header("Prefer", RETURN_MINIMAL)
            .json(body)
            .send()
            .await?;
        BackendClient::handle_empty(response).await
    }

    /// Insert or merge on the primary key.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or a constraint is violated.
    pub async fn upsert<B, T>(self, body: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.write(Method::POST, MERGE_DUPLICATES, body).await
    }

    /// Patch every matching row and return the updated rows.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Config` when no filter was given.
    pub async fn update<B, T>(self, body: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        if !self.has_filter() {
            return Err(BackendError::Config(format!(
                "refusing to update {} without a filter",
                self.table
            )));
        }
        self.write(Method::PATCH, RETURN_REPRESENTATION, body).await
    }

    /// Delete every matching row.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Config` when no filter was given.
    pub async fn delete(self) -> Result<(), BackendError> {
        if !self.has_filter() {
            return Err(BackendError::Config(format!(
                "refusing to delete from {} without a filter",
                self.table
            )));
        }
        let url = self.url()?;
        let response = self
            .client
            .request(Method::DELETE, url.as_str())
            .await
            .send()
            .await?;
        BackendClient::handle_empty(response).await
    }

    async fn write<B, T>(self, method: Method, prefer: &str, body: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url()?;
        let response = self
            .client
            .request(method, url.as_str())
            .await
            .header("Prefer", prefer)
            .json(body)
            .send()
            .await?;
        BackendClient::handle_response(response).await
    }
}

/// Total from a `Content-Range` value such as `0-9/57` or `*/0`.
fn parse_content_range_total(range: &str) -> Result<u64, BackendError> {
    range
        .rsplit_once('/')
        .and_then(|(_, total)| total.parse().ok())
        .ok_or_else(|| BackendError::Parse(format!("invalid Content-Range: {range}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests::test_client;

    fn query_of(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_ilike_pattern_strips_reserved() {
        assert_eq!(ilike_pattern("  Asha "), "*Asha*");
        assert_eq!(ilike_pattern("a,b(c)*%\"\\"), "*abc*");
        assert_eq!(ilike_pattern(""), "**");
    }

    #[test]
    fn test_ilike_exact_pattern_escapes_wildcards() {
        assert_eq!(ilike_exact_pattern(" Asha@Example.in "), "Asha@Example.in");
        assert_eq!(ilike_exact_pattern("asha_rao@example.in"), "asha\\_rao@example.in");
        assert_eq!(ilike_exact_pattern("100%*"), "100\\%");
    }

    #[test]
    fn test_url_carries_filters_in_order() {
        let query = test_client()
            .table("customers")
            .select("*,orders(id,amount,status,created_at)")
            .eq("email", "asha@example.in")
            .order("created_at", false)
            .limit(5);
        let url = query.url().unwrap();
        assert_eq!(url.path(), "/rest/v1/customers");
        assert_eq!(
            query_of(&url),
            vec![
                ("select".into(), "*,orders(id,amount,status,created_at)".into()),
                ("email".into(), "eq.asha@example.in".into()),
                ("order".into(), "created_at.desc".into()),
                ("limit".into(), "5".into()),
            ]
        );
    }

    #[test]
    fn test_ilike_any_builds_or_group() {
        let url = test_client()
            .table("products")
            .ilike_any(&["name", "category"], "kur,ta")
            .url()
            .unwrap();
        assert_eq!(
            query_of(&url),
            vec![("or".into(), "(name.ilike.*kurta*,category.ilike.*kurta*)".into())]
        );
    }

    #[test]
    fn test_has_filter_ignores_shaping_params() {
        let client = test_client();
        assert!(!client.table("orders").select("*").order("id", true).limit(1).has_filter());
        assert!(client.table("orders").eq("id", "ORD-1").has_filter());
    }

    #[tokio::test]
    async fn test_unfiltered_writes_are_refused() {
        let client = test_client();
        let err = client.table("customers").delete().await.unwrap_err();
        assert!(matches!(err, BackendError::Config(m) if m.contains("without a filter")));

        let err = client
            .table("customers")
            .update::<_, serde_json::Value>(&serde_json::json!({"phone": "1"}))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Config(_)));
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-9/57").unwrap(), 57);
        assert_eq!(parse_content_range_total("*/0").unwrap(), 0);
        assert!(parse_content_range_total("0-9/*").is_err());
    }
}
