//! List-view controller: filter, sort, and paginate an in-memory collection.
//!
//! Every list page (customers, products, orders, login history) fetches its
//! whole collection once and derives the visible rows from three
//! independent inputs held in [`ListState`]:
//!
//! 1. the search text, matched case-insensitively against the row's
//!    configured search fields ([`Listable::search_fields`]);
//! 2. the sort key and direction;
//! 3. the page size and the 1-based page number.
//!
//! [`ListState::view`] runs filter, then sort, then paginate.
//!
//! # Example
//!
//! ```
//! use neonflake_core::listing::{ListState, Listable, SortSpec, SortValue};
//!
//! struct City(&'static str, u32);
//!
//! impl Listable for City {
//!     fn search_fields(&self) -> Vec<&str> {
//!         vec![self.0]
//!     }
//!
//!     fn sort_value(&self, field: &str) -> SortValue<'_> {
//!         match field {
//!             "name" => SortValue::Text(self.0),
//!             "population" => SortValue::Number(f64::from(self.1)),
//!             _ => SortValue::Missing,
//!         }
//!     }
//! }
//!
//! let cities = [City("Pune", 7), City("Mumbai", 20), City("Mysuru", 1)];
//! let mut state = ListState::new(SortSpec::asc("name"));
//! state.set_query("mu");
//!
//! let view = state.view(&cities);
//! assert_eq!(view.filtered_count, 1);
//! assert_eq!(view.rows[0].0, "Mumbai");
//! ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Page sizes offered by the page-size selector.
pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];

/// Page size used when none (or an unsupported one) is requested.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A row type that can be searched and sorted by the list controller.
pub trait Listable {
    /// String fields the free-text search looks at.
    fn search_fields(&self) -> Vec<&str>;

    /// The value used to order rows by `field`.
    ///
    /// Unknown fields should return [`SortValue::Missing`].
    fn sort_value(&self, field: &str) -> SortValue<'_>;
}

impl<T: Listable + ?Sized> Listable for &T {
    fn search_fields(&self) -> Vec<&str> {
        (**self).search_fields()
    }

    fn sort_value(&self, field: &str) -> SortValue<'_> {
        (**self).sort_value(field)
    }
}

/// A typed sort key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    /// Compared lexicographically, case-sensitive.
    Text(&'a str),
    /// Compared numerically (timestamps are passed as epoch millis).
    Number(f64),
    /// No value; sorts after every present value in ascending order.
    Missing,
}

impl SortValue<'_> {
    const fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Text(_) => 1,
            Self::Missing => 2,
        }
    }

    /// Ascending comparison.
    ///
    /// Text compares case-insensitively first, with lowercase ahead of
    /// uppercase on a tie, the way a locale collation orders names.
    /// Values of different kinds are ordered by kind so the comparison stays
    /// a total order; a well-formed column only ever mixes one kind with
    /// `Missing`.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| b.cmp(a)),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Query-string value (`asc` / `desc`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Apply this direction to an ascending ordering.
    #[must_use]
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Sort key plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Keep the items where at least one search field contains `query`,
/// ignoring case. The empty query keeps everything.
#[must_use]
pub fn filter<'a, T: Listable>(items: &'a [T], query: &str) -> Vec<&'a T> {
    filter_by(items, query, T::search_fields)
}

/// Like [`filter`], with the searched fields chosen by `fields` instead of
/// [`Listable::search_fields`]. Used where the page lets the user pick which
/// field to search.
#[must_use]
pub fn filter_by<'a, T, F>(items: &'a [T], query: &str, fields: F) -> Vec<&'a T>
where
    F: Fn(&'a T) -> Vec<&'a str>,
{
    if query.is_empty() {
        return items.iter().collect();
    }
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| {
            fields(*item)
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Stable sort of `rows` by `spec`.
pub fn sort<T: Listable>(rows: &mut [&T], spec: &SortSpec) {
    rows.sort_by(|a, b| {
        let ordering = a
            .sort_value(&spec.field)
            .compare(&b.sort_value(&spec.field));
        spec.direction.apply(ordering)
    });
}

/// The slice for 1-based `page`, clamped to the bounds of `items`.
///
/// Page 0 is treated as page 1. Pages past the end yield an empty slice.
#[must_use]
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page_size == 0 {
        return &[];
    }
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let end = start.saturating_add(page_size).min(items.len());
    items.get(start..end).unwrap_or(&[])
}

/// Number of pages needed for `count` rows; zero rows means zero pages.
#[must_use]
pub const fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        count.div_ceil(page_size)
    }
}

/// Raw list inputs as they arrive in a query string
/// (`?q=&sort=&dir=&per_page=&page=`).
///
/// Numbers are kept as strings so a malformed value falls back to the
/// default instead of failing the whole request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

/// The three list inputs: search text, sort, and page position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    query: String,
    sort: SortSpec,
    page_size: usize,
    page: usize,
}

impl ListState {
    /// Empty query, page 1, default page size.
    #[must_use]
    pub const fn new(default_sort: SortSpec) -> Self {
        Self {
            query: String::new(),
            sort: default_sort,
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }

    /// Rebuild state from query-string parameters.
    ///
    /// A sort field not listed in `sortable` falls back to `default_sort`.
    #[must_use]
    pub fn from_params(params: &ListParams, default_sort: SortSpec, sortable: &[&str]) -> Self {
        let mut state = Self::new(default_sort);

        if let Some(q) = &params.q {
            state.set_query(q);
        }
        if let Some(per_page) = params.per_page.as_deref().and_then(|p| p.parse().ok()) {
            state.set_page_size(per_page);
        }
        if let Some(field) = params.sort.as_deref().filter(|f| sortable.contains(f)) {
            let direction = params
                .dir
                .as_deref()
                .and_then(SortDirection::parse)
                .unwrap_or_default();
            state.sort = SortSpec {
                field: field.to_owned(),
                direction,
            };
        }
        if let Some(page) = params.page.as_deref().and_then(|p| p.parse().ok()) {
            state.set_page(page);
        }
        state
    }

    /// Serialize back to query-string parameters.
    #[must_use]
    pub fn to_params(&self) -> ListParams {
        ListParams {
            q: (!self.query.is_empty()).then(|| self.query.clone()),
            sort: Some(self.sort.field.clone()),
            dir: Some(self.sort.direction.as_str().to_owned()),
            per_page: Some(self.page_size.to_string()),
            page: Some(self.page.to_string()),
        }
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub const fn sort_spec(&self) -> &SortSpec {
        &self.sort
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Change the search text and go back to page 1.
    pub fn set_query(&mut self, query: impl AsRef<str>) {
        query.as_ref().trim().clone_into(&mut self.query);
        self.page = 1;
    }

    /// Change the page size and go back to page 1.
    ///
    /// Sizes outside [`PAGE_SIZES`] fall back to [`DEFAULT_PAGE_SIZE`].
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = if PAGE_SIZES.contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        self.page = 1;
    }

    /// Flip direction on the current field, or sort a new field ascending.
    /// The page is left as is.
    pub fn toggle_sort(&mut self, field: &str) {
        if self.sort.field == field {
            self.sort.direction = self.sort.direction.toggled();
        } else {
            self.sort = SortSpec::asc(field);
        }
    }

    /// Jump to `page`. Not clamped; an out-of-range page renders empty.
    pub const fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Filter, sort, and paginate `items`.
    #[must_use]
    pub fn view<'a, T: Listable>(&self, items: &'a [T]) -> ListView<'a, T> {
        self.view_by(items, T::search_fields)
    }

    /// Like [`ListState::view`], searching the fields chosen by `fields`.
    #[must_use]
    pub fn view_by<'a, T, F>(&self, items: &'a [T], fields: F) -> ListView<'a, T>
    where
        T: Listable,
        F: Fn(&'a T) -> Vec<&'a str>,
    {
        let mut filtered = filter_by(items, &self.query, fields);
        sort(&mut filtered, &self.sort);

        let filtered_count = filtered.len();
        ListView {
            rows: paginate(&filtered, self.page, self.page_size).to_vec(),
            filtered_count,
            total_count: items.len(),
            total_pages: total_pages(filtered_count, self.page_size),
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// The derived, render-ready slice of a list.
#[derive(Debug)]
pub struct ListView<'a, T> {
    /// Rows on the current page, in sorted order.
    pub rows: Vec<&'a T>,
    /// Rows matching the search, across all pages.
    pub filtered_count: usize,
    /// Rows fetched before filtering.
    pub total_count: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> ListView<'_, T> {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// 1-based index of the first row shown (0 when the page is empty).
    #[must_use]
    pub const fn first_row_number(&self) -> usize {
        if self.rows.is_empty() {
            0
        } else {
            (self.page.saturating_sub(1)) * self.page_size + 1
        }
    }

    /// 1-based index of the last row shown (0 when the page is empty).
    #[must_use]
    pub const fn last_row_number(&self) -> usize {
        if self.rows.is_empty() {
            0
        } else {
            self.first_row_number() + self.rows.len() - 1
        }
    }
}
