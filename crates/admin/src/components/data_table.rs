//! Data table component types.
//!
//! A [`DataTable`] turns a [`ListState`] and the [`ListView`] it produced
//! into everything a list template needs: sortable headers with their
//! toggle links, page links, and page-size links. Every link carries the
//! other list inputs plus any page-specific filters, so changing one input
//! keeps the rest.

use neonflake_core::listing::{ListState, ListView, PAGE_SIZES};
use url::form_urlencoded;

/// Column definition for a data table.
#[derive(Debug, Clone)]
pub struct TableColumn {
    /// Sort key, also used as the header id.
    pub key: &'static str,
    /// Display label for the column header.
    pub label: &'static str,
    /// Whether the column is sortable.
    pub sortable: bool,
}

impl TableColumn {
    /// Create a new sortable column.
    #[must_use]
    pub const fn sortable(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: true,
        }
    }

    /// Create a new non-sortable column.
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            sortable: false,
        }
    }

    /// Keys of the sortable columns in `columns`.
    #[must_use]
    pub fn sortable_keys(columns: &[Self]) -> Vec<&'static str> {
        columns.iter().filter(|c| c.sortable).map(|c| c.key).collect()
    }
}

/// A rendered column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortHeader {
    pub label: &'static str,
    /// Link that toggles sorting on this column; `None` if not sortable.
    pub href: Option<String>,
    /// `"asc"` or `"desc"` when the table is sorted by this column.
    pub active: Option<&'static str>,
}

/// A numbered page or page-size link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub label: String,
    pub href: String,
    pub current: bool,
}

/// Everything a list template needs besides the rows.
#[derive(Debug, Clone)]
pub struct DataTable {
    pub headers: Vec<SortHeader>,
    pub pages: Vec<PageLink>,
    pub page_sizes: Vec<PageLink>,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub query: String,
    /// Current sort, carried by the search form.
    pub sort: String,
    pub dir: &'static str,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub filtered_count: usize,
    pub first_row: usize,
    pub last_row: usize,
    pub search_placeholder: &'static str,
    pub empty_title: &'static str,
}

impl DataTable {
    /// Build the table chrome for `view`, linking back to `path`.
    ///
    /// `extra` holds page-specific filters (`category`, `status`, ...) that
    /// every link must keep.
    #[must_use]
    pub fn new<T>(
        path: &str,
        columns: &[TableColumn],
        state: &ListState,
        view: &ListView<'_, T>,
        extra: &[(&str, &str)],
    ) -> Self {
        let links = Links { path, state, extra };

        let headers = columns
            .iter()
            .map(|column| {
                let sorted_here = state.sort_spec().field == column.key;
                SortHeader {
                    label: column.label,
                    href: column.sortable.then(|| {
                        let mut next = state.clone();
                        next.toggle_sort(column.key);
                        links.with(&next)
                    }),
                    active: sorted_here.then(|| state.sort_spec().direction.as_str()),
                }
            })
            .collect();

        let pages = (1..=view.total_pages)
            .map(|page| PageLink {
                label: page.to_string(),
                href: links.page(page),
                current: page == view.page,
            })
            .collect();

        let page_sizes = PAGE_SIZES
            .iter()
            .map(|&size| {
                let mut next = state.clone();
                next.set_page_size(size);
                PageLink {
                    label: size.to_string(),
                    href: links.with(&next),
                    current: size == view.page_size,
                }
            })
            .collect();

        Self {
            headers,
            pages,
            page_sizes,
            previous: view.has_previous().then(|| links.page(view.page - 1)),
            next: view.has_next().then(|| links.page(view.page + 1)),
            query: state.query().to_string(),
            sort: state.sort_spec().field.clone(),
            dir: state.sort_spec().direction.as_str(),
            page: view.page,
            page_size: view.page_size,
            total_pages: view.total_pages,
            filtered_count: view.filtered_count,
            first_row: view.first_row_number(),
            last_row: view.last_row_number(),
            search_placeholder: "Search...",
            empty_title: "No items found",
        }
    }

    /// Set search placeholder.
    #[must_use]
    pub const fn search_placeholder(mut self, placeholder: &'static str) -> Self {
        self.search_placeholder = placeholder;
        self
    }

    /// Set the empty state title.
    #[must_use]
    pub const fn empty_state(mut self, title: &'static str) -> Self {
        self.empty_title = title;
        self
    }
}

struct Links<'a> {
    path: &'a str,
    state: &'a ListState,
    extra: &'a [(&'a str, &'a str)],
}

impl Links<'_> {
    fn page(&self, page: usize) -> String {
        let mut next = self.state.clone();
        next.set_page(page);
        self.with(&next)
    }

    fn with(&self, state: &ListState) -> String {
        let params = state.to_params();
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.extra {
            if !value.is_empty() {
                query.append_pair(key, value);
            }
        }
        let pairs = [
            ("q", params.q),
            ("sort", params.sort),
            ("dir", params.dir),
            ("per_page", params.per_page),
            ("page", params.page),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                query.append_pair(key, &value);
            }
        }
        format!("{}?{}", self.path, query.finish())
    }
}
