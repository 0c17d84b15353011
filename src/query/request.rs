use serde::Deserialize;

use crate::storage::{PageRequest, SortDirection, SortSpec};

/// Listing parameters as they arrive from a caller.
///
/// `page` is zero-indexed. Missing values fall back to the listing's
/// defaults; `size` is clamped to `[1, max_size]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<usize>,
    pub size: Option<usize>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    pub fn page_request(&self, default_sort: &str, default_size: usize, max_size: usize) -> PageRequest {
        let size = self.size.unwrap_or(default_size).clamp(1, max_size.max(1));
        let field = self
            .sort_by
            .as_deref()
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .unwrap_or(default_sort);
        let direction = self
            .sort_dir
            .as_deref()
            .and_then(|dir| dir.parse().ok())
            .unwrap_or(SortDirection::Asc);

        PageRequest::new(self.page.unwrap_or(0), size).sorted(SortSpec {
            field: field.to_string(),
            direction,
        })
    }
}
