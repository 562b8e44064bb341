// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Page of mapped results with count metadata.
//!
//! Serializes as `{"total": .., "page": .., "size": .., "data": [..]}`.

use serde::Serialize;

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<M> {
    total: u64,
    #[serde(rename = "page")]
    current_page: u64,
    #[serde(rename = "size")]
    per_page: u64,
    #[serde(rename = "data")]
    items: Vec<M>,
}

impl<M> PageResult<M> {
    /// Wrap a fetched batch. Items beyond `per_page` are dropped.
    pub fn wrap(mut items: Vec<M>, per_page: u64, current_page: u64, total: u64) -> Self {
        let keep = usize::try_from(per_page).unwrap_or(usize::MAX);
        items.truncate(keep);
        Self {
            total,
            current_page,
            per_page,
            items,
        }
    }

    /// Whether matches exist beyond this page.
    ///
    /// Derived from the engine's total, not from the batch length.
    pub fn has_more_pages(&self) -> bool {
        self.total > self.current_page.saturating_mul(self.per_page)
    }

    /// Last page number (at least 1).
    pub fn last_page(&self) -> u64 {
        if self.per_page == 0 {
            return 1;
        }
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn items(&self) -> &[M] {
        &self.items
    }

    pub fn into_items(self) -> Vec<M> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_has_more_from_total() {
        let page = PageResult::wrap(vec![1; 10], 10, 1, 25);
        assert!(page.has_more_pages());

        let page = PageResult::wrap(vec![1; 5], 10, 3, 25);
        assert!(!page.has_more_pages());

        // Exactly full
        let page = PageResult::wrap(vec![1; 10], 10, 2, 20);
        assert!(!page.has_more_pages());
    }

    #[test]
    fn test_wrap_trims_overfetch() {
        let page = PageResult::wrap(vec![1, 2, 3, 4], 3, 1, 4);
        assert_eq!(page.items(), &[1, 2, 3]);
        assert!(page.has_more_pages());
    }

    #[test]
    fn test_last_page() {
        assert_eq!(PageResult::wrap(Vec::<u8>::new(), 10, 1, 0).last_page(), 1);
        assert_eq!(PageResult::wrap(Vec::<u8>::new(), 10, 1, 25).last_page(), 3);
        assert_eq!(PageResult::wrap(Vec::<u8>::new(), 10, 1, 30).last_page(), 3);
    }

    #[test]
    fn test_serialize_shape() {
        let page = PageResult::wrap(vec!["a", "b"], 2, 1, 9);
        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({"total": 9, "page": 1, "size": 2, "data": ["a", "b"]})
        );
    }
}
