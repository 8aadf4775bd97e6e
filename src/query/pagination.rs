//! Pagination window math and next/prev page descriptors.

use serde::Serialize;

pub const DEFAULT_LIMIT: i64 = 25;

/// A clamped page request. `page` is at least 1, `limit` is between 1
/// and the configured maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>, max_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, max_limit),
        }
    }

    pub fn skip(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn take(&self) -> i64 {
        self.limit
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageLink {
    pub page: i64,
    pub limit: i64,
}

/// `next`/`prev` are omitted from the serialized form when
/// inapplicable, so their presence itself signals availability.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

pub fn plan(request: PageRequest, total: i64) -> Pagination {
    let mut pagination = Pagination::default();
    if request.skip() + request.take() < total {
        pagination.next = Some(PageLink {
            page: request.page + 1,
            limit: request.limit,
        });
    }
    if request.page > 1 {
        pagination.prev = Some(PageLink {
            page: request.page - 1,
            limit: request.limit,
        });
    }
    pagination
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let req = PageRequest::new(None, None, 100);
        assert_eq!(req, PageRequest { page: 1, limit: 25 });

        let req = PageRequest::new(Some(0), Some(1000), 100);
        assert_eq!(req, PageRequest { page: 1, limit: 100 });

        let req = PageRequest::new(Some(-3), Some(0), 100);
        assert_eq!(req, PageRequest { page: 1, limit: 1 });
    }

    #[test]
    fn skip_is_page_minus_one_times_limit() {
        let req = PageRequest::new(Some(3), Some(5), 100);
        assert_eq!(req.skip(), 10);
        assert_eq!(req.take(), 5);
    }

    #[test]
    fn first_page_of_twelve_with_limit_five() {
        let pagination = plan(PageRequest::new(Some(1), Some(5), 100), 12);
        assert_eq!(pagination.next, Some(PageLink { page: 2, limit: 5 }));
        assert_eq!(pagination.prev, None);
    }

    #[test]
    fn last_partial_page_has_prev_but_no_next() {
        let pagination = plan(PageRequest::new(Some(3), Some(5), 100), 12);
        assert_eq!(pagination.next, None);
        assert_eq!(pagination.prev, Some(PageLink { page: 2, limit: 5 }));
    }

    #[test]
    fn exact_fit_has_no_next() {
        let pagination = plan(PageRequest::new(Some(2), Some(5), 100), 10);
        assert_eq!(pagination.next, None);
        assert_eq!(pagination.prev, Some(PageLink { page: 1, limit: 5 }));
    }

    #[test]
    fn single_page_omits_both_links() {
        let pagination = plan(PageRequest::new(None, None, 100), 10);
        assert_eq!(pagination, Pagination::default());

        // Omitted fields must not serialize as nulls
        let encoded = serde_json::to_string(&pagination).unwrap();
        assert_eq!(encoded, "{}");
    }

    #[test]
    fn empty_result_set() {
        let pagination = plan(PageRequest::new(Some(1), Some(25), 100), 0);
        assert_eq!(pagination, Pagination::default());
    }
}
