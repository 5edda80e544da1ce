use serde::Deserialize;

use crate::errors::AppError;
use crate::store::Window;

/// Raw `page` / `limit` query parameters. Signed so that out-of-range values
/// reach validation instead of failing deserialization.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated 1-based pagination settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Result<Self, AppError> {
        if page < 1 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if limit < 1 {
            return Err(AppError::Validation("limit must be at least 1".to_string()));
        }
        Ok(Pagination {
            page: page as u64,
            limit: limit as u64,
        })
    }

    pub fn from_query(query: &PaginationQuery, default_limit: u32) -> Result<Self, AppError> {
        Self::new(
            query.page.unwrap_or(1),
            query.limit.unwrap_or(i64::from(default_limit)),
        )
    }

    pub fn window(&self) -> Window {
        Window {
            skip: (self.page - 1).saturating_mul(self.limit),
            limit: self.limit,
        }
    }

    /// Number of pages needed for `total` items; zero when there are none.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_skips_previous_pages() {
        let pagination = Pagination::new(3, 10).unwrap();
        assert_eq!(pagination.window(), Window { skip: 20, limit: 10 });
        assert_eq!(Pagination::new(1, 10).unwrap().window().skip, 0);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let pagination = Pagination::new(1, 10).unwrap();
        assert_eq!(pagination.total_pages(25), 3);
        assert_eq!(pagination.total_pages(30), 3);
        assert_eq!(pagination.total_pages(1), 1);
        assert_eq!(pagination.total_pages(0), 0);
    }

    #[test]
    fn test_rejects_non_positive_values() {
        assert!(matches!(Pagination::new(0, 10), Err(AppError::Validation(_))));
        assert!(matches!(Pagination::new(1, 0), Err(AppError::Validation(_))));
        assert!(matches!(Pagination::new(-4, 10), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_query_defaults() {
        let pagination = Pagination::from_query(&PaginationQuery::default(), 10).unwrap();
        assert_eq!(pagination, Pagination { page: 1, limit: 10 });
    }
}
