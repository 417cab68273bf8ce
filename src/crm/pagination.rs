use serde::{Deserialize, Serialize};

pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Page numbers start at 1; anything lower is read as the first page.
    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(default_per_page)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: i64,
    pub per_page: i64,
    pub total: i64,
    pub last_page: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        let last_page = ((total + request.per_page - 1) / request.per_page).max(1);
        Self {
            data,
            current_page: request.page,
            per_page: request.per_page,
            total,
            last_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_clamping() {
        let request = PageRequest::new(None, None, 10);
        assert_eq!(request, PageRequest { page: 1, per_page: 10 });
        assert_eq!(request.offset(), 0);

        let request = PageRequest::new(Some(0), Some(500), 10);
        assert_eq!(request.page, 1);
        assert_eq!(request.per_page, MAX_PER_PAGE);

        let request = PageRequest::new(Some(3), Some(-4), 10);
        assert_eq!(request.per_page, 1);
        assert_eq!(request.offset(), 2);
    }

    #[test]
    fn test_last_page() {
        let request = PageRequest::new(Some(2), Some(10), 10);
        assert_eq!(Page::<i32>::new(vec![], request, 0).last_page, 1);
        assert_eq!(Page::<i32>::new(vec![], request, 10).last_page, 1);
        assert_eq!(Page::<i32>::new(vec![], request, 11).last_page, 2);
        assert_eq!(request.offset(), 10);
    }
}
