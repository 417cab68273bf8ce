pub mod companies;
pub mod contacts;
pub mod dashboard;
pub mod deals;
pub mod tasks;

use serde::Deserialize;

use crate::core::shared::state::AppState;
use crate::crm::pagination::PageRequest;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListQuery {
    pub fn page_request(&self, state: &AppState) -> PageRequest {
        PageRequest::new(self.page, self.per_page, state.config.crm.page_size)
    }
}
