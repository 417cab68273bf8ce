use diesel::dsl::exists;
use diesel::prelude::*;
use std::collections::HashMap;

use crate::core::shared::schema::{companies, contacts, deals};

use super::error::CrmError;
use super::storage::{DbCompany, DbContact, DbDeal};
use super::types::{Company, Contact, Deal};

/// Read access to the records other entities point at.
///
/// Validation and task-owner resolution only ever need these lookups, so they are
/// written against this trait rather than a concrete connection.
pub trait RecordLookup {
    fn find_company(&mut self, id: i64) -> Result<Option<Company>, CrmError>;

    fn find_contact(&mut self, id: i64) -> Result<Option<Contact>, CrmError>;

    fn find_deal(&mut self, id: i64) -> Result<Option<Deal>, CrmError>;

    /// Names of the contacts that exist among `ids`. Missing ids are simply absent.
    fn contact_names(&mut self, ids: &[i64]) -> Result<HashMap<i64, String>, CrmError>;

    /// Names of the deals that exist among `ids`. Missing ids are simply absent.
    fn deal_names(&mut self, ids: &[i64]) -> Result<HashMap<i64, String>, CrmError>;

    fn company_exists(&mut self, id: i64) -> Result<bool, CrmError> {
        Ok(self.find_company(id)?.is_some())
    }

    fn contact_exists(&mut self, id: i64) -> Result<bool, CrmError> {
        Ok(self.find_contact(id)?.is_some())
    }

    fn deal_exists(&mut self, id: i64) -> Result<bool, CrmError> {
        Ok(self.find_deal(id)?.is_some())
    }
}

impl RecordLookup for PgConnection {
    fn find_company(&mut self, id: i64) -> Result<Option<Company>, CrmError> {
        let row: Option<DbCompany> = companies::table.find(id).first(self).optional()?;
        Ok(row.map(Company::from))
    }

    fn find_contact(&mut self, id: i64) -> Result<Option<Contact>, CrmError> {
        let row: Option<DbContact> = contacts::table.find(id).first(self).optional()?;
        Ok(row.map(Contact::from))
    }

    fn find_deal(&mut self, id: i64) -> Result<Option<Deal>, CrmError> {
        let row: Option<DbDeal> = deals::table.find(id).first(self).optional()?;
        row.map(Deal::try_from).transpose()
    }

    fn contact_names(&mut self, ids: &[i64]) -> Result<HashMap<i64, String>, CrmError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(i64, String)> = contacts::table
            .filter(contacts::id.eq_any(ids))
            .select((contacts::id, contacts::name))
            .load(self)?;
        Ok(rows.into_iter().collect())
    }

    fn deal_names(&mut self, ids: &[i64]) -> Result<HashMap<i64, String>, CrmError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(i64, String)> = deals::table
            .filter(deals::id.eq_any(ids))
            .select((deals::id, deals::name))
            .load(self)?;
        Ok(rows.into_iter().collect())
    }

    fn company_exists(&mut self, id: i64) -> Result<bool, CrmError> {
        Ok(diesel::select(exists(companies::table.find(id))).get_result(self)?)
    }

    fn contact_exists(&mut self, id: i64) -> Result<bool, CrmError> {
        Ok(diesel::select(exists(contacts::table.find(id))).get_result(self)?)
    }

    fn deal_exists(&mut self, id: i64) -> Result<bool, CrmError> {
        Ok(diesel::select(exists(deals::table.find(id))).get_result(self)?)
    }
}
