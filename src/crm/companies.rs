use chrono::Utc;
use diesel::prelude::*;
use log::info;
use std::collections::HashMap;

use crate::core::shared::schema::{companies, contacts, deals};

use super::error::CrmError;
use super::pagination::{Page, PageRequest};
use super::storage::{deals_from_rows, CompanyChanges, DbCompany, DbContact, DbDeal, NewCompany};
use super::types::{Company, CompanyDetail, Contact, RawPayload};
use super::validation::{validate_company, WriteKind};

const ENTITY: &str = "Company";

pub fn list(conn: &mut PgConnection, request: PageRequest) -> Result<Page<Company>, CrmError> {
    let total: i64 = companies::table.count().get_result(conn)?;
    let rows: Vec<DbCompany> = companies::table
        .order((companies::created_at.desc(), companies::id.desc()))
        .offset(request.offset())
        .limit(request.limit())
        .load(conn)?;
    let data = rows.into_iter().map(Company::from).collect();
    Ok(Page::new(data, request, total))
}

pub fn find(conn: &mut PgConnection, id: i64) -> Result<Company, CrmError> {
    let row: Option<DbCompany> = companies::table.find(id).first(conn).optional()?;
    row.map(Company::from)
        .ok_or_else(|| CrmError::not_found(ENTITY, id))
}

/// Companies among `ids`, keyed by id.
pub fn find_many(conn: &mut PgConnection, ids: &[i64]) -> Result<HashMap<i64, Company>, CrmError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<DbCompany> = companies::table
        .filter(companies::id.eq_any(ids))
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|row| (row.id, Company::from(row)))
        .collect())
}

/// The company with its contacts and deals, newest first.
pub fn get(conn: &mut PgConnection, id: i64) -> Result<CompanyDetail, CrmError> {
    let company = find(conn, id)?;

    let contact_rows: Vec<DbContact> = contacts::table
        .filter(contacts::company_id.eq(id))
        .order((contacts::created_at.desc(), contacts::id.desc()))
        .load(conn)?;
    let deal_rows: Vec<DbDeal> = deals::table
        .filter(deals::company_id.eq(id))
        .order((deals::created_at.desc(), deals::id.desc()))
        .load(conn)?;

    Ok(CompanyDetail {
        company,
        contacts: contact_rows.into_iter().map(Contact::from).collect(),
        deals: deals_from_rows(deal_rows)?,
    })
}

pub fn create(conn: &mut PgConnection, payload: &RawPayload) -> Result<Company, CrmError> {
    let company = conn.transaction::<_, CrmError, _>(|conn| {
        let input = validate_company(payload, WriteKind::Create)?;
        let row: DbCompany = diesel::insert_into(companies::table)
            .values(&NewCompany::from_input(input, Utc::now()))
            .get_result(conn)?;
        Ok(Company::from(row))
    })?;

    info!("Created company {} ({})", company.id, company.name);
    Ok(company)
}

pub fn update(conn: &mut PgConnection, id: i64, payload: &RawPayload) -> Result<Company, CrmError> {
    let company = conn.transaction::<_, CrmError, _>(|conn| {
        find(conn, id)?;
        let input = validate_company(payload, WriteKind::Update)?;
        let row: DbCompany = diesel::update(companies::table.find(id))
            .set(&CompanyChanges::from_input(input, Utc::now()))
            .get_result(conn)?;
        Ok(Company::from(row))
    })?;

    info!("Updated company {}", company.id);
    Ok(company)
}

/// Contacts and deals of the company keep existing with `company_id` cleared.
pub fn delete(conn: &mut PgConnection, id: i64) -> Result<(), CrmError> {
    let deleted = diesel::delete(companies::table.find(id)).execute(conn)?;
    if deleted == 0 {
        return Err(CrmError::not_found(ENTITY, id));
    }
    info!("Deleted company {id}");
    Ok(())
}
