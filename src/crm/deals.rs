use chrono::Utc;
use diesel::prelude::*;
use log::info;

use crate::core::shared::schema::deals;

use super::associations::{related_names, tasks_for};
use super::error::CrmError;
use super::pagination::{Page, PageRequest};
use super::storage::{deals_from_rows, DbDeal, DealChanges, NewDeal};
use super::types::{Deal, DealDetail, DealView, RawPayload, RelatedType};
use super::validation::{validate_deal, WriteKind};
use super::{companies, contacts};

const ENTITY: &str = "Deal";

pub fn list(conn: &mut PgConnection, request: PageRequest) -> Result<Page<DealView>, CrmError> {
    let total: i64 = deals::table.count().get_result(conn)?;
    let rows: Vec<DbDeal> = deals::table
        .order((deals::created_at.desc(), deals::id.desc()))
        .offset(request.offset())
        .limit(request.limit())
        .load(conn)?;
    let data = attach_parties(conn, deals_from_rows(rows)?)?;
    Ok(Page::new(data, request, total))
}

/// Loads contacts and companies for all `deals`, one query per table.
pub fn attach_parties(conn: &mut PgConnection, deals: Vec<Deal>) -> Result<Vec<DealView>, CrmError> {
    let contact_ids: Vec<i64> = deals.iter().map(|d| d.contact_id).collect();
    let company_ids: Vec<i64> = deals.iter().filter_map(|d| d.company_id).collect();
    let contacts = contacts::find_many(conn, &contact_ids)?;
    let companies = companies::find_many(conn, &company_ids)?;

    Ok(deals
        .into_iter()
        .map(|deal| DealView {
            contact: contacts.get(&deal.contact_id).cloned(),
            company: deal.company_id.and_then(|id| companies.get(&id).cloned()),
            deal,
        })
        .collect())
}

pub fn find(conn: &mut PgConnection, id: i64) -> Result<Deal, CrmError> {
    let row: Option<DbDeal> = deals::table.find(id).first(conn).optional()?;
    row.map(Deal::try_from)
        .transpose()?
        .ok_or_else(|| CrmError::not_found(ENTITY, id))
}

pub fn get(conn: &mut PgConnection, id: i64) -> Result<DealDetail, CrmError> {
    let deal = find(conn, id)?;
    let contact = contacts::find_many(conn, &[deal.contact_id])?.remove(&deal.contact_id);
    let company = match deal.company_id {
        Some(company_id) => companies::find_many(conn, &[company_id])?.remove(&company_id),
        None => None,
    };

    let tasks = tasks_for(conn, RelatedType::Deal, id)?;
    let tasks = related_names(conn, tasks)?;

    Ok(DealDetail {
        deal,
        contact,
        company,
        tasks,
    })
}

pub fn create(conn: &mut PgConnection, payload: &RawPayload) -> Result<Deal, CrmError> {
    let deal = conn.transaction::<_, CrmError, _>(|conn| {
        let input = validate_deal(payload, WriteKind::Create, conn)?;
        let row: DbDeal = diesel::insert_into(deals::table)
            .values(&NewDeal::from_input(input, Utc::now()))
            .get_result(conn)
            .map_err(CrmError::from_write)?;
        Deal::try_from(row)
    })?;

    info!("Created deal {} ({}, {})", deal.id, deal.stage, deal.amount);
    Ok(deal)
}

pub fn update(conn: &mut PgConnection, id: i64, payload: &RawPayload) -> Result<Deal, CrmError> {
    let deal = conn.transaction::<_, CrmError, _>(|conn| {
        find(conn, id)?;
        let input = validate_deal(payload, WriteKind::Update, conn)?;
        let row: DbDeal = diesel::update(deals::table.find(id))
            .set(&DealChanges::from_input(input, Utc::now()))
            .get_result(conn)
            .map_err(CrmError::from_write)?;
        Deal::try_from(row)
    })?;

    info!("Updated deal {} ({})", deal.id, deal.stage);
    Ok(deal)
}

pub fn delete(conn: &mut PgConnection, id: i64) -> Result<(), CrmError> {
    let deleted = diesel::delete(deals::table.find(id)).execute(conn)?;
    if deleted == 0 {
        return Err(CrmError::not_found(ENTITY, id));
    }
    info!("Deleted deal {id}");
    Ok(())
}
