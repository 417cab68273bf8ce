use chrono::Utc;
use diesel::prelude::*;
use log::info;
use std::collections::HashMap;

use crate::core::shared::schema::{contacts, deals};

use super::associations::{related_names, tasks_for};
use super::companies;
use super::error::CrmError;
use super::pagination::{Page, PageRequest};
use super::storage::{deals_from_rows, ContactChanges, DbContact, DbDeal, NewContact};
use super::types::{Contact, ContactDetail, ContactView, RawPayload, RelatedType};
use super::validation::{validate_contact, WriteKind};

const ENTITY: &str = "Contact";

/// Contacts newest first, each with its company attached.
pub fn list(conn: &mut PgConnection, request: PageRequest) -> Result<Page<ContactView>, CrmError> {
    let total: i64 = contacts::table.count().get_result(conn)?;
    let rows: Vec<DbContact> = contacts::table
        .order((contacts::created_at.desc(), contacts::id.desc()))
        .offset(request.offset())
        .limit(request.limit())
        .load(conn)?;
    let data = attach_companies(conn, rows.into_iter().map(Contact::from).collect())?;
    Ok(Page::new(data, request, total))
}

/// Loads the companies of all `contacts` in one query.
pub fn attach_companies(
    conn: &mut PgConnection,
    contacts: Vec<Contact>,
) -> Result<Vec<ContactView>, CrmError> {
    let ids: Vec<i64> = contacts.iter().filter_map(|c| c.company_id).collect();
    let companies = companies::find_many(conn, &ids)?;
    Ok(contacts
        .into_iter()
        .map(|contact| {
            let company = contact.company_id.and_then(|id| companies.get(&id).cloned());
            ContactView { contact, company }
        })
        .collect())
}

pub fn find(conn: &mut PgConnection, id: i64) -> Result<Contact, CrmError> {
    let row: Option<DbContact> = contacts::table.find(id).first(conn).optional()?;
    row.map(Contact::from)
        .ok_or_else(|| CrmError::not_found(ENTITY, id))
}

pub fn find_many(conn: &mut PgConnection, ids: &[i64]) -> Result<HashMap<i64, Contact>, CrmError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<DbContact> = contacts::table
        .filter(contacts::id.eq_any(ids))
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|row| (row.id, Contact::from(row)))
        .collect())
}

pub fn get(conn: &mut PgConnection, id: i64) -> Result<ContactDetail, CrmError> {
    let contact = find(conn, id)?;
    let company = match contact.company_id {
        Some(company_id) => companies::find_many(conn, &[company_id])?.remove(&company_id),
        None => None,
    };

    let deal_rows: Vec<DbDeal> = deals::table
        .filter(deals::contact_id.eq(id))
        .order((deals::created_at.desc(), deals::id.desc()))
        .load(conn)?;
    let deals = deals_from_rows(deal_rows)?;

    let tasks = tasks_for(conn, RelatedType::Contact, id)?;
    let tasks = related_names(conn, tasks)?;

    Ok(ContactDetail {
        contact,
        company,
        deals,
        tasks,
    })
}

pub fn create(conn: &mut PgConnection, payload: &RawPayload) -> Result<Contact, CrmError> {
    let contact = conn.transaction::<_, CrmError, _>(|conn| {
        let input = validate_contact(payload, WriteKind::Create, conn)?;
        let row: DbContact = diesel::insert_into(contacts::table)
            .values(&NewContact::from_input(input, Utc::now()))
            .get_result(conn)
            .map_err(CrmError::from_write)?;
        Ok(Contact::from(row))
    })?;

    info!("Created contact {} ({})", contact.id, contact.email);
    Ok(contact)
}

pub fn update(conn: &mut PgConnection, id: i64, payload: &RawPayload) -> Result<Contact, CrmError> {
    let contact = conn.transaction::<_, CrmError, _>(|conn| {
        find(conn, id)?;
        let input = validate_contact(payload, WriteKind::Update, conn)?;
        let row: DbContact = diesel::update(contacts::table.find(id))
            .set(&ContactChanges::from_input(input, Utc::now()))
            .get_result(conn)
            .map_err(CrmError::from_write)?;
        Ok(Contact::from(row))
    })?;

    info!("Updated contact {}", contact.id);
    Ok(contact)
}

/// Removes the contact and, through the foreign key, its deals. Tasks pointing at
/// the contact are left in place and resolve to the fallback owner name.
pub fn delete(conn: &mut PgConnection, id: i64) -> Result<(), CrmError> {
    let deleted = diesel::delete(contacts::table.find(id)).execute(conn)?;
    if deleted == 0 {
        return Err(CrmError::not_found(ENTITY, id));
    }
    info!("Deleted contact {id}");
    Ok(())
}
