use diesel::prelude::*;

use crate::core::shared::schema::{companies, contacts, deals};

use super::error::CrmError;
use super::types::{Choice, Choices};

/// Every company, contact and deal as `(id, name)`, ordered by name, for form selects.
pub fn choices(conn: &mut PgConnection) -> Result<Choices, CrmError> {
    let companies: Vec<(i64, String)> = companies::table
        .select((companies::id, companies::name))
        .order((companies::name.asc(), companies::id.asc()))
        .load(conn)?;
    let contacts: Vec<(i64, String)> = contacts::table
        .select((contacts::id, contacts::name))
        .order((contacts::name.asc(), contacts::id.asc()))
        .load(conn)?;
    let deals: Vec<(i64, String)> = deals::table
        .select((deals::id, deals::name))
        .order((deals::name.asc(), deals::id.asc()))
        .load(conn)?;

    Ok(Choices {
        companies: to_choices(companies),
        contacts: to_choices(contacts),
        deals: to_choices(deals),
    })
}

fn to_choices(rows: Vec<(i64, String)>) -> Vec<Choice> {
    rows.into_iter()
        .map(|(id, name)| Choice { id, name })
        .collect()
}
