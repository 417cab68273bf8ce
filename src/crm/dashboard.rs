//! Aggregate figures for the dashboard.
//!
//! Each figure is its own query and none of them share a transaction, so under
//! concurrent writes the numbers can describe slightly different moments.

use bigdecimal::BigDecimal;
use diesel::dsl::{count, sum};
use diesel::prelude::*;
use serde::Serialize;

use crate::core::shared::schema::{companies, contacts, deals, tasks};

use super::associations::related_names;
use super::error::CrmError;
use super::storage::{deals_from_rows, tasks_from_rows, DbContact, DbDeal, DbTask};
use super::types::{Contact, ContactView, DealStage, DealView, TaskStatus, TaskView};
use super::{contacts as contact_store, deals as deal_store};

pub const RECENT_LIMIT: i64 = 5;
pub const UPCOMING_LIMIT: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_contacts: i64,
    pub total_companies: i64,
    pub total_deals: i64,
    pub active_tasks: i64,
    pub deals_value: BigDecimal,
    pub won_deals_value: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub stage: DealStage,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub recent_contacts: Vec<ContactView>,
    pub recent_deals: Vec<DealView>,
    pub upcoming_tasks: Vec<TaskView>,
    pub deal_stages: Vec<StageCount>,
}

pub fn snapshot(conn: &mut PgConnection) -> Result<DashboardSnapshot, CrmError> {
    Ok(DashboardSnapshot {
        stats: stats(conn)?,
        recent_contacts: recent_contacts(conn)?,
        recent_deals: recent_deals(conn)?,
        upcoming_tasks: upcoming_tasks(conn)?,
        deal_stages: deal_stages(conn)?,
    })
}

pub fn stats(conn: &mut PgConnection) -> Result<DashboardStats, CrmError> {
    let total_contacts: i64 = contacts::table.count().get_result(conn)?;
    let total_companies: i64 = companies::table.count().get_result(conn)?;
    let total_deals: i64 = deals::table.count().get_result(conn)?;

    let active_tasks: i64 = tasks::table
        .filter(tasks::status.eq_any(active_statuses()))
        .count()
        .get_result(conn)?;

    let deals_value: Option<BigDecimal> = deals::table
        .filter(deals::stage.eq_any(pipeline_stages()))
        .select(sum(deals::amount))
        .first(conn)?;

    let won_deals_value: Option<BigDecimal> = deals::table
        .filter(deals::stage.eq(DealStage::ClosedWon.as_str()))
        .select(sum(deals::amount))
        .first(conn)?;

    Ok(DashboardStats {
        total_contacts,
        total_companies,
        total_deals,
        active_tasks,
        deals_value: money(deals_value),
        won_deals_value: money(won_deals_value),
    })
}

pub fn recent_contacts(conn: &mut PgConnection) -> Result<Vec<ContactView>, CrmError> {
    let rows: Vec<DbContact> = contacts::table
        .order((contacts::created_at.desc(), contacts::id.desc()))
        .limit(RECENT_LIMIT)
        .load(conn)?;
    contact_store::attach_companies(conn, rows.into_iter().map(Contact::from).collect())
}

pub fn recent_deals(conn: &mut PgConnection) -> Result<Vec<DealView>, CrmError> {
    let rows: Vec<DbDeal> = deals::table
        .order((deals::created_at.desc(), deals::id.desc()))
        .limit(RECENT_LIMIT)
        .load(conn)?;
    deal_store::attach_parties(conn, deals_from_rows(rows)?)
}

/// Open tasks, soonest due first.
pub fn upcoming_tasks(conn: &mut PgConnection) -> Result<Vec<TaskView>, CrmError> {
    let rows: Vec<DbTask> = tasks::table
        .filter(tasks::status.eq_any(active_statuses()))
        .order((tasks::due_date.asc(), tasks::id.asc()))
        .limit(UPCOMING_LIMIT)
        .load(conn)?;
    related_names(conn, tasks_from_rows(rows)?)
}

pub fn deal_stages(conn: &mut PgConnection) -> Result<Vec<StageCount>, CrmError> {
    let rows: Vec<(String, i64)> = deals::table
        .group_by(deals::stage)
        .select((deals::stage, count(deals::id)))
        .load(conn)?;
    stage_counts(rows)
}

/// Stage names whose deals add to the pipeline value.
pub fn pipeline_stages() -> Vec<&'static str> {
    DealStage::ALL
        .into_iter()
        .filter(|stage| stage.counts_toward_pipeline())
        .map(DealStage::as_str)
        .collect()
}

pub fn active_statuses() -> Vec<&'static str> {
    TaskStatus::ALL
        .into_iter()
        .filter(|status| status.is_active())
        .map(TaskStatus::as_str)
        .collect()
}

/// Parses grouped rows into pipeline order.
pub fn stage_counts(rows: Vec<(String, i64)>) -> Result<Vec<StageCount>, CrmError> {
    let mut counts = rows
        .into_iter()
        .map(|(stage, count)| {
            let stage = stage
                .parse::<DealStage>()
                .map_err(|e| CrmError::Internal(e.to_string()))?;
            Ok(StageCount { stage, count })
        })
        .collect::<Result<Vec<_>, CrmError>>()?;
    counts.sort_by_key(|c| c.stage);
    Ok(counts)
}

/// `SUM` over no rows is NULL; report it as zero.
fn money(total: Option<BigDecimal>) -> BigDecimal {
    total.unwrap_or_else(|| BigDecimal::from(0)).with_scale(2)
}
