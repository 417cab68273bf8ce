use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use log::info;

use crate::core::shared::schema::tasks;

use super::associations::{related_name, related_names};
use super::error::CrmError;
use super::pagination::{Page, PageRequest};
use super::storage::{tasks_from_rows, DbTask, NewTask, TaskChanges};
use super::types::{RawPayload, Task, TaskView};
use super::validation::validate_task;

const ENTITY: &str = "Task";

/// Tasks by due date, latest first.
pub fn list(conn: &mut PgConnection, request: PageRequest) -> Result<Page<TaskView>, CrmError> {
    let total: i64 = tasks::table.count().get_result(conn)?;
    let rows: Vec<DbTask> = tasks::table
        .order((tasks::due_date.desc(), tasks::id.desc()))
        .offset(request.offset())
        .limit(request.limit())
        .load(conn)?;
    let data = related_names(conn, tasks_from_rows(rows)?)?;
    Ok(Page::new(data, request, total))
}

pub fn find(conn: &mut PgConnection, id: i64) -> Result<Task, CrmError> {
    let row: Option<DbTask> = tasks::table.find(id).first(conn).optional()?;
    row.map(Task::try_from)
        .transpose()?
        .ok_or_else(|| CrmError::not_found(ENTITY, id))
}

pub fn get(conn: &mut PgConnection, id: i64) -> Result<TaskView, CrmError> {
    let task = find(conn, id)?;
    let related_name = related_name(conn, task.owner)?;
    Ok(TaskView { task, related_name })
}

/// `today` is the earliest due date accepted.
pub fn create(conn: &mut PgConnection, payload: &RawPayload, today: NaiveDate) -> Result<Task, CrmError> {
    let task = conn.transaction::<_, CrmError, _>(|conn| {
        let input = validate_task(payload, today, conn)?;
        let row: DbTask = diesel::insert_into(tasks::table)
            .values(&NewTask::from_input(input, Utc::now()))
            .get_result(conn)?;
        Task::try_from(row)
    })?;

    info!(
        "Created task {} for {} {}",
        task.id,
        task.owner.kind(),
        task.owner.id()
    );
    Ok(task)
}

pub fn update(
    conn: &mut PgConnection,
    id: i64,
    payload: &RawPayload,
    today: NaiveDate,
) -> Result<Task, CrmError> {
    let task = conn.transaction::<_, CrmError, _>(|conn| {
        find(conn, id)?;
        let input = validate_task(payload, today, conn)?;
        let row: DbTask = diesel::update(tasks::table.find(id))
            .set(&TaskChanges::from_input(input, Utc::now()))
            .get_result(conn)?;
        Task::try_from(row)
    })?;

    info!("Updated task {} ({})", task.id, task.status);
    Ok(task)
}

pub fn delete(conn: &mut PgConnection, id: i64) -> Result<(), CrmError> {
    let deleted = diesel::delete(tasks::table.find(id)).execute(conn)?;
    if deleted == 0 {
        return Err(CrmError::not_found(ENTITY, id));
    }
    info!("Deleted task {id}");
    Ok(())
}
