//! Task ownership.
//!
//! A task points at either a contact or a deal through `(related_type, related_id)`.
//! The database cannot enforce that pair, so existence is checked on write and a
//! missing owner on read resolves to a fallback name instead of an error.

use diesel::prelude::*;
use log::debug;

use crate::core::shared::schema::tasks;

use super::error::{CrmError, ValidationErrors};
use super::lookup::RecordLookup;
use super::storage::{tasks_from_rows, DbTask};
use super::types::{Contact, Deal, RelatedType, Task, TaskOwner, TaskView};

pub const UNKNOWN_CONTACT: &str = "Unknown Contact";
pub const UNKNOWN_DEAL: &str = "Unknown Deal";

/// The record a task belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnerRecord {
    Contact(Contact),
    Deal(Deal),
}

impl OwnerRecord {
    pub fn display_name(&self) -> &str {
        match self {
            OwnerRecord::Contact(contact) => &contact.name,
            OwnerRecord::Deal(deal) => &deal.name,
        }
    }
}

pub fn fallback_name(kind: RelatedType) -> &'static str {
    match kind {
        RelatedType::Contact => UNKNOWN_CONTACT,
        RelatedType::Deal => UNKNOWN_DEAL,
    }
}

/// `Ok(None)` when the owner has been deleted.
pub fn resolve_owner<L>(lookup: &mut L, owner: TaskOwner) -> Result<Option<OwnerRecord>, CrmError>
where
    L: RecordLookup + ?Sized,
{
    let record = match owner {
        TaskOwner::Contact(id) => lookup.find_contact(id)?.map(OwnerRecord::Contact),
        TaskOwner::Deal(id) => lookup.find_deal(id)?.map(OwnerRecord::Deal),
    };
    if record.is_none() {
        debug!("Task owner {} {} no longer exists", owner.kind(), owner.id());
    }
    Ok(record)
}

pub fn related_name<L>(lookup: &mut L, owner: TaskOwner) -> Result<String, CrmError>
where
    L: RecordLookup + ?Sized,
{
    Ok(resolve_owner(lookup, owner)?
        .map(|record| record.display_name().to_string())
        .unwrap_or_else(|| fallback_name(owner.kind()).to_string()))
}

/// Attaches `related_name` to each task with one lookup per owner kind.
pub fn related_names<L>(lookup: &mut L, tasks: Vec<Task>) -> Result<Vec<TaskView>, CrmError>
where
    L: RecordLookup + ?Sized,
{
    let mut contact_ids = Vec::new();
    let mut deal_ids = Vec::new();
    for task in &tasks {
        match task.owner {
            TaskOwner::Contact(id) => contact_ids.push(id),
            TaskOwner::Deal(id) => deal_ids.push(id),
        }
    }
    contact_ids.sort_unstable();
    contact_ids.dedup();
    deal_ids.sort_unstable();
    deal_ids.dedup();

    let contact_names = lookup.contact_names(&contact_ids)?;
    let deal_names = lookup.deal_names(&deal_ids)?;

    Ok(tasks
        .into_iter()
        .map(|task| {
            let name = match task.owner {
                TaskOwner::Contact(id) => contact_names.get(&id),
                TaskOwner::Deal(id) => deal_names.get(&id),
            };
            let related_name = name
                .cloned()
                .unwrap_or_else(|| fallback_name(task.owner.kind()).to_string());
            TaskView { task, related_name }
        })
        .collect())
}

/// Tasks attached to one contact or deal, soonest due first.
pub fn tasks_for(conn: &mut PgConnection, kind: RelatedType, id: i64) -> Result<Vec<Task>, CrmError> {
    let rows: Vec<DbTask> = tasks::table
        .filter(tasks::related_type.eq(kind.as_str()))
        .filter(tasks::related_id.eq(id))
        .order((tasks::due_date.asc(), tasks::id.asc()))
        .load(conn)?;
    tasks_from_rows(rows)
}

/// Records a `related_id` error when the owner does not exist.
pub fn validate_owner_exists<L>(
    lookup: &mut L,
    owner: TaskOwner,
    errors: &mut ValidationErrors,
) -> Result<(), CrmError>
where
    L: RecordLookup + ?Sized,
{
    let (exists, message) = match owner {
        TaskOwner::Contact(id) => (lookup.contact_exists(id)?, "Selected contact does not exist."),
        TaskOwner::Deal(id) => (lookup.deal_exists(id)?, "Selected deal does not exist."),
    };
    if !exists {
        errors.add("related_id", message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::lookup::memory::MemoryLookup;
    use crate::crm::types::TaskStatus;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn task(id: i64, owner: TaskOwner) -> Task {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Task {
            id,
            description: format!("task {id}"),
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            status: TaskStatus::ToDo,
            owner,
            created_at: at,
            updated_at: at,
        }
    }

    fn lookup() -> MemoryLookup {
        MemoryLookup::default()
            .with_contact(7, "Ada Lovelace")
            .with_deal(3, "Analytical Engine", 7)
    }

    #[test]
    fn test_resolve_owner_dispatches_on_kind() {
        let mut lookup = lookup();
        let contact = resolve_owner(&mut lookup, TaskOwner::Contact(7)).unwrap().unwrap();
        assert_eq!(contact.display_name(), "Ada Lovelace");

        let deal = resolve_owner(&mut lookup, TaskOwner::Deal(3)).unwrap().unwrap();
        assert!(matches!(deal, OwnerRecord::Deal(_)));

        // Same id, other table.
        assert!(resolve_owner(&mut lookup, TaskOwner::Deal(7)).unwrap().is_none());
    }

    #[test]
    fn test_orphaned_owner_uses_fallback() {
        let mut lookup = lookup();
        assert_eq!(
            related_name(&mut lookup, TaskOwner::Contact(99)).unwrap(),
            UNKNOWN_CONTACT
        );
        assert_eq!(related_name(&mut lookup, TaskOwner::Deal(99)).unwrap(), UNKNOWN_DEAL);
        assert_eq!(
            related_name(&mut lookup, TaskOwner::Deal(3)).unwrap(),
            "Analytical Engine"
        );
    }

    #[test]
    fn test_related_names_batches_lookups() {
        let mut lookup = lookup();
        let tasks = vec![
            task(1, TaskOwner::Contact(7)),
            task(2, TaskOwner::Contact(7)),
            task(3, TaskOwner::Deal(3)),
            task(4, TaskOwner::Deal(42)),
            task(5, TaskOwner::Contact(8)),
        ];
        let views = related_names(&mut lookup, tasks).unwrap();

        assert_eq!(lookup.calls, 2);
        let names: Vec<_> = views.iter().map(|v| v.related_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Ada Lovelace",
                "Ada Lovelace",
                "Analytical Engine",
                UNKNOWN_DEAL,
                UNKNOWN_CONTACT
            ]
        );
        assert_eq!(views[3].task.id, 4);
    }

    #[test]
    fn test_related_names_empty() {
        let mut lookup = lookup();
        assert!(related_names(&mut lookup, Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_validate_owner_exists() {
        let mut lookup = lookup();
        let mut errors = ValidationErrors::new();
        validate_owner_exists(&mut lookup, TaskOwner::Contact(7), &mut errors).unwrap();
        assert!(errors.is_empty());

        validate_owner_exists(&mut lookup, TaskOwner::Contact(3), &mut errors).unwrap();
        assert_eq!(
            errors.get("related_id").unwrap(),
            ["Selected contact does not exist."]
        );

        let mut errors = ValidationErrors::new();
        validate_owner_exists(&mut lookup, TaskOwner::Deal(8), &mut errors).unwrap();
        assert_eq!(errors.get("related_id").unwrap(), ["Selected deal does not exist."]);
    }
}
