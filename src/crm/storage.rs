use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use crate::core::shared::schema::{companies, contacts, deals, tasks};

use super::error::CrmError;
use super::types::{
    Company, CompanyInput, Contact, ContactInput, Deal, DealInput, Task, TaskInput, TaskOwner,
};

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = companies)]
pub struct DbCompany {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = companies)]
pub struct NewCompany {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = companies)]
pub struct CompanyChanges {
    pub name: String,
    pub address: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = contacts)]
pub struct DbContact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contacts)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = contacts)]
pub struct ContactChanges {
    pub name: String,
    pub email: String,
    pub phone: Option<Option<String>>,
    pub company_id: Option<Option<i64>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = deals)]
pub struct DbDeal {
    pub id: i64,
    pub name: String,
    pub amount: BigDecimal,
    pub stage: String,
    pub contact_id: i64,
    pub company_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = deals)]
pub struct NewDeal {
    pub name: String,
    pub amount: BigDecimal,
    pub stage: String,
    pub contact_id: i64,
    pub company_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = deals)]
pub struct DealChanges {
    pub name: String,
    pub amount: BigDecimal,
    pub stage: String,
    pub contact_id: i64,
    pub company_id: Option<Option<i64>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = tasks)]
pub struct DbTask {
    pub id: i64,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: String,
    pub related_type: String,
    pub related_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTask {
    pub description: String,
    pub due_date: NaiveDate,
    pub status: String,
    pub related_type: String,
    pub related_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskChanges {
    pub description: String,
    pub due_date: NaiveDate,
    pub status: String,
    pub related_type: String,
    pub related_id: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<DbCompany> for Company {
    fn from(row: DbCompany) -> Self {
        Company {
            id: row.id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            website: row.website,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<DbContact> for Contact {
    fn from(row: DbContact) -> Self {
        Contact {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            company_id: row.company_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl TryFrom<DbDeal> for Deal {
    type Error = CrmError;

    fn try_from(row: DbDeal) -> Result<Self, Self::Error> {
        let stage = row.stage.parse().map_err(|e| {
            CrmError::Internal(format!("deal {} has a corrupt stage: {e}", row.id))
        })?;
        Ok(Deal {
            id: row.id,
            name: row.name,
            amount: row.amount,
            stage,
            contact_id: row.contact_id,
            company_id: row.company_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DbTask> for Task {
    type Error = CrmError;

    fn try_from(row: DbTask) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|e| {
            CrmError::Internal(format!("task {} has a corrupt status: {e}", row.id))
        })?;
        let kind = row.related_type.parse().map_err(|e| {
            CrmError::Internal(format!("task {} has a corrupt related_type: {e}", row.id))
        })?;
        Ok(Task {
            id: row.id,
            description: row.description,
            due_date: row.due_date,
            status,
            owner: TaskOwner::new(kind, row.related_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub fn deals_from_rows(rows: Vec<DbDeal>) -> Result<Vec<Deal>, CrmError> {
    rows.into_iter().map(Deal::try_from).collect()
}

pub fn tasks_from_rows(rows: Vec<DbTask>) -> Result<Vec<Task>, CrmError> {
    rows.into_iter().map(Task::try_from).collect()
}

impl NewCompany {
    pub fn from_input(input: CompanyInput, now: DateTime<Utc>) -> Self {
        NewCompany {
            name: input.name,
            address: input.address.flatten(),
            phone: input.phone.flatten(),
            website: input.website.flatten(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl CompanyChanges {
    pub fn from_input(input: CompanyInput, now: DateTime<Utc>) -> Self {
        CompanyChanges {
            name: input.name,
            address: input.address,
            phone: input.phone,
            website: input.website,
            updated_at: now,
        }
    }
}

impl NewContact {
    pub fn from_input(input: ContactInput, now: DateTime<Utc>) -> Self {
        NewContact {
            name: input.name,
            email: input.email,
            phone: input.phone.flatten(),
            company_id: input.company_id.flatten(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl ContactChanges {
    pub fn from_input(input: ContactInput, now: DateTime<Utc>) -> Self {
        ContactChanges {
            name: input.name,
            email: input.email,
            phone: input.phone,
            company_id: input.company_id,
            updated_at: now,
        }
    }
}

impl NewDeal {
    pub fn from_input(input: DealInput, now: DateTime<Utc>) -> Self {
        NewDeal {
            name: input.name,
            amount: input.amount,
            stage: input.stage.as_str().to_string(),
            contact_id: input.contact_id,
            company_id: input.company_id.flatten(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl DealChanges {
    pub fn from_input(input: DealInput, now: DateTime<Utc>) -> Self {
        DealChanges {
            name: input.name,
            amount: input.amount,
            stage: input.stage.as_str().to_string(),
            contact_id: input.contact_id,
            company_id: input.company_id,
            updated_at: now,
        }
    }
}

impl NewTask {
    pub fn from_input(input: TaskInput, now: DateTime<Utc>) -> Self {
        NewTask {
            description: input.description,
            due_date: input.due_date,
            status: input.status.as_str().to_string(),
            related_type: input.owner.kind().as_str().to_string(),
            related_id: input.owner.id(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl TaskChanges {
    pub fn from_input(input: TaskInput, now: DateTime<Utc>) -> Self {
        TaskChanges {
            description: input.description,
            due_date: input.due_date,
            status: input.status.as_str().to_string(),
            related_type: input.owner.kind().as_str().to_string(),
            related_id: input.owner.id(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::types::{DealStage, TaskStatus};
    use chrono::TimeZone;
    use std::str::FromStr;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_deal_row_conversion() {
        let row = DbDeal {
            id: 1,
            name: "Renewal".to_string(),
            amount: BigDecimal::from_str("1200.50").unwrap(),
            stage: "Closed Won".to_string(),
            contact_id: 4,
            company_id: None,
            created_at: at(),
            updated_at: at(),
        };
        let deal = Deal::try_from(row).unwrap();
        assert_eq!(deal.stage, DealStage::ClosedWon);
        assert_eq!(deal.contact_id, 4);
    }

    #[test]
    fn test_corrupt_deal_stage_is_internal_error() {
        let row = DbDeal {
            id: 9,
            name: "Broken".to_string(),
            amount: BigDecimal::from(1),
            stage: "Won".to_string(),
            contact_id: 4,
            company_id: None,
            created_at: at(),
            updated_at: at(),
        };
        assert!(matches!(Deal::try_from(row), Err(CrmError::Internal(_))));
    }

    #[test]
    fn test_task_row_conversion_builds_owner() {
        let row = DbTask {
            id: 2,
            description: "Send quote".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            status: "To Do".to_string(),
            related_type: "deal".to_string(),
            related_id: 11,
            created_at: at(),
            updated_at: at(),
        };
        let task = Task::try_from(row).unwrap();
        assert_eq!(task.owner, TaskOwner::Deal(11));
        assert_eq!(task.status, TaskStatus::ToDo);
    }

    #[test]
    fn test_create_flattens_omitted_optionals() {
        let input = CompanyInput {
            name: "Acme".to_string(),
            address: None,
            phone: Some(Some("555-0100".to_string())),
            website: Some(None),
        };
        let new = NewCompany::from_input(input.clone(), at());
        assert_eq!(new.address, None);
        assert_eq!(new.phone.as_deref(), Some("555-0100"));
        assert_eq!(new.website, None);

        let changes = CompanyChanges::from_input(input, at());
        assert_eq!(changes.address, None);
        assert_eq!(changes.website, Some(None));
    }

    #[test]
    fn test_new_task_from_input() {
        let input = TaskInput {
            description: "Follow up".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            status: TaskStatus::InProgress,
            owner: TaskOwner::Contact(3),
        };
        let row = NewTask::from_input(input, at());
        assert_eq!(row.related_type, "contact");
        assert_eq!(row.related_id, 3);
        assert_eq!(row.status, "In Progress");
        assert_eq!(row.created_at, row.updated_at);
    }
}
