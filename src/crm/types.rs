use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Field name to raw submitted value, as it arrives from a form or JSON body.
pub type RawPayload = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum DealStage {
    #[default]
    Prospecting,
    Qualification,
    Proposal,
    Negotiation,
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

impl DealStage {
    /// Pipeline order.
    pub const ALL: [DealStage; 6] = [
        DealStage::Prospecting,
        DealStage::Qualification,
        DealStage::Proposal,
        DealStage::Negotiation,
        DealStage::ClosedWon,
        DealStage::ClosedLost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DealStage::Prospecting => "Prospecting",
            DealStage::Qualification => "Qualification",
            DealStage::Proposal => "Proposal",
            DealStage::Negotiation => "Negotiation",
            DealStage::ClosedWon => "Closed Won",
            DealStage::ClosedLost => "Closed Lost",
        }
    }

    /// Open and won deals make up the pipeline value; lost deals do not.
    pub fn counts_toward_pipeline(self) -> bool {
        match self {
            DealStage::Prospecting
            | DealStage::Qualification
            | DealStage::Proposal
            | DealStage::Negotiation
            | DealStage::ClosedWon => true,
            DealStage::ClosedLost => false,
        }
    }

    pub fn is_won(self) -> bool {
        matches!(self, DealStage::ClosedWon)
    }
}

impl std::fmt::Display for DealStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DealStage {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DealStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "deal stage",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::ToDo, TaskStatus::InProgress, TaskStatus::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Still needs doing: shows up in active counts and upcoming lists.
    pub fn is_active(self) -> bool {
        match self {
            TaskStatus::ToDo | TaskStatus::InProgress => true,
            TaskStatus::Completed => false,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "task status",
                value: s.to_string(),
            })
    }
}

/// Which table a task's `related_id` points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedType {
    Contact,
    Deal,
}

impl RelatedType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelatedType::Contact => "contact",
            RelatedType::Deal => "deal",
        }
    }
}

impl std::fmt::Display for RelatedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RelatedType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contact" => Ok(RelatedType::Contact),
            "deal" => Ok(RelatedType::Deal),
            _ => Err(ParseEnumError {
                kind: "related type",
                value: s.to_string(),
            }),
        }
    }
}

/// The record a task hangs off. Stored as a `(related_type, related_id)` column pair
/// and serialized the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "related_type", content = "related_id", rename_all = "lowercase")]
pub enum TaskOwner {
    Contact(i64),
    Deal(i64),
}

impl TaskOwner {
    pub fn new(kind: RelatedType, id: i64) -> Self {
        match kind {
            RelatedType::Contact => TaskOwner::Contact(id),
            RelatedType::Deal => TaskOwner::Deal(id),
        }
    }

    pub fn kind(self) -> RelatedType {
        match self {
            TaskOwner::Contact(_) => RelatedType::Contact,
            TaskOwner::Deal(_) => RelatedType::Deal,
        }
    }

    pub fn id(self) -> i64 {
        match self {
            TaskOwner::Contact(id) | TaskOwner::Deal(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: i64,
    pub name: String,
    pub amount: BigDecimal,
    pub stage: DealStage,
    pub contact_id: i64,
    pub company_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: TaskStatus,
    #[serde(flatten)]
    pub owner: TaskOwner,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task plus the display name of whatever it is attached to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub related_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactView {
    #[serde(flatten)]
    pub contact: Contact,
    pub company: Option<Company>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealView {
    #[serde(flatten)]
    pub deal: Deal,
    pub contact: Option<Contact>,
    pub company: Option<Company>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub contacts: Vec<Contact>,
    pub deals: Vec<Deal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactDetail {
    #[serde(flatten)]
    pub contact: Contact,
    pub company: Option<Company>,
    pub deals: Vec<Deal>,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealDetail {
    #[serde(flatten)]
    pub deal: Deal,
    pub contact: Option<Contact>,
    pub company: Option<Company>,
    pub tasks: Vec<TaskView>,
}

/// `(id, name)` pair for select boxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Choices {
    pub companies: Vec<Choice>,
    pub contacts: Vec<Choice>,
    pub deals: Vec<Choice>,
}

// Validated inputs. For optional columns the outer `Option` is "was the field
// submitted at all"; the inner one is the value, `None` meaning clear it.

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyInput {
    pub name: String,
    pub address: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub website: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub phone: Option<Option<String>>,
    pub company_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DealInput {
    pub name: String,
    pub amount: BigDecimal,
    pub stage: DealStage,
    pub contact_id: i64,
    pub company_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskInput {
    pub description: String,
    pub due_date: NaiveDate,
    pub status: TaskStatus,
    pub owner: TaskOwner,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deal_stage_round_trips_through_str() {
        for stage in DealStage::ALL {
            assert_eq!(stage.as_str().parse::<DealStage>().unwrap(), stage);
        }
        assert!("closed won".parse::<DealStage>().is_err());
        assert!("Won".parse::<DealStage>().is_err());
    }

    #[test]
    fn test_deal_stage_pipeline_membership() {
        let pipeline: Vec<DealStage> = DealStage::ALL
            .into_iter()
            .filter(|s| s.counts_toward_pipeline())
            .collect();
        assert_eq!(pipeline.len(), 5);
        assert!(!pipeline.contains(&DealStage::ClosedLost));
        assert!(DealStage::ClosedWon.is_won());
        assert!(!DealStage::Negotiation.is_won());
    }

    #[test]
    fn test_deal_stage_default_and_serde() {
        assert_eq!(DealStage::default(), DealStage::Prospecting);
        assert_eq!(
            serde_json::to_string(&DealStage::ClosedWon).unwrap(),
            "\"Closed Won\""
        );
        let parsed: DealStage = serde_json::from_str("\"Closed Lost\"").unwrap();
        assert_eq!(parsed, DealStage::ClosedLost);
    }

    #[test]
    fn test_task_status() {
        assert_eq!(TaskStatus::default(), TaskStatus::ToDo);
        assert!(TaskStatus::ToDo.is_active());
        assert!(TaskStatus::InProgress.is_active());
        assert!(!TaskStatus::Completed.is_active());
        assert_eq!("In Progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert!("Done".parse::<TaskStatus>().is_err());
        assert_eq!(TaskStatus::ToDo.to_string(), "To Do");
    }

    #[test]
    fn test_related_type() {
        assert_eq!("contact".parse::<RelatedType>().unwrap(), RelatedType::Contact);
        assert_eq!("deal".parse::<RelatedType>().unwrap(), RelatedType::Deal);
        assert!("company".parse::<RelatedType>().is_err());
        assert!("Contact".parse::<RelatedType>().is_err());
    }

    #[test]
    fn test_task_owner_parts() {
        let owner = TaskOwner::new(RelatedType::Deal, 12);
        assert_eq!(owner, TaskOwner::Deal(12));
        assert_eq!(owner.kind(), RelatedType::Deal);
        assert_eq!(owner.id(), 12);
    }

    #[test]
    fn test_task_serializes_owner_as_column_pair() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let task = Task {
            id: 3,
            description: "Call back".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(),
            status: TaskStatus::InProgress,
            owner: TaskOwner::Contact(7),
            created_at: at,
            updated_at: at,
        };
        let value = serde_json::to_value(TaskView {
            task,
            related_name: "Ada".to_string(),
        })
        .unwrap();
        assert_eq!(value["related_type"], "contact");
        assert_eq!(value["related_id"], 7);
        assert_eq!(value["status"], "In Progress");
        assert_eq!(value["due_date"], "2024-05-20");
        assert_eq!(value["related_name"], "Ada");
    }
}
