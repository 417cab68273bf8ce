//! Field rules applied to a raw payload before any write.
//!
//! Every rule for every field is evaluated, and failures are collected per field
//! name. Within a single field, evaluation stops at the first failing rule. Rules
//! that need the database (references to other records) go through
//! [`RecordLookup`], and only run once the field itself is well-formed.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::Value;
use std::str::FromStr;
use std::sync::LazyLock;

use super::associations::validate_owner_exists;
use super::error::{CrmError, ValidationErrors};
use super::lookup::RecordLookup;
use super::types::{
    CompanyInput, ContactInput, DealInput, DealStage, RawPayload, RelatedType, TaskInput,
    TaskOwner, TaskStatus,
};

pub const MAX_STRING_LENGTH: usize = 255;

/// Largest value a `NUMERIC(15, 2)` column holds.
pub const MAX_AMOUNT: &str = "9999999999999.99";

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("Invalid email regex")
});

static MAX_AMOUNT_VALUE: LazyLock<BigDecimal> =
    LazyLock::new(|| BigDecimal::from_str(MAX_AMOUNT).expect("Invalid amount bound"));

/// Whether the payload describes a new record or replaces an existing one.
///
/// On create an omitted optional field means "empty"; on update it means "leave the
/// stored value alone".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Create,
    Update,
}

pub fn validate_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

pub fn validate_company(payload: &RawPayload, kind: WriteKind) -> Result<CompanyInput, CrmError> {
    let mut errors = ValidationErrors::new();

    let name = required_text(
        payload,
        "name",
        "Company name is required.",
        Some(MAX_STRING_LENGTH),
        &mut errors,
    );
    let address = optional_text(payload, "address", None, kind, &mut errors);
    let phone = optional_text(payload, "phone", Some(MAX_STRING_LENGTH), kind, &mut errors);
    let website = optional_text(payload, "website", Some(MAX_STRING_LENGTH), kind, &mut errors);

    let Some(name) = name else {
        return Err(errors.into());
    };
    errors.finish(CompanyInput {
        name,
        address,
        phone,
        website,
    })
}

pub fn validate_contact<L>(
    payload: &RawPayload,
    kind: WriteKind,
    lookup: &mut L,
) -> Result<ContactInput, CrmError>
where
    L: RecordLookup + ?Sized,
{
    let mut errors = ValidationErrors::new();

    let name = required_text(
        payload,
        "name",
        "Contact name is required.",
        Some(MAX_STRING_LENGTH),
        &mut errors,
    );
    let email = required_text(
        payload,
        "email",
        "Email address is required.",
        Some(MAX_STRING_LENGTH),
        &mut errors,
    )
    .filter(|email| {
        let valid = validate_email(email);
        if !valid {
            errors.add("email", "Please enter a valid email address.");
        }
        valid
    });
    let phone = optional_text(payload, "phone", Some(MAX_STRING_LENGTH), kind, &mut errors);
    let company_id = optional_id(payload, "company_id", kind, &mut errors);

    if let Some(Some(id)) = company_id {
        if !lookup.company_exists(id)? {
            errors.add("company_id", "Selected company does not exist.");
        }
    }

    let (Some(name), Some(email)) = (name, email) else {
        return Err(errors.into());
    };
    errors.finish(ContactInput {
        name,
        email,
        phone,
        company_id,
    })
}

pub fn validate_deal<L>(
    payload: &RawPayload,
    kind: WriteKind,
    lookup: &mut L,
) -> Result<DealInput, CrmError>
where
    L: RecordLookup + ?Sized,
{
    let mut errors = ValidationErrors::new();

    let name = required_text(
        payload,
        "name",
        "Deal name is required.",
        Some(MAX_STRING_LENGTH),
        &mut errors,
    );
    let amount = required_amount(payload, "amount", &mut errors);
    let stage: Option<DealStage> = required_choice(
        payload,
        "stage",
        "Deal stage is required.",
        "Please select a valid stage.",
        &mut errors,
    );
    let contact_id = required_id(payload, "contact_id", "Contact is required.", &mut errors);
    let company_id = optional_id(payload, "company_id", kind, &mut errors);

    if let Some(id) = contact_id {
        if !lookup.contact_exists(id)? {
            errors.add("contact_id", "Selected contact does not exist.");
        }
    }
    if let Some(Some(id)) = company_id {
        if !lookup.company_exists(id)? {
            errors.add("company_id", "Selected company does not exist.");
        }
    }

    let (Some(name), Some(amount), Some(stage), Some(contact_id)) =
        (name, amount, stage, contact_id)
    else {
        return Err(errors.into());
    };
    errors.finish(DealInput {
        name,
        amount,
        stage,
        contact_id,
        company_id,
    })
}

/// `today` is the date the due-date rule is checked against. Every task field is
/// required, so the same rules apply on create and update.
pub fn validate_task<L>(
    payload: &RawPayload,
    today: NaiveDate,
    lookup: &mut L,
) -> Result<TaskInput, CrmError>
where
    L: RecordLookup + ?Sized,
{
    let mut errors = ValidationErrors::new();

    let description = required_text(
        payload,
        "description",
        "Task description is required.",
        None,
        &mut errors,
    );
    let due_date = required_date(payload, "due_date", "Due date is required.", &mut errors)
        .filter(|date| {
            let upcoming = *date >= today;
            if !upcoming {
                errors.add("due_date", "Due date cannot be in the past.");
            }
            upcoming
        });
    let status: Option<TaskStatus> = required_choice(
        payload,
        "status",
        "Task status is required.",
        "Please select a valid status.",
        &mut errors,
    );
    let related_type: Option<RelatedType> = required_choice(
        payload,
        "related_type",
        "Please select a relation type.",
        "Please select a valid relation type.",
        &mut errors,
    );
    let related_id = required_id(
        payload,
        "related_id",
        "Please select what this task is related to.",
        &mut errors,
    );

    let owner = match (related_type, related_id) {
        (Some(kind), Some(id)) => Some(TaskOwner::new(kind, id)),
        _ => None,
    };
    if let Some(owner) = owner {
        validate_owner_exists(lookup, owner, &mut errors)?;
    }

    let (Some(description), Some(due_date), Some(status), Some(owner)) =
        (description, due_date, status, owner)
    else {
        return Err(errors.into());
    };
    errors.finish(TaskInput {
        description,
        due_date,
        status,
        owner,
    })
}

/// The submitted value, treating an explicit `null` the same as an absent key.
fn raw<'a>(payload: &'a RawPayload, field: &str) -> Option<&'a Value> {
    payload.get(field).filter(|value| !value.is_null())
}

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.trim().is_empty())
}

fn required_text(
    payload: &RawPayload,
    field: &str,
    required_message: &str,
    max: Option<usize>,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match raw(payload, field) {
        None => {
            errors.add(field, required_message);
            None
        }
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                errors.add(field, required_message);
                return None;
            }
            check_length(field, trimmed, max, errors).then(|| trimmed.to_string())
        }
        Some(_) => {
            errors.add(field, format!("The {field} field must be a string."));
            None
        }
    }
}

fn optional_text(
    payload: &RawPayload,
    field: &str,
    max: Option<usize>,
    kind: WriteKind,
    errors: &mut ValidationErrors,
) -> Option<Option<String>> {
    match payload.get(field) {
        None => omitted(kind),
        Some(Value::Null) => Some(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Some(None)
            } else if check_length(field, trimmed, max, errors) {
                Some(Some(trimmed.to_string()))
            } else {
                None
            }
        }
        Some(_) => {
            errors.add(field, format!("The {field} field must be a string."));
            None
        }
    }
}

fn omitted<T>(kind: WriteKind) -> Option<Option<T>> {
    match kind {
        WriteKind::Create => Some(None),
        WriteKind::Update => None,
    }
}

fn check_length(field: &str, value: &str, max: Option<usize>, errors: &mut ValidationErrors) -> bool {
    match max {
        Some(max) if value.chars().count() > max => {
            errors.add(
                field,
                format!("The {field} field may not be greater than {max} characters."),
            );
            false
        }
        _ => true,
    }
}

/// Accepts a JSON integer or a string holding one.
fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn required_id(
    payload: &RawPayload,
    field: &str,
    required_message: &str,
    errors: &mut ValidationErrors,
) -> Option<i64> {
    match raw(payload, field) {
        None => {
            errors.add(field, required_message);
            None
        }
        Some(value) if is_blank(value) => {
            errors.add(field, required_message);
            None
        }
        Some(value) => {
            let id = parse_id(value);
            if id.is_none() {
                errors.add(field, format!("The {field} field must be an integer."));
            }
            id
        }
    }
}

fn optional_id(
    payload: &RawPayload,
    field: &str,
    kind: WriteKind,
    errors: &mut ValidationErrors,
) -> Option<Option<i64>> {
    match payload.get(field) {
        None => omitted(kind),
        Some(Value::Null) => Some(None),
        Some(value) if is_blank(value) => Some(None),
        Some(value) => match parse_id(value) {
            Some(id) => Some(Some(id)),
            None => {
                errors.add(field, format!("The {field} field must be an integer."));
                None
            }
        },
    }
}

fn required_amount(
    payload: &RawPayload,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<BigDecimal> {
    let value = match raw(payload, field) {
        Some(value) if !is_blank(value) => value,
        _ => {
            errors.add(field, "Deal amount is required.");
            return None;
        }
    };

    let parsed = match value {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    };
    let Some(amount) = parsed else {
        errors.add(field, "Amount must be a valid number.");
        return None;
    };

    // Bounds are checked on the parsed value: comparisons never expand the
    // exponent, rescaling does.
    if amount < BigDecimal::from(0) {
        errors.add(field, "Amount cannot be negative.");
        return None;
    }
    if amount > *MAX_AMOUNT_VALUE {
        errors.add(field, format!("Amount may not be greater than {MAX_AMOUNT}."));
        return None;
    }
    Some(amount.round(2).with_scale(2))
}

fn required_choice<T: FromStr>(
    payload: &RawPayload,
    field: &str,
    required_message: &str,
    invalid_message: &str,
    errors: &mut ValidationErrors,
) -> Option<T> {
    match raw(payload, field) {
        None => {
            errors.add(field, required_message);
            None
        }
        Some(value) if is_blank(value) => {
            errors.add(field, required_message);
            None
        }
        Some(Value::String(s)) => {
            let parsed = s.parse().ok();
            if parsed.is_none() {
                errors.add(field, invalid_message);
            }
            parsed
        }
        Some(_) => {
            errors.add(field, invalid_message);
            None
        }
    }
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp truncated to its date.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.date_naive()))
}

fn required_date(
    payload: &RawPayload,
    field: &str,
    required_message: &str,
    errors: &mut ValidationErrors,
) -> Option<NaiveDate> {
    match raw(payload, field) {
        None => {
            errors.add(field, required_message);
            None
        }
        Some(value) if is_blank(value) => {
            errors.add(field, required_message);
            None
        }
        Some(value) => {
            let parsed = value.as_str().and_then(parse_date);
            if parsed.is_none() {
                errors.add(field, "Due date must be a valid date.");
            }
            parsed
        }
    }
}
