use axum::{http::StatusCode, response::IntoResponse, Json};
use log::error;
use serde::Serialize;
use std::collections::BTreeMap;

/// Field-level validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn finish<T>(self, value: T) -> Result<T, CrmError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(CrmError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Database error: {0}")]
    Database(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrmError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Like `From<diesel::result::Error>`, but a foreign key violation becomes a
    /// field error. A referenced record deleted after validation ends up here.
    pub fn from_write(e: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        if let Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) = &e {
            let reference = match info.constraint_name() {
                Some(name) if name.ends_with("_contact_id_fkey") => {
                    Some(("contact_id", "Selected contact does not exist."))
                }
                Some(name) if name.ends_with("_company_id_fkey") => {
                    Some(("company_id", "Selected company does not exist."))
                }
                _ => None,
            };
            if let Some((field, message)) = reference {
                let mut errors = ValidationErrors::new();
                errors.add(field, message);
                return Self::Validation(errors);
            }
        }
        e.into()
    }
}

impl From<diesel::result::Error> for CrmError {
    fn from(e: diesel::result::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<ValidationErrors> for CrmError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for CrmError {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({
                    "message": "The given data was invalid.",
                    "errors": errors,
                })),
            )
                .into_response(),
            Self::NotFound { .. } => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": self.to_string() })),
            )
                .into_response(),
            Self::Database(_) | Self::Connection(_) | Self::Internal(_) => {
                error!("{self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());
        errors.add("name", "Deal name is required.");
        errors.add("amount", "Amount cannot be negative.");
        errors.add("amount", "second");
        assert_eq!(errors.len(), 2);
        assert!(errors.has("name"));
        assert_eq!(errors.get("amount").unwrap().len(), 2);
        assert!(errors.finish(()).is_err());
        assert!(ValidationErrors::new().finish(5).is_ok());
    }

    #[test]
    fn test_validation_errors_serialize_as_map() {
        let mut errors = ValidationErrors::new();
        errors.add("stage", "Please select a valid stage.");
        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(value["stage"][0], "Please select a valid stage.");
    }

    struct ConstraintViolation(Option<&'static str>);

    impl diesel::result::DatabaseErrorInformation for ConstraintViolation {
        fn message(&self) -> &str {
            "insert or update violates foreign key constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("deals")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            self.0
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn foreign_key_violation(constraint: Option<&'static str>) -> diesel::result::Error {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::ForeignKeyViolation,
            Box::new(ConstraintViolation(constraint)),
        )
    }

    #[test]
    fn test_foreign_key_violation_becomes_field_error() {
        let err = CrmError::from_write(foreign_key_violation(Some("deals_contact_id_fkey")));
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.get("contact_id").unwrap(), ["Selected contact does not exist."]);
        assert_eq!(errors.len(), 1);

        for constraint in ["deals_company_id_fkey", "contacts_company_id_fkey"] {
            let err = CrmError::from_write(foreign_key_violation(Some(constraint)));
            assert_eq!(
                err.validation_errors().unwrap().get("company_id").unwrap(),
                ["Selected company does not exist."]
            );
            assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn test_other_write_errors_stay_internal() {
        assert!(matches!(
            CrmError::from_write(foreign_key_violation(None)),
            CrmError::Database(_)
        ));
        assert!(matches!(
            CrmError::from_write(diesel::result::Error::NotFound),
            CrmError::Database(_)
        ));
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(CrmError::not_found("Deal", 42).to_string(), "Deal 42 not found");
    }

    #[test]
    fn test_status_codes() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Email address is required.");
        assert_eq!(
            CrmError::Validation(errors).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            CrmError::not_found("Task", 1).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CrmError::Database("boom".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            CrmError::from(diesel::result::Error::NotFound)
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
