//! Form validation for the nutriadmin console
//!
//! A [`Schema`] declares fields and their rules; a [`Wizard`] walks a schema
//! in ordered steps, validating only the active step before moving on and
//! the whole schema on submit.

pub mod forms;
pub mod schema;
pub mod wizard;

pub use forms::{
    admin_registration, client_registration, product_form, DEFAULT_ACCESS_LEVEL,
    DEFAULT_DEPARTMENT, DEPARTMENTS,
};
pub use schema::{FieldSpec, Rule, Schema};
pub use wizard::{FormState, Step, Wizard};

use nutriadmin_core::{validation_error, ErrorContext, NutriError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Field-scoped validation messages, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Messages for one field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Names of the fields that failed
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    /// Drop messages for the given fields
    pub fn clear_fields<'a, I: IntoIterator<Item = &'a str>>(&mut self, names: I) {
        for name in names {
            self.fields.remove(name);
        }
    }

    pub fn remove(&mut self, field: &str) {
        self.fields.remove(field);
    }

    /// Add every message from `other`
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
    }

    /// Only the messages for the given fields
    pub fn subset<'a, I: IntoIterator<Item = &'a str>>(&self, names: I) -> ValidationErrors {
        let mut subset = ValidationErrors::new();
        for name in names {
            if let Some(messages) = self.fields.get(name) {
                subset.fields.insert(name.to_string(), messages.clone());
            }
        }
        subset
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Errors raised by wizard transitions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("Validation failed: {0}")]
    Invalid(ValidationErrors),

    #[error("Submit is only available on the last step (at step {current} of {last})")]
    NotOnLastStep { current: usize, last: usize },

    #[error("Unknown field: {0}")]
    UnknownField(String),
}

pub type FormResult<T> = Result<T, FormError>;

impl FormError {
    /// Field errors carried by the failure, if any
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            FormError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<FormError> for NutriError {
    fn from(error: FormError) -> Self {
        let field = error
            .validation_errors()
            .and_then(|errors| errors.fields().next().map(str::to_string));
        match field {
            Some(field) => validation_error!(error, field, "forms"),
            None => NutriError::Validation {
                message: error.to_string(),
                field: None,
                context: ErrorContext::new("forms"),
            },
        }
    }
}
