use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Prompt,
    Amount,
    Resolution,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Amount => "amount",
            Self::Resolution => "resolution",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Empty,
    NotInCatalog,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{field} {}", self.message())]
pub struct FieldError {
    pub field: Field,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub fn new(field: Field, kind: FieldErrorKind) -> Self {
        Self { field, kind }
    }

    pub fn empty(field: Field) -> Self {
        Self::new(field, FieldErrorKind::Empty)
    }

    pub fn not_in_catalog(field: Field) -> Self {
        Self::new(field, FieldErrorKind::NotInCatalog)
    }

    /// Inline message for the field, suitable for display next to the input.
    pub fn message(&self) -> &'static str {
        match self.kind {
            FieldErrorKind::Empty => "must not be empty",
            FieldErrorKind::NotInCatalog => "is not one of the available options",
        }
    }
}

/// Every field error produced by one validation pass, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid request: {}", join(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn for_field(&self, field: Field) -> Option<&FieldError> {
        self.0.iter().find(|err| err.field == field)
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(value: Vec<FieldError>) -> Self {
        Self(value)
    }
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
