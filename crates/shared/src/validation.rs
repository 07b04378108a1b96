//! Draft and validated generation requests.

use crate::{
    catalog::OptionCatalog,
    domain::{Amount, Resolution},
    error::{Field, FieldError},
};

/// In-progress, possibly invalid request as edited by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRequest {
    pub prompt: String,
    pub amount: String,
    pub resolution: String,
    errors: Vec<FieldError>,
}

impl Default for DraftRequest {
    fn default() -> Self {
        Self::new(&OptionCatalog::standard())
    }
}

impl DraftRequest {
    /// Empty prompt with the catalog's default selections.
    pub fn new(catalog: &OptionCatalog) -> Self {
        Self {
            prompt: String::new(),
            amount: catalog.default_amount().value().to_string(),
            resolution: catalog.default_resolution().value().to_string(),
            errors: Vec::new(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = amount.into();
        self
    }

    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = resolution.into();
        self
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn error_for(&self, field: Field) -> Option<&FieldError> {
        self.errors.iter().find(|err| err.field == field)
    }

    pub fn set_errors(&mut self, errors: Vec<FieldError>) {
        self.errors = errors;
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn reset(&mut self, catalog: &OptionCatalog) {
        *self = Self::new(catalog);
    }
}

/// A draft that passed validation. Only [`validate`] constructs one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    prompt: String,
    amount: Amount,
    resolution: Resolution,
}

impl Request {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }
}

/// Checks a draft against the catalog. The prompt is taken verbatim; a
/// whitespace-only prompt is accepted.
pub fn validate(draft: &DraftRequest, catalog: &OptionCatalog) -> Result<Request, Vec<FieldError>> {
    let mut errors = Vec::new();

    if draft.prompt.is_empty() {
        errors.push(FieldError::empty(Field::Prompt));
    }
    let amount = catalog.amount(&draft.amount);
    if amount.is_none() {
        errors.push(FieldError::not_in_catalog(Field::Amount));
    }
    let resolution = catalog.resolution(&draft.resolution);
    if resolution.is_none() {
        errors.push(FieldError::not_in_catalog(Field::Resolution));
    }

    match (amount, resolution) {
        (Some(amount), Some(resolution)) if errors.is_empty() => Ok(Request {
            prompt: draft.prompt.clone(),
            amount,
            resolution,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
