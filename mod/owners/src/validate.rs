//! Field-level form validation.
//!
//! Rejections accumulate in a [`FieldErrors`] collection instead of
//! short-circuiting, so a re-shown form can flag every bad field at once.
//! Nothing here ever becomes an HTTP error.

use serde::Serialize;

use crate::model::{Owner, Pet};

/// Error code for a missing mandatory field.
pub const REQUIRED: &str = "required";

/// A single field rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// Ordered collection of field rejections, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rejection against a field.
    pub fn reject_value(&mut self, field: &str, code: &str, message: &str) {
        self.0.push(FieldError {
            field: field.to_string(),
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First rejection recorded against a field, if any.
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

/// Validate a pet record. All rules are evaluated independently:
/// - `name` must not be blank (whitespace-only counts as blank)
/// - `type` is mandatory only while the pet is new
/// - `birthDate` is mandatory always
pub fn validate_pet(pet: &Pet, errors: &mut FieldErrors) {
    if pet.name.trim().is_empty() {
        errors.reject_value("name", REQUIRED, REQUIRED);
    }

    if pet.is_new() && pet.pet_type.is_none() {
        errors.reject_value("type", REQUIRED, REQUIRED);
    }

    if pet.birth_date.is_none() {
        errors.reject_value("birthDate", REQUIRED, REQUIRED);
    }
}

/// Validate an owner record: name and address fields must be non-blank,
/// the telephone must be numeric and at most 10 digits.
pub fn validate_owner(owner: &Owner, errors: &mut FieldErrors) {
    let required_fields = [
        ("firstName", &owner.first_name),
        ("lastName", &owner.last_name),
        ("address", &owner.address),
        ("city", &owner.city),
    ];
    for (field, value) in required_fields {
        if value.trim().is_empty() {
            errors.reject_value(field, REQUIRED, REQUIRED);
        }
    }

    let telephone = owner.telephone.trim();
    if telephone.is_empty() {
        errors.reject_value("telephone", REQUIRED, REQUIRED);
    } else if telephone.len() > 10 || !telephone.chars().all(|c| c.is_ascii_digit()) {
        errors.reject_value("telephone", "invalid", "numeric, at most 10 digits");
    }
}
