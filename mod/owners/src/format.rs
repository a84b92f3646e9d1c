//! Parse/print conversion between [`PetType`] values and their display
//! strings, in the shape of a locale-aware formatter. The locale tag is
//! accepted for interface symmetry but plays no part in the conversion.

use std::sync::Arc;

use thiserror::Error;

use petclinic_core::ServiceError;

use crate::model::PetType;
use crate::service::OwnerService;

/// Locale tag used by handlers that have no client locale to forward.
pub const DEFAULT_LOCALE: &str = "en";

#[derive(Error, Debug)]
pub enum TypeParseError {
    /// No known pet type carries this exact name.
    #[error("type not found: {text}")]
    NotFound { text: String },

    /// The repository failed while the known types were being resolved.
    #[error(transparent)]
    Repository(ServiceError),
}

/// Bidirectional pet-type conversion backed by the repository.
///
/// Parsing is a linear scan over the full type set on every call — the
/// reference data is a handful of rows, so no caching.
pub struct PetTypeFormatter {
    owners: Arc<OwnerService>,
}

impl PetTypeFormatter {
    pub fn new(owners: Arc<OwnerService>) -> Self {
        Self { owners }
    }

    /// Display string for a pet type. Total — cannot fail.
    pub fn print(&self, pet_type: &PetType, _locale: &str) -> String {
        pet_type.name.clone()
    }

    /// Resolve a pet type by exact, case-sensitive name match.
    pub fn parse(&self, text: &str, _locale: &str) -> Result<PetType, TypeParseError> {
        let types = self
            .owners
            .find_pet_types()
            .map_err(TypeParseError::Repository)?;

        types
            .into_iter()
            .find(|t| t.name == text)
            .ok_or_else(|| TypeParseError::NotFound {
                text: text.to_string(),
            })
    }
}
