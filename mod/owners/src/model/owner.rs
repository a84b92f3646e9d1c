use serde::{Deserialize, Serialize};

use super::Pet;

/// Owner — a clinic customer owning zero or more pets.
///
/// The id is assigned by the store on first save and is never bound from
/// a submission (the form types carry no id field at all).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub telephone: String,

    /// Pets owned by this owner, cascade-persisted with it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pets: Vec<Pet>,
}

impl Owner {
    /// Whether this record has not been persisted yet.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn add_pet(&mut self, pet: Pet) {
        self.pets.push(pet);
    }

    /// Find a pet by its persisted id.
    pub fn pet(&self, pet_id: i64) -> Option<&Pet> {
        self.pets.iter().find(|p| p.id == Some(pet_id))
    }

    pub fn pet_mut(&mut self, pet_id: i64) -> Option<&mut Pet> {
        self.pets.iter_mut().find(|p| p.id == Some(pet_id))
    }

    /// Find an already-persisted pet by name, case-insensitive. Used for
    /// duplicate-name checks when adding a pet.
    pub fn pet_with_name(&self, name: &str) -> Option<&Pet> {
        let wanted = name.to_lowercase();
        self.pets
            .iter()
            .filter(|p| !p.is_new())
            .find(|p| p.name.to_lowercase() == wanted)
    }
}
