use serde::{Deserialize, Serialize};

/// PetType — immutable reference data naming a category of pet.
///
/// Rows are seeded at schema initialization and resolved by exact,
/// case-sensitive name match; unlike owners and pets they always carry
/// a persisted id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetType {
    pub id: i64,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pet_type_json_roundtrip() {
        let t = PetType {
            id: 2,
            name: "dog".into(),
        };
        let json = serde_json::to_string(&t).unwrap();
        let back: PetType = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
