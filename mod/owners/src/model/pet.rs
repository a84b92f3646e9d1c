use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PetType;

/// Pet — an animal belonging to exactly one owner.
///
/// `birth_date` and `pet_type` are options at the model level; the
/// validation layer decides when their absence is an error (a type is
/// only mandatory while the pet is new).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default)]
    pub name: String,

    /// Birth date, ISO `YYYY-MM-DD` on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub pet_type: Option<PetType>,
}

impl Pet {
    /// Whether this record has not been persisted yet.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pet_json_roundtrip() {
        let p = Pet {
            id: Some(1),
            name: "Leo".into(),
            birth_date: NaiveDate::from_ymd_opt(2020, 9, 7),
            pet_type: Some(PetType {
                id: 1,
                name: "cat".into(),
            }),
        };
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"birthDate\":\"2020-09-07\""));
        assert!(json.contains("\"type\""));
        let back: Pet = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn blank_pet_serializes_without_optionals() {
        let json = serde_json::to_string(&Pet::default()).unwrap();
        assert_eq!(json, "{\"name\":\"\"}");
    }
}
