pub mod schema;

use chrono::NaiveDate;

use petclinic_core::{Page, PageRequest, ServiceError};
use petclinic_sql::{Row, SqlError, SqlStore, Value};

use crate::model::{Owner, Pet, PetType};

/// Owner repository — all persistence for the owners module goes through
/// here. Owns the SQL store; handlers receive it as shared state, never
/// as a global.
pub struct OwnerService {
    sql: Box<dyn SqlStore>,
}

fn storage(e: SqlError) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

impl OwnerService {
    pub fn new(sql: Box<dyn SqlStore>) -> Result<Self, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Self { sql })
    }

    /// Load an owner with its pets (pet types resolved).
    pub fn find_by_id(&self, id: i64) -> Result<Owner, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT id, first_name, last_name, address, city, telephone
                 FROM owners WHERE id = ?1",
                &[Value::Integer(id)],
            )
            .map_err(storage)?;

        let row = rows
            .first()
            .ok_or_else(|| ServiceError::NotFound(format!("owner {id} not found")))?;

        let mut owner = owner_from_row(row);
        owner.pets = self.pets_of(id)?;
        Ok(owner)
    }

    /// Persist an owner and cascade to its pets. New records get their
    /// store-assigned id written back; existing records are updated in
    /// place.
    pub fn save(&self, owner: &mut Owner) -> Result<(), ServiceError> {
        let owner_id = if let Some(id) = owner.id {
            let affected = self
                .sql
                .exec(
                    "UPDATE owners
                     SET first_name = ?1, last_name = ?2, address = ?3, city = ?4, telephone = ?5
                     WHERE id = ?6",
                    &[
                        Value::Text(owner.first_name.clone()),
                        Value::Text(owner.last_name.clone()),
                        Value::Text(owner.address.clone()),
                        Value::Text(owner.city.clone()),
                        Value::Text(owner.telephone.clone()),
                        Value::Integer(id),
                    ],
                )
                .map_err(storage)?;
            if affected == 0 {
                return Err(ServiceError::NotFound(format!("owner {id} not found")));
            }
            id
        } else {
            let id = self
                .sql
                .insert(
                    "INSERT INTO owners (first_name, last_name, address, city, telephone)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    &[
                        Value::Text(owner.first_name.clone()),
                        Value::Text(owner.last_name.clone()),
                        Value::Text(owner.address.clone()),
                        Value::Text(owner.city.clone()),
                        Value::Text(owner.telephone.clone()),
                    ],
                )
                .map_err(storage)?;
            owner.id = Some(id);
            id
        };

        for pet in &mut owner.pets {
            self.save_pet(owner_id, pet)?;
        }

        Ok(())
    }

    /// Page through owners whose last name starts with `last_name`.
    /// The empty string matches every owner.
    pub fn find_by_last_name(
        &self,
        last_name: &str,
        page: &PageRequest,
    ) -> Result<Page<Owner>, ServiceError> {
        let pattern = format!("{last_name}%");

        let rows = self
            .sql
            .query(
                "SELECT COUNT(*) AS cnt FROM owners WHERE last_name LIKE ?1",
                &[Value::Text(pattern.clone())],
            )
            .map_err(storage)?;
        let total = rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize;

        let rows = self
            .sql
            .query(
                "SELECT id, first_name, last_name, address, city, telephone
                 FROM owners WHERE last_name LIKE ?1
                 ORDER BY id LIMIT ?2 OFFSET ?3",
                &[
                    Value::Text(pattern),
                    Value::Integer(page.size() as i64),
                    Value::Integer(page.offset() as i64),
                ],
            )
            .map_err(storage)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut owner = owner_from_row(row);
            if let Some(id) = owner.id {
                owner.pets = self.pets_of(id)?;
            }
            items.push(owner);
        }

        Ok(Page::new(items, page, total))
    }

    /// The full pet-type reference set, ordered by name.
    pub fn find_pet_types(&self) -> Result<Vec<PetType>, ServiceError> {
        let rows = self
            .sql
            .query("SELECT id, name FROM types ORDER BY name", &[])
            .map_err(storage)?;
        rows.iter().map(pet_type_from_row).collect()
    }

    fn pets_of(&self, owner_id: i64) -> Result<Vec<Pet>, ServiceError> {
        let rows = self
            .sql
            .query(
                "SELECT p.id, p.name, p.birth_date, t.id AS type_id, t.name AS type_name
                 FROM pets p JOIN types t ON t.id = p.type_id
                 WHERE p.owner_id = ?1 ORDER BY p.name",
                &[Value::Integer(owner_id)],
            )
            .map_err(storage)?;
        rows.iter().map(pet_from_row).collect()
    }

    fn save_pet(&self, owner_id: i64, pet: &mut Pet) -> Result<(), ServiceError> {
        let birth = pet
            .birth_date
            .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null);

        if let Some(pet_id) = pet.id {
            // An edit may omit the type; the stored one is kept.
            let result = match &pet.pet_type {
                Some(t) => self.sql.exec(
                    "UPDATE pets SET name = ?1, birth_date = ?2, type_id = ?3
                     WHERE id = ?4 AND owner_id = ?5",
                    &[
                        Value::Text(pet.name.clone()),
                        birth,
                        Value::Integer(t.id),
                        Value::Integer(pet_id),
                        Value::Integer(owner_id),
                    ],
                ),
                None => self.sql.exec(
                    "UPDATE pets SET name = ?1, birth_date = ?2
                     WHERE id = ?3 AND owner_id = ?4",
                    &[
                        Value::Text(pet.name.clone()),
                        birth,
                        Value::Integer(pet_id),
                        Value::Integer(owner_id),
                    ],
                ),
            };
            let affected = result.map_err(storage)?;
            if affected == 0 {
                return Err(ServiceError::NotFound(format!(
                    "pet {pet_id} not found for owner {owner_id}"
                )));
            }
        } else {
            let pet_type = pet.pet_type.as_ref().ok_or_else(|| {
                ServiceError::Validation("a new pet must have a type".into())
            })?;
            let id = self
                .sql
                .insert(
                    "INSERT INTO pets (name, birth_date, type_id, owner_id)
                     VALUES (?1, ?2, ?3, ?4)",
                    &[
                        Value::Text(pet.name.clone()),
                        birth,
                        Value::Integer(pet_type.id),
                        Value::Integer(owner_id),
                    ],
                )
                .map_err(storage)?;
            pet.id = Some(id);
        }

        Ok(())
    }
}

fn owner_from_row(row: &Row) -> Owner {
    Owner {
        id: row.get_i64("id"),
        first_name: row.get_str("first_name").unwrap_or_default().to_string(),
        last_name: row.get_str("last_name").unwrap_or_default().to_string(),
        address: row.get_str("address").unwrap_or_default().to_string(),
        city: row.get_str("city").unwrap_or_default().to_string(),
        telephone: row.get_str("telephone").unwrap_or_default().to_string(),
        pets: Vec::new(),
    }
}

fn pet_from_row(row: &Row) -> Result<Pet, ServiceError> {
    let type_id = row
        .get_i64("type_id")
        .ok_or_else(|| ServiceError::Internal("pet row missing type_id".into()))?;
    let type_name = row
        .get_str("type_name")
        .ok_or_else(|| ServiceError::Internal("pet row missing type_name".into()))?;

    Ok(Pet {
        id: row.get_i64("id"),
        name: row.get_str("name").unwrap_or_default().to_string(),
        birth_date: row
            .get_str("birth_date")
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()),
        pet_type: Some(PetType {
            id: type_id,
            name: type_name.to_string(),
        }),
    })
}

fn pet_type_from_row(row: &Row) -> Result<PetType, ServiceError> {
    let id = row
        .get_i64("id")
        .ok_or_else(|| ServiceError::Internal("type row missing id".into()))?;
    let name = row
        .get_str("name")
        .ok_or_else(|| ServiceError::Internal("type row missing name".into()))?;
    Ok(PetType {
        id,
        name: name.to_string(),
    })
}
