use petclinic_core::ServiceError;
use petclinic_sql::{SqlStore, Value};
use tracing::debug;

/// DDL for the owners module. Typed columns throughout; ids are SQLite
/// rowids so the store, never the client, assigns identity.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS owners (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    address TEXT NOT NULL,
    city TEXT NOT NULL,
    telephone TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_owners_last_name ON owners(last_name);
CREATE TABLE IF NOT EXISTS pets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    birth_date TEXT,
    type_id INTEGER NOT NULL REFERENCES types(id),
    owner_id INTEGER NOT NULL REFERENCES owners(id)
);
CREATE INDEX IF NOT EXISTS idx_pets_owner ON pets(owner_id);
";

/// Reference pet types seeded on first start.
pub const DEFAULT_PET_TYPES: &[&str] = &["bird", "cat", "dog", "hamster", "lizard", "snake"];

/// Create tables and seed the pet-type reference data. Idempotent —
/// safe to run on every start.
pub fn init_schema(sql: &dyn SqlStore) -> Result<(), ServiceError> {
    sql.exec_batch(SCHEMA)
        .map_err(|e| ServiceError::Storage(e.to_string()))?;

    for name in DEFAULT_PET_TYPES {
        sql.exec(
            "INSERT OR IGNORE INTO types (name) VALUES (?1)",
            &[Value::Text((*name).to_string())],
        )
        .map_err(|e| ServiceError::Storage(e.to_string()))?;
    }

    debug!("owners schema initialized");
    Ok(())
}
