use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use petclinic_core::ServiceError;

use crate::format::{DEFAULT_LOCALE, PetTypeFormatter, TypeParseError};
use crate::model::{Owner, Pet};
use crate::validate::{self, FieldErrors};

use super::{AppState, redirect_with_message};

const VIEW_PET_FORM: &str = "pets/createOrUpdatePetForm";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/owners/{owner_id}/pets/new",
            get(init_creation_form).post(process_creation_form),
        )
        .route(
            "/owners/{owner_id}/pets/{pet_id}/edit",
            get(init_update_form).post(process_update_form),
        )
}

// ── Form binding ────────────────────────────────────────────────────

/// Bindable pet fields. Dates and type names arrive as raw strings;
/// parse failures fold into the field-error collection rather than
/// failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PetFields {
    #[serde(default)]
    name: String,
    #[serde(default)]
    birth_date: String,
    #[serde(rename = "type", default)]
    type_name: String,
}

/// Bind submitted fields onto a pet. An empty type field leaves the
/// current type untouched (edits need not re-supply one).
fn bind_pet(
    fields: PetFields,
    pet: &mut Pet,
    formatter: &PetTypeFormatter,
    errors: &mut FieldErrors,
) -> Result<(), ServiceError> {
    pet.name = fields.name;

    let birth_date = fields.birth_date.trim();
    if birth_date.is_empty() {
        pet.birth_date = None;
    } else {
        match NaiveDate::parse_from_str(birth_date, "%Y-%m-%d") {
            Ok(date) => pet.birth_date = Some(date),
            Err(_) => {
                pet.birth_date = None;
                errors.reject_value("birthDate", "typeMismatch", "invalid date");
            }
        }
    }

    let type_name = fields.type_name.trim();
    if !type_name.is_empty() {
        match formatter.parse(type_name, DEFAULT_LOCALE) {
            Ok(pet_type) => pet.pet_type = Some(pet_type),
            Err(TypeParseError::NotFound { text }) => {
                errors.reject_value("type", "typeMismatch", &format!("type not found: {text}"));
            }
            Err(TypeParseError::Repository(e)) => return Err(e),
        }
    }

    Ok(())
}

// ── Views ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PetFormView {
    view: &'static str,
    owner_id: i64,
    pet: Pet,
    /// Known type names for the form's selection list.
    types: Vec<String>,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    errors: FieldErrors,
}

impl PetFormView {
    fn new(
        svc: &AppState,
        owner_id: i64,
        pet: Pet,
        errors: FieldErrors,
    ) -> Result<Self, ServiceError> {
        let formatter = PetTypeFormatter::new(svc.clone());
        let types = svc
            .find_pet_types()?
            .iter()
            .map(|t| formatter.print(t, DEFAULT_LOCALE))
            .collect();
        Ok(Self {
            view: VIEW_PET_FORM,
            owner_id,
            pet,
            types,
            errors,
        })
    }
}

// ── Handlers ────────────────────────────────────────────────────────

async fn init_creation_form(
    State(svc): State<AppState>,
    Path(owner_id): Path<i64>,
) -> Result<Json<PetFormView>, ServiceError> {
    svc.find_by_id(owner_id)?;
    let view = PetFormView::new(&svc, owner_id, Pet::default(), FieldErrors::new())?;
    Ok(Json(view))
}

async fn process_creation_form(
    State(svc): State<AppState>,
    Path(owner_id): Path<i64>,
    Form(fields): Form<PetFields>,
) -> Result<Response, ServiceError> {
    let mut owner: Owner = svc.find_by_id(owner_id)?;
    let mut pet = Pet::default();
    let mut errors = FieldErrors::new();

    let formatter = PetTypeFormatter::new(svc.clone());
    bind_pet(fields, &mut pet, &formatter, &mut errors)?;

    if !pet.name.trim().is_empty() && owner.pet_with_name(&pet.name).is_some() {
        errors.reject_value("name", "duplicate", "already exists");
    }

    validate::validate_pet(&pet, &mut errors);

    if errors.has_errors() {
        let view = PetFormView::new(&svc, owner_id, pet, errors)?;
        return Ok(Json(view).into_response());
    }

    owner.add_pet(pet);
    svc.save(&mut owner)?;

    Ok(redirect_with_message(&format!("/owners/{owner_id}"), "New Pet has been Added")
        .into_response())
}

async fn init_update_form(
    State(svc): State<AppState>,
    Path((owner_id, pet_id)): Path<(i64, i64)>,
) -> Result<Json<PetFormView>, ServiceError> {
    let owner = svc.find_by_id(owner_id)?;
    let pet = owner
        .pet(pet_id)
        .cloned()
        .ok_or_else(|| ServiceError::NotFound(format!("pet {pet_id} not found for owner {owner_id}")))?;
    let view = PetFormView::new(&svc, owner_id, pet, FieldErrors::new())?;
    Ok(Json(view))
}

async fn process_update_form(
    State(svc): State<AppState>,
    Path((owner_id, pet_id)): Path<(i64, i64)>,
    Form(fields): Form<PetFields>,
) -> Result<Response, ServiceError> {
    let mut owner = svc.find_by_id(owner_id)?;
    let mut pet = owner
        .pet(pet_id)
        .cloned()
        .ok_or_else(|| ServiceError::NotFound(format!("pet {pet_id} not found for owner {owner_id}")))?;

    let mut errors = FieldErrors::new();
    let formatter = PetTypeFormatter::new(svc.clone());
    bind_pet(fields, &mut pet, &formatter, &mut errors)?;
    validate::validate_pet(&pet, &mut errors);

    if errors.has_errors() {
        let view = PetFormView::new(&svc, owner_id, pet, errors)?;
        return Ok(Json(view).into_response());
    }

    if let Some(stored) = owner.pet_mut(pet_id) {
        *stored = pet;
    }
    svc.save(&mut owner)?;

    Ok(redirect_with_message(&format!("/owners/{owner_id}"), "Pet details has been edited")
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::OwnerService;
    use axum::http::{StatusCode, header};
    use petclinic_sql::SqliteStore;
    use std::sync::Arc;

    fn state_with_owner() -> AppState {
        let sql = Box::new(SqliteStore::open_in_memory().unwrap());
        let svc = Arc::new(OwnerService::new(sql).unwrap());
        let mut owner = Owner {
            first_name: "Jean".into(),
            last_name: "Coleman".into(),
            address: "105 N. Lake St.".into(),
            city: "Monona".into(),
            telephone: "6085552654".into(),
            ..Owner::default()
        };
        svc.save(&mut owner).unwrap();
        svc
    }

    fn pet_fields(name: &str, birth_date: &str, type_name: &str) -> PetFields {
        PetFields {
            name: name.into(),
            birth_date: birth_date.into(),
            type_name: type_name.into(),
        }
    }

    fn location(resp: &Response) -> String {
        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn adding_a_pet_cascades_and_redirects() {
        let state = state_with_owner();
        let resp = process_creation_form(
            State(state.clone()),
            Path(1),
            Form(pet_fields("Leo", "2020-09-07", "cat")),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/owners/1?message=New+Pet+has+been+Added");

        let owner = state.find_by_id(1).unwrap();
        assert_eq!(owner.pets.len(), 1);
        assert_eq!(owner.pets[0].name, "Leo");
        assert_eq!(
            owner.pets[0].pet_type.as_ref().map(|t| t.name.as_str()),
            Some("cat")
        );
    }

    #[tokio::test]
    async fn blank_submission_collects_every_field_error() {
        let state = state_with_owner();
        let resp = process_creation_form(
            State(state.clone()),
            Path(1),
            Form(pet_fields("", "", "")),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["view"], "pets/createOrUpdatePetForm");
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, ["name", "type", "birthDate"]);
        assert!(state.find_by_id(1).unwrap().pets.is_empty());
    }

    #[tokio::test]
    async fn unknown_type_folds_into_field_errors() {
        let state = state_with_owner();
        let resp = process_creation_form(
            State(state),
            Path(1),
            Form(pet_fields("Leo", "2020-09-07", "unicorn")),
        )
        .await
        .unwrap();

        let body = body_json(resp).await;
        assert_eq!(body["errors"][0]["field"], "type");
        assert_eq!(body["errors"][0]["message"], "type not found: unicorn");
        // The known names still accompany the re-shown form.
        assert_eq!(body["types"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn malformed_date_folds_into_field_errors() {
        let state = state_with_owner();
        let resp = process_creation_form(
            State(state),
            Path(1),
            Form(pet_fields("Leo", "07/09/2020", "cat")),
        )
        .await
        .unwrap();

        let body = body_json(resp).await;
        assert_eq!(body["errors"][0]["field"], "birthDate");
        assert_eq!(body["errors"][0]["code"], "typeMismatch");
    }

    #[tokio::test]
    async fn duplicate_pet_name_is_rejected() {
        let state = state_with_owner();
        process_creation_form(
            State(state.clone()),
            Path(1),
            Form(pet_fields("Leo", "2020-09-07", "cat")),
        )
        .await
        .unwrap();

        let resp = process_creation_form(
            State(state),
            Path(1),
            Form(pet_fields("leo", "2021-01-01", "dog")),
        )
        .await
        .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["errors"][0]["field"], "name");
        assert_eq!(body["errors"][0]["code"], "duplicate");
    }

    #[tokio::test]
    async fn edit_without_type_keeps_the_stored_one() {
        let state = state_with_owner();
        process_creation_form(
            State(state.clone()),
            Path(1),
            Form(pet_fields("Leo", "2020-09-07", "cat")),
        )
        .await
        .unwrap();

        let resp = process_update_form(
            State(state.clone()),
            Path((1, 1)),
            Form(pet_fields("Leonard", "2020-09-07", "")),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&resp), "/owners/1?message=Pet+details+has+been+edited");

        let owner = state.find_by_id(1).unwrap();
        assert_eq!(owner.pets[0].name, "Leonard");
        assert_eq!(
            owner.pets[0].pet_type.as_ref().map(|t| t.name.as_str()),
            Some("cat")
        );
    }

    #[tokio::test]
    async fn editing_a_missing_pet_is_not_found() {
        let state = state_with_owner();
        let err = process_update_form(
            State(state),
            Path((1, 99)),
            Form(pet_fields("Leo", "2020-09-07", "cat")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
