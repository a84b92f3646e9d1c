use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};

use petclinic_core::{PageRequest, ServiceError};

use crate::model::Owner;
use crate::validate::{self, FieldErrors};

use super::{AppState, redirect_with_message};

/// Fixed page size for owner search results.
const PAGE_SIZE: usize = 5;

const VIEW_CREATE_OR_UPDATE_FORM: &str = "owners/createOrUpdateOwnerForm";
const VIEW_FIND_FORM: &str = "owners/findOwners";
const VIEW_LIST: &str = "owners/ownersList";
const VIEW_DETAILS: &str = "owners/ownerDetails";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/owners/new",
            get(init_creation_form).post(process_creation_form),
        )
        .route("/owners/find", get(init_find_form))
        .route("/owners", get(process_find_form))
        .route(
            "/owners/{owner_id}/edit",
            get(init_update_form).post(process_update_form),
        )
        .route("/owners/{owner_id}", get(show_owner))
}

// ── Form binding ────────────────────────────────────────────────────

/// Bindable owner fields. There is deliberately no id here: a submission
/// can never choose or change a record's identity.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerFields {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    telephone: String,
}

impl OwnerFields {
    fn apply_to(self, owner: &mut Owner) {
        owner.first_name = self.first_name;
        owner.last_name = self.last_name;
        owner.address = self.address;
        owner.city = self.city;
        owner.telephone = self.telephone;
    }

    fn into_owner(self) -> Owner {
        let mut owner = Owner::default();
        self.apply_to(&mut owner);
        owner
    }
}

// ── Views ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OwnerFormView {
    view: &'static str,
    owner: Owner,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    errors: FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl OwnerFormView {
    fn clean(owner: Owner) -> Self {
        Self {
            view: VIEW_CREATE_OR_UPDATE_FORM,
            owner,
            errors: FieldErrors::new(),
            error: None,
        }
    }

    fn rejected(owner: Owner, errors: FieldErrors, error: &str) -> Self {
        Self {
            view: VIEW_CREATE_OR_UPDATE_FORM,
            owner,
            errors,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FindOwnersView {
    view: &'static str,
    /// The submitted filter, echoed back into the re-shown form.
    #[serde(skip_serializing_if = "String::is_empty")]
    last_name: String,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    errors: FieldErrors,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OwnersListView {
    view: &'static str,
    current_page: u32,
    total_pages: usize,
    total_items: usize,
    list_owners: Vec<Owner>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OwnerDetailsView {
    view: &'static str,
    owner: Owner,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

// ── Handlers ────────────────────────────────────────────────────────

async fn init_creation_form() -> Json<OwnerFormView> {
    Json(OwnerFormView::clean(Owner::default()))
}

async fn process_creation_form(
    State(svc): State<AppState>,
    Form(fields): Form<OwnerFields>,
) -> Result<Response, ServiceError> {
    let mut owner = fields.into_owner();

    let mut errors = FieldErrors::new();
    validate::validate_owner(&owner, &mut errors);
    if errors.has_errors() {
        return Ok(Json(OwnerFormView::rejected(
            owner,
            errors,
            "There was an error in creating the owner.",
        ))
        .into_response());
    }

    svc.save(&mut owner)?;
    let id = owner
        .id
        .ok_or_else(|| ServiceError::Internal("saved owner has no id".into()))?;

    Ok(redirect_with_message(&format!("/owners/{id}"), "New Owner Created").into_response())
}

async fn init_find_form() -> Json<FindOwnersView> {
    Json(FindOwnersView {
        view: VIEW_FIND_FORM,
        last_name: String::new(),
        errors: FieldErrors::new(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindQuery {
    #[serde(default = "default_page")]
    page: u32,
    /// Empty string signifies the broadest possible search.
    #[serde(default)]
    last_name: String,
}

fn default_page() -> u32 {
    1
}

async fn process_find_form(
    State(svc): State<AppState>,
    Query(query): Query<FindQuery>,
) -> Result<Response, ServiceError> {
    let request = PageRequest::of(query.page, PAGE_SIZE);
    let results = svc.find_by_last_name(&query.last_name, &request)?;

    if results.is_empty() {
        let mut errors = FieldErrors::new();
        errors.reject_value("lastName", "notFound", "not found");
        return Ok(Json(FindOwnersView {
            view: VIEW_FIND_FORM,
            last_name: query.last_name,
            errors,
        })
        .into_response());
    }

    if results.total_items() == 1 {
        if let Some(id) = results.items().first().and_then(|o| o.id) {
            return Ok(Redirect::to(&format!("/owners/{id}")).into_response());
        }
    }

    Ok(Json(OwnersListView {
        view: VIEW_LIST,
        current_page: results.page(),
        total_pages: results.total_pages(),
        total_items: results.total_items(),
        list_owners: results.into_items(),
    })
    .into_response())
}

async fn init_update_form(
    State(svc): State<AppState>,
    Path(owner_id): Path<i64>,
) -> Result<Json<OwnerFormView>, ServiceError> {
    let owner = svc.find_by_id(owner_id)?;
    Ok(Json(OwnerFormView::clean(owner)))
}

async fn process_update_form(
    State(svc): State<AppState>,
    Path(owner_id): Path<i64>,
    Form(fields): Form<OwnerFields>,
) -> Result<Response, ServiceError> {
    let mut owner = svc.find_by_id(owner_id)?;
    fields.apply_to(&mut owner);

    let mut errors = FieldErrors::new();
    validate::validate_owner(&owner, &mut errors);
    if errors.has_errors() {
        return Ok(Json(OwnerFormView::rejected(
            owner,
            errors,
            "There was an error in updating the owner.",
        ))
        .into_response());
    }

    // The path parameter decides identity, whatever the submission held.
    owner.id = Some(owner_id);
    svc.save(&mut owner)?;

    Ok(redirect_with_message(&format!("/owners/{owner_id}"), "Owner Values Updated")
        .into_response())
}

#[derive(Debug, Deserialize)]
struct DetailQuery {
    message: Option<String>,
}

async fn show_owner(
    State(svc): State<AppState>,
    Path(owner_id): Path<i64>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<OwnerDetailsView>, ServiceError> {
    let owner = svc.find_by_id(owner_id)?;
    Ok(Json(OwnerDetailsView {
        view: VIEW_DETAILS,
        owner,
        message: query.message,
    }))
}
