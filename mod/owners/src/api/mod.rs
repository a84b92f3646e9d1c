pub mod owner;
pub mod pet;

use std::sync::Arc;

use axum::Router;
use axum::response::Redirect;

use crate::service::OwnerService;

/// Shared application state.
pub type AppState = Arc<OwnerService>;

/// Build the owners API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(owner::routes())
        .merge(pet::routes())
        .with_state(state)
}

/// 303-redirect carrying a one-shot success message as a query
/// parameter; the detail view echoes it back. The stateless stand-in
/// for a session flash attribute.
pub(crate) fn redirect_with_message(path: &str, message: &str) -> Redirect {
    match serde_urlencoded::to_string([("message", message)]) {
        Ok(query) => Redirect::to(&format!("{path}?{query}")),
        Err(_) => Redirect::to(path),
    }
}
