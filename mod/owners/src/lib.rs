pub mod api;
pub mod format;
pub mod model;
pub mod service;
pub mod validate;

use std::sync::Arc;

use axum::Router;

use petclinic_core::{Module, ServiceError};
use petclinic_sql::SqlStore;

use service::OwnerService;

/// Owners module — owner and pet management.
pub struct OwnersModule {
    service: Arc<OwnerService>,
}

impl OwnersModule {
    pub fn new(sql: Box<dyn SqlStore>) -> Result<Self, ServiceError> {
        Ok(Self {
            service: Arc::new(OwnerService::new(sql)?),
        })
    }

    pub fn service(&self) -> Arc<OwnerService> {
        self.service.clone()
    }
}

impl Module for OwnersModule {
    fn name(&self) -> &str {
        "owners"
    }

    fn routes(&self) -> Router {
        api::router(self.service.clone())
    }
}
