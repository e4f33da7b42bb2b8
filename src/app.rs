//! Application assembly shared by the binary and the integration tests.

use actix_web::web;
use std::sync::Arc;

use crate::auth::{IdentityResolver, PasswordHasher};
use crate::routes;
use crate::services::{AccountService, TaskService};
use crate::store::Store;

/// Everything a worker needs to serve requests. Cheap to clone; each `HttpServer`
/// worker gets its own copy pointing at the same services.
#[derive(Clone)]
pub struct AppState {
    accounts: web::Data<AccountService>,
    tasks: web::Data<TaskService>,
    identity: web::Data<dyn IdentityResolver>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: PasswordHasher,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            accounts: web::Data::new(AccountService::new(store.clone(), hasher)),
            tasks: web::Data::new(TaskService::new(store)),
            identity: web::Data::from(identity),
        }
    }

    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    pub fn identity(&self) -> &dyn IdentityResolver {
        self.identity.get_ref()
    }

    /// Registers shared state, `/health` and the `/api` scope.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.accounts.clone())
            .app_data(self.tasks.clone())
            .app_data(self.identity.clone())
            .app_data(routes::json_config())
            .app_data(routes::query_config())
            .service(routes::health::health)
            .service(web::scope("/api").configure(routes::config));
    }
}
