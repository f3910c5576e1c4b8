//! Shared application state handed to every handler.

use std::sync::Arc;

use resman_auth::{AccountService, AuthConfig, AuthorizationGate, GoogleProvider};
use resman_db::SurrealStore;
use resman_service::{BulkImporter, HierarchyConfig, HierarchyService, ListingEngine};
use surrealdb::engine::any::Any;

use crate::config::{RateLimitConfig, ServerConfig};
use crate::rate_limit::RateLimiter;

pub type AppStore = SurrealStore<Any>;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService<AppStore>>,
    pub gate: Arc<AuthorizationGate<AppStore>>,
    pub hierarchy: Arc<HierarchyService<AppStore>>,
    pub listing: Arc<ListingEngine<AppStore>>,
    pub importer: Arc<BulkImporter<AppStore>>,
    pub google: Option<Arc<GoogleProvider>>,
    pub limiter: Arc<RateLimiter>,
    pub rate_limit: RateLimitConfig,
    pub allowed_origin: Option<String>,
}

impl AppState {
    /// Wire every service over one store. Built once at startup.
    pub fn new(store: Arc<AppStore>, auth: Arc<AuthConfig>, config: &ServerConfig) -> Self {
        let hierarchy = HierarchyConfig {
            pepper: auth.pepper.clone(),
            min_password_length: auth.min_password_length,
        };
        Self {
            accounts: Arc::new(AccountService::new(store.clone(), auth.clone())),
            gate: Arc::new(AuthorizationGate::new(store.clone(), auth)),
            hierarchy: Arc::new(HierarchyService::new(store.clone(), hierarchy)),
            listing: Arc::new(ListingEngine::new(store.clone(), config.listing.max_limit)),
            importer: Arc::new(BulkImporter::new(store, config.import.max_bytes)),
            google: config
                .oauth
                .clone()
                .map(|google| Arc::new(GoogleProvider::new(google))),
            limiter: Arc::new(RateLimiter::new()),
            rate_limit: config.rate_limit.clone(),
            allowed_origin: config.http.allowed_origin.clone(),
        }
    }
}
