//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use lms_core::ports::{DatabaseService, MediaService, PaymentService};
use lms_core::service::{CourseService, ProfileService, ProgressService, PurchaseService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<dyn DatabaseService>,
    pub media: Arc<dyn MediaService>,
    pub courses: CourseService,
    pub purchases: PurchaseService,
    pub progress: ProgressService,
    pub profiles: ProfileService,
}

impl AppState {
    /// Wires the domain services over the given ports.
    pub fn new(
        config: Arc<Config>,
        db: Arc<dyn DatabaseService>,
        media: Arc<dyn MediaService>,
        payments: Arc<dyn PaymentService>,
    ) -> Self {
        Self {
            courses: CourseService::new(db.clone(), media.clone()),
            purchases: PurchaseService::new(db.clone(), payments, config.client_url.clone()),
            progress: ProgressService::new(db.clone()),
            profiles: ProfileService::new(db.clone(), media.clone()),
            config,
            db,
            media,
        }
    }
}
