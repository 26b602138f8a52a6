//! Application state shared by the request handlers.

use std::sync::Arc;

use crate::service::PayrollService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    service: Arc<PayrollService>,
}

impl AppState {
    /// Creates the state around a payroll service.
    pub fn new(service: PayrollService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Returns the payroll service.
    pub fn service(&self) -> &Arc<PayrollService> {
        &self.service
    }
}
