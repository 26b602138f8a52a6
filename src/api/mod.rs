//! HTTP API of the payroll engine.
//!
//! Every endpoint wraps one [`PayrollService`](crate::service::PayrollService)
//! operation. Blocking work runs on `spawn_blocking`; results and errors are
//! returned as JSON.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{ClosingQuery, DeclarationQuery};
pub use response::{ApiError, ApiErrorResponse, DeclarationResponse, FileResponse, PayrollRunResponse};
pub use state::AppState;
