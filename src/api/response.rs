//! Response types of the payroll API.
//!
//! Errors carry a stable `code` for programmatic handling and the error
//! message; successful responses are the domain types serialized as JSON.

use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::batch::{BatchEvent, BatchReport};
use crate::error::PayrollError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// Creates an error response.
    pub fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<PayrollError> for ApiErrorResponse {
    fn from(error: PayrollError) -> Self {
        let message = error.to_string();
        let (status, code) = match &error {
            PayrollError::ConfigNotFound { .. } | PayrollError::ConfigParseError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR")
            }
            PayrollError::LicenseExpired { .. } => (StatusCode::FORBIDDEN, "LICENSE_EXPIRED"),
            PayrollError::InvalidPeriod { .. } => (StatusCode::BAD_REQUEST, "INVALID_PERIOD"),
            PayrollError::PeriodNotOpen { .. } => (StatusCode::CONFLICT, "PERIOD_NOT_OPEN"),
            PayrollError::NoClosureToCancel { .. } => {
                (StatusCode::CONFLICT, "NO_CLOSURE_TO_CANCEL")
            }
            PayrollError::NoPayslips { .. } => (StatusCode::NOT_FOUND, "NO_PAYSLIPS"),
            PayrollError::PayslipClosed { .. } => (StatusCode::CONFLICT, "PAYSLIP_CLOSED"),
            PayrollError::EmployeeNotFound { .. } => (StatusCode::NOT_FOUND, "EMPLOYEE_NOT_FOUND"),
            PayrollError::MotifNotFound { .. } => (StatusCode::NOT_FOUND, "MOTIF_NOT_FOUND"),
            PayrollError::RubriqueNotFound { .. } => {
                (StatusCode::BAD_REQUEST, "RUBRIQUE_NOT_FOUND")
            }
            PayrollError::BankNotFound { .. } => (StatusCode::BAD_REQUEST, "BANK_NOT_FOUND"),
            PayrollError::UnbalancedJournal { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNBALANCED_JOURNAL")
            }
            PayrollError::Export { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_ERROR"),
            PayrollError::CalculationError { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "CALCULATION_ERROR")
            }
            PayrollError::StoreUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
            PayrollError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        };
        ApiErrorResponse::new(status, ApiError::new(code, message))
    }
}

/// Body of `POST /payroll/run`.
#[derive(Debug, Clone, Serialize)]
pub struct PayrollRunResponse {
    /// Identifier of the request in the logs.
    pub correlation_id: Uuid,
    /// Outcome of the run.
    pub report: BatchReport,
    /// Progress events in emission order.
    pub events: Vec<BatchEvent>,
}

/// A file written by an export endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResponse {
    /// Path of the file.
    pub path: PathBuf,
}

/// A declaration, with the path of its CSV list when one was written.
#[derive(Debug, Clone, Serialize)]
pub struct DeclarationResponse<T> {
    /// The declaration itself.
    #[serde(flatten)]
    pub declaration: T,
    /// The CSV list written on request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}
