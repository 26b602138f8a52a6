//! HTTP request handlers of the payroll API.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::closing::{CancellationOutcome, ClosureOutcome};
use crate::declarations::{CnamDeclaration, CnssDeclaration, ItsDeclaration};
use crate::error::PayrollResult;
use crate::export::BankFileSummary;
use crate::models::{JournalEntry, PeriodState};
use crate::payroll::PayrollRunRequest;
use crate::service::PayrollService;

use super::request::{ClosingQuery, DeclarationQuery, parse_period, parse_quarter};
use super::response::{
    ApiError, ApiErrorResponse, DeclarationResponse, FileResponse, PayrollRunResponse,
};
use super::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/period", get(period_handler))
        .route("/period/close", post(close_period_handler))
        .route("/period/cancel", post(cancel_closure_handler))
        .route("/payroll/run", post(run_payroll_handler))
        .route("/declarations/its/:period", get(its_handler))
        .route("/declarations/cnss/:year/:quarter", get(cnss_handler))
        .route("/declarations/cnam/:year/:quarter", get(cnam_handler))
        .route("/accounting/:period/journal", post(journal_handler))
        .route("/accounting/:period/unl", post(unl_handler))
        .route("/exports/:period/bank-files", post(bank_files_handler))
        .route("/exports/:period/register", post(register_handler))
        .with_state(state)
}

/// Runs a service operation on the blocking pool and logs its outcome.
async fn blocking<T, F>(state: &AppState, operation: &'static str, f: F) -> ApiResult<T>
where
    F: FnOnce(&PayrollService) -> PayrollResult<T> + Send + 'static,
    T: Send + 'static,
{
    let correlation_id = Uuid::new_v4();
    let service = Arc::clone(state.service());
    let start = Instant::now();
    debug!(correlation_id = %correlation_id, operation, "Processing request");

    let result = tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|err| {
            warn!(correlation_id = %correlation_id, operation, error = %err, "Worker failed");
            ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("WORKER_FAILED", err.to_string()),
            )
        })?;

    match result {
        Ok(value) => {
            info!(
                correlation_id = %correlation_id,
                operation,
                duration_us = start.elapsed().as_micros(),
                "Request completed"
            );
            Ok(Json(value))
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, operation, error = %err, "Request failed");
            Err(err.into())
        }
    }
}

fn json_rejection(rejection: JsonRejection, correlation_id: Uuid) -> ApiErrorResponse {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(correlation_id = %correlation_id, error = %body_text, "JSON data error");
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "JSON syntax error");
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::new(StatusCode::BAD_REQUEST, error)
}

/// GET /period
async fn period_handler(State(state): State<AppState>) -> ApiResult<PeriodState> {
    blocking(&state, "period_state", |service| service.period_state()).await
}

/// POST /period/close
async fn close_period_handler(
    State(state): State<AppState>,
    Query(query): Query<ClosingQuery>,
) -> ApiResult<ClosureOutcome> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    blocking(&state, "close_period", move |service| service.close_period(today)).await
}

/// POST /period/cancel
async fn cancel_closure_handler(
    State(state): State<AppState>,
    Query(query): Query<ClosingQuery>,
) -> ApiResult<CancellationOutcome> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    blocking(&state, "cancel_last_closure", move |service| {
        service.cancel_last_closure(today)
    })
    .await
}

/// POST /payroll/run
///
/// Streams the batch events into the log while the run progresses and
/// returns them with the final report. Dropping the request cancels the
/// remaining rows.
async fn run_payroll_handler(
    State(state): State<AppState>,
    payload: Result<Json<PayrollRunRequest>, JsonRejection>,
) -> ApiResult<PayrollRunResponse> {
    let correlation_id = Uuid::new_v4();
    let request = payload
        .map_err(|rejection| json_rejection(rejection, correlation_id))?
        .0;
    info!(
        correlation_id = %correlation_id,
        period = %request.period,
        motif = %request.motif_code,
        employees = request.employee_ids.len(),
        "Processing payroll run"
    );

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let (handle, mut receiver) = state
        .service()
        .start_payroll(request, cancel)
        .map_err(|err| {
            warn!(correlation_id = %correlation_id, error = %err, "Payroll run refused");
            ApiErrorResponse::from(err)
        })?;

    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        debug!(correlation_id = %correlation_id, event = ?event, "Payroll progress");
        events.push(event);
    }
    let report = handle.await.map_err(|err| {
        ApiErrorResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("WORKER_FAILED", err.to_string()),
        )
    })?;
    info!(
        correlation_id = %correlation_id,
        summary = %report.summary(),
        "Payroll run finished"
    );
    Ok(Json(PayrollRunResponse {
        correlation_id,
        report,
        events,
    }))
}

/// GET /declarations/its/:period
async fn its_handler(
    State(state): State<AppState>,
    Path(period): Path<String>,
    Query(query): Query<DeclarationQuery>,
) -> ApiResult<DeclarationResponse<ItsDeclaration>> {
    let period = parse_period(&period)?;
    blocking(&state, "its_declaration", move |service| {
        let declaration = service.its_declaration(period)?;
        let file = query
            .write
            .then(|| declaration.write_csv(service.report_dir()))
            .transpose()?;
        Ok(DeclarationResponse { declaration, file })
    })
    .await
}

/// GET /declarations/cnss/:year/:quarter
async fn cnss_handler(
    State(state): State<AppState>,
    Path((year, quarter)): Path<(i32, u32)>,
    Query(query): Query<DeclarationQuery>,
) -> ApiResult<DeclarationResponse<CnssDeclaration>> {
    let quarter = parse_quarter(year, quarter)?;
    blocking(&state, "cnss_declaration", move |service| {
        let declaration = service.cnss_declaration(quarter)?;
        let file = query
            .write
            .then(|| declaration.write_csv(service.report_dir()))
            .transpose()?;
        Ok(DeclarationResponse { declaration, file })
    })
    .await
}

/// GET /declarations/cnam/:year/:quarter
async fn cnam_handler(
    State(state): State<AppState>,
    Path((year, quarter)): Path<(i32, u32)>,
    Query(query): Query<DeclarationQuery>,
) -> ApiResult<DeclarationResponse<CnamDeclaration>> {
    let quarter = parse_quarter(year, quarter)?;
    blocking(&state, "cnam_declaration", move |service| {
        let declaration = service.cnam_declaration(quarter)?;
        let file = query
            .write
            .then(|| declaration.write_csv(service.report_dir()))
            .transpose()?;
        Ok(DeclarationResponse { declaration, file })
    })
    .await
}

/// POST /accounting/:period/journal
async fn journal_handler(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> ApiResult<JournalEntry> {
    let period = parse_period(&period)?;
    blocking(&state, "generate_journal", move |service| {
        service.generate_journal(period)
    })
    .await
}

/// POST /accounting/:period/unl
async fn unl_handler(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> ApiResult<FileResponse> {
    let period = parse_period(&period)?;
    blocking(&state, "write_unl", move |service| {
        service.write_unl(period).map(|path| FileResponse { path })
    })
    .await
}

/// POST /exports/:period/bank-files
async fn bank_files_handler(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> ApiResult<Vec<BankFileSummary>> {
    let period = parse_period(&period)?;
    blocking(&state, "write_bank_files", move |service| {
        service.write_bank_files(period)
    })
    .await
}

/// POST /exports/:period/register
async fn register_handler(
    State(state): State<AppState>,
    Path(period): Path<String>,
) -> ApiResult<FileResponse> {
    let period = parse_period(&period)?;
    blocking(&state, "write_payroll_register", move |service| {
        service
            .write_payroll_register(period)
            .map(|path| FileResponse { path })
    })
    .await
}
