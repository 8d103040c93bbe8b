// Expense Intake - Web Server
// REST API over the submission controller

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, patch},
    Router,
};
use expense_intake::{
    init_tracing, write_csv, ExpenseError, ExpenseForm, ExpenseRecord, ExpenseStatus, Settings,
    SubmissionController, CATEGORY_OPTIONS,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const CONFIG_ENV: &str = "EXPENSE_CONFIG";
const PORT_ENV: &str = "EXPENSE_PORT";

/// Shared application state
#[derive(Clone)]
struct AppState {
    controller: Arc<SubmissionController>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Deserialize)]
struct StatusUpdateRequest {
    status: String,
}

fn error_status(e: &ExpenseError) -> StatusCode {
    match e {
        ExpenseError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ExpenseError::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
        ExpenseError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(context: &str, e: ExpenseError) -> Response {
    error!(error = %e, "{}", context);
    (error_status(&e), Json(ApiResponse::<()>::err(e.to_string()))).into_response()
}

fn decode_id(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/categories - Category options for the form
async fn get_categories() -> impl IntoResponse {
    Json(ApiResponse::ok(CATEGORY_OPTIONS))
}

/// GET /api/expenses - Get all expenses
async fn get_expenses(State(state): State<AppState>) -> Response {
    match state.controller.store().list().await {
        Ok(records) => (StatusCode::OK, Json(ApiResponse::ok(records))).into_response(),
        Err(e) => error_response("Error listing expenses", e),
    }
}

/// GET /api/filters/:status - Expenses with one status
async fn filter_expenses(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> Response {
    let status: ExpenseStatus = match status.parse() {
        Ok(s) => s,
        Err(e) => return error_response("Bad status filter", e),
    };

    match state.controller.store().list().await {
        Ok(records) => {
            let filtered: Vec<ExpenseRecord> =
                records.into_iter().filter(|r| r.status == status).collect();
            (StatusCode::OK, Json(ApiResponse::ok(filtered))).into_response()
        }
        Err(e) => error_response("Error filtering expenses", e),
    }
}

/// GET /api/expenses/:id - One expense
async fn get_expense(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = decode_id(&id);

    match state.controller.store().get(&id).await {
        Ok(Some(record)) => (StatusCode::OK, Json(ApiResponse::ok(record))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::err(format!("Expense {} not found", id))),
        )
            .into_response(),
        Err(e) => error_response("Error reading expense", e),
    }
}

/// POST /api/expenses - Submit the form
async fn submit_expense(State(state): State<AppState>, Json(form): Json<ExpenseForm>) -> Response {
    let outcome = state.controller.submit(&form).await;
    let code = if outcome.success {
        StatusCode::CREATED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (code, Json(outcome)).into_response()
}

/// PATCH /api/expenses/:id/status - Approve / reject
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> Response {
    let id = decode_id(&id);
    let status: ExpenseStatus = match body.status.parse() {
        Ok(s) => s,
        Err(e) => return error_response("Bad status value", e),
    };

    match state.controller.store().update_status(&id, status).await {
        Ok(true) => (StatusCode::OK, Json(ApiResponse::ok(true))).into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<bool>::err(format!("Expense {} not found", id))),
        )
            .into_response(),
        Err(e) => error_response("Error updating status", e),
    }
}

/// GET /api/export.csv - Expense table as CSV
async fn export_expenses(State(state): State<AppState>) -> Response {
    let records = match state.controller.store().list().await {
        Ok(r) => r,
        Err(e) => return error_response("Error exporting expenses", e),
    };

    let mut body = Vec::new();
    if let Err(e) = write_csv(&mut body, &records) {
        return error_response("Error writing CSV", e);
    }
    ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response()
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(get_categories))
        .route("/expenses", get(get_expenses).post(submit_expense))
        .route("/expenses/:id", get(get_expense))
        .route("/expenses/:id/status", patch(update_status))
        .route("/filters/:status", get(filter_expenses))
        .route("/export.csv", get(export_expenses))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = match std::env::var(CONFIG_ENV) {
        Ok(path) => Settings::from_json_file(std::path::Path::new(&path))?,
        Err(_) => Settings::default(),
    }
    .with_env_overrides()?;

    init_tracing(settings.flags.enable_debug_logs);

    let state = AppState {
        controller: Arc::new(SubmissionController::from_settings(&settings)),
    };
    let app = build_router(state);

    let port: u16 = match std::env::var(PORT_ENV) {
        Ok(raw) => raw.parse()?,
        Err(_) => 3000,
    };
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, mock_mode = settings.flags.use_mock_data, "Expense server running");
    println!("\n🚀 Server running on http://localhost:{}", port);
    println!("   API: http://localhost:{}/api/expenses", port);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}
