// Shop Ledger - Web Server
// JSON API over the dashboard host, backed by the CSV data directory

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use shop_ledger::{
    csv_io, AppConfig, Breakdown, CredentialGate, Dashboard, DashboardHost, Debt, Expense,
    Granularity, RecordStore, Sale, Session,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    host: Arc<DashboardHost>,
    session: Session,
    config: Arc<AppConfig>,
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

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

fn reply<T: Serialize>(result: anyhow::Result<T>, what: &str) -> axum::response::Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Err(e) => {
            log::error!("Error getting {}: {:#}", what, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<T>::err(format!("{:#}", e))),
            )
                .into_response()
        }
    }
}

fn current_dashboard(state: &AppState) -> anyhow::Result<Dashboard> {
    state.host.current(&state.session, state.config.now()?)
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/dashboard - Global totals plus every breakdown
async fn get_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    reply(current_dashboard(&state), "dashboard")
}

/// GET /api/breakdown/:granularity - One chart's buckets and totals
async fn get_breakdown(
    State(state): State<AppState>,
    Path(granularity): Path<String>,
) -> impl IntoResponse {
    let Some(granularity) = Granularity::parse(&granularity) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<Breakdown>::err(format!(
                "Unknown granularity: {}",
                granularity
            ))),
        )
            .into_response();
    };

    let result = current_dashboard(&state).map(|d| d.breakdown(granularity).clone());
    reply(result, "breakdown")
}

/// GET /api/sales
async fn get_sales(State(state): State<AppState>) -> impl IntoResponse {
    reply::<Vec<Sale>>(state.host.store().list_sales(), "sales")
}

/// GET /api/expenses
async fn get_expenses(State(state): State<AppState>) -> impl IntoResponse {
    reply::<Vec<Expense>>(state.host.store().list_expenses(), "expenses")
}

/// GET /api/debts
async fn get_debts(State(state): State<AppState>) -> impl IntoResponse {
    reply::<Vec<Debt>>(state.host.store().list_debts(), "debts")
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    println!("🌐 Shop Ledger - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = AppConfig::load()?;
    let session = CredentialGate::from_config(&config).sign_in(
        &std::env::var("SHOP_LEDGER_USER").unwrap_or_default(),
        &std::env::var("SHOP_LEDGER_PASSWORD").unwrap_or_default(),
    )?;

    let store: Arc<dyn RecordStore> = Arc::new(csv_io::load_store(&config)?);
    let host = Arc::new(DashboardHost::from_config(store, &config)?);
    host.attach();
    println!("✓ Data loaded from {}", config.data_dir.display());

    let addr = config.server_addr.clone();
    let state = AppState {
        host,
        session,
        config: Arc::new(config),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/breakdown/:granularity", get(get_breakdown))
        .route("/sales", get(get_sales))
        .route("/expenses", get(get_expenses))
        .route("/debts", get(get_debts))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/dashboard", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}
