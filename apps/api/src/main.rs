//! Issuegate API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod handlers;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::routing::{get, post};
use issuegate_application::{
    AdminGuard, ApprovalNotifier, ApprovalService, IdentityVerifier, PermissionService,
};
use issuegate_core::{AppError, IdentityClaims};
use issuegate_infrastructure::{
    ConsoleApprovalNotifier, HttpIdentityVerifier, PostgresApprovalRepository,
    PostgresAuditLogRepository, PostgresDirectoryRepository, PostgresIssueRepository,
    PostgresSettingsRepository, StaticIdentityVerifier, WebhookApprovalNotifier,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let public_base_url = required_env("PUBLIC_BASE_URL")?;
    Url::parse(&public_base_url)
        .map_err(|error| AppError::Validation(format!("invalid PUBLIC_BASE_URL: {error}")))?;

    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let auth_provider = env::var("AUTH_PROVIDER").unwrap_or_else(|_| "introspection".to_owned());
    let notifier_provider = env::var("NOTIFIER_PROVIDER").unwrap_or_else(|_| "webhook".to_owned());

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let http_client = reqwest::Client::new();

    let identity_verifier: Arc<dyn IdentityVerifier> = match auth_provider.as_str() {
        "introspection" => {
            let introspection_url = required_non_empty_env("AUTH_INTROSPECTION_URL")?;
            Arc::new(HttpIdentityVerifier::new(
                http_client.clone(),
                introspection_url,
            ))
        }
        "static" => {
            let admin_token = required_non_empty_env("AUTH_STATIC_ADMIN_TOKEN")?;
            Arc::new(StaticIdentityVerifier::new().with_token(
                admin_token,
                IdentityClaims::new("static-admin", None, Some("Super Admin".to_owned())),
            ))
        }
        _ => {
            return Err(AppError::Validation(format!(
                "AUTH_PROVIDER must be either 'introspection' or 'static', got '{auth_provider}'"
            )));
        }
    };

    let notifier: Arc<dyn ApprovalNotifier> = match notifier_provider.as_str() {
        "webhook" => Arc::new(WebhookApprovalNotifier::new(http_client)),
        "console" => Arc::new(ConsoleApprovalNotifier::new()),
        _ => {
            return Err(AppError::Validation(format!(
                "NOTIFIER_PROVIDER must be either 'webhook' or 'console', got '{notifier_provider}'"
            )));
        }
    };

    let directory = Arc::new(PostgresDirectoryRepository::new(pool.clone()));
    let approval_repository = Arc::new(PostgresApprovalRepository::new(pool.clone()));
    let issue_repository = Arc::new(PostgresIssueRepository::new(pool.clone()));
    let settings_repository = Arc::new(PostgresSettingsRepository::new(pool.clone()));
    let audit_repository = Arc::new(PostgresAuditLogRepository::new(pool));

    let app_state = AppState {
        approval_service: ApprovalService::new(
            approval_repository,
            issue_repository,
            settings_repository,
            notifier,
            audit_repository,
            public_base_url,
        ),
        permission_service: PermissionService::new(directory.clone(), directory),
        admin_guard: AdminGuard::new(identity_verifier),
    };

    // The decision endpoint is opened from chat clients on arbitrary
    // origins, so CORS stays permissive like the original hosts.
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/approvals",
            post(handlers::approvals::create_approval_handler),
        )
        .route(
            "/api/approvals/decision",
            get(handlers::approvals::approval_decision_handler),
        )
        .route(
            "/api/permissions/recompute",
            post(handlers::permissions::recompute_permissions_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "issuegate-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
