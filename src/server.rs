//! HTTP API for secret retrieval.
//!
//! Routes live under `/api/keyvault`:
//! - `GET /secret/{name}`: fetch through the shared client
//! - `GET /secret/v0/{name}`: fetch through a client built for the request
//! - `GET /health`: liveness, independent of the vault
//!
//! The OpenAPI description of these routes is served at
//! `GET /api-docs/openapi.json`.

use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::gateway::{ClientLifecycle, ErrorKind, SecretGateway, SecretResult};

pub const HEALTH_MESSAGE: &str = "Azure Key Vault integration is running";
pub const DISABLED_MESSAGE: &str = "Key Vault integration is disabled";

/// Response envelope returned by the secret endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretResponse {
    /// Name of the requested secret
    #[schema(example = "database-password")]
    pub name: String,
    /// Secret value, present only on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Sup3rSecret")]
    pub value: Option<String>,
    /// When the response was produced
    pub retrieved_at: DateTime<Utc>,
    pub success: bool,
    /// Present only on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "Secret not found: database-password")]
    pub error_message: Option<String>,
}

impl SecretResponse {
    pub fn error(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: None,
            retrieved_at: Utc::now(),
            success: false,
            error_message: Some(message.into()),
        }
    }

    /// Maps a fetch outcome to its HTTP status and envelope. Failure
    /// envelopes carry the fixed per-kind message, never the cause.
    pub fn from_result(result: SecretResult) -> (StatusCode, Self) {
        match result {
            SecretResult::Success {
                name,
                value,
                retrieved_at,
            } => (
                StatusCode::OK,
                Self {
                    name,
                    value: Some(value),
                    retrieved_at,
                    success: true,
                    error_message: None,
                },
            ),
            SecretResult::Failure { name, kind, .. } => {
                (status_for(kind), Self::error(&name, kind.public_message(&name)))
            }
        }
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::AuthenticationFailed => StatusCode::UNAUTHORIZED,
        ErrorKind::SecretNotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// State shared by all workers. `None` when the integration is disabled.
pub struct AppState {
    gateway: Option<SecretGateway>,
}

impl AppState {
    pub fn new(gateway: Option<SecretGateway>) -> Self {
        Self { gateway }
    }
}

/// Fetch a secret through the shared client
#[utoipa::path(
    get,
    path = "/api/keyvault/secret/{name}",
    params(("name" = String, Path, description = "Name of the secret", example = "database-password")),
    responses(
        (status = 200, description = "Secret retrieved", body = SecretResponse),
        (status = 401, description = "The service principal was rejected", body = SecretResponse),
        (status = 404, description = "No secret with this name", body = SecretResponse),
        (status = 500, description = "Unexpected failure or integration disabled", body = SecretResponse)
    ),
    tag = "Azure Key Vault"
)]
async fn get_secret(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    respond(&state, &path.into_inner(), ClientLifecycle::Shared).await
}

/// Fetch a secret through a client built for this request
#[utoipa::path(
    get,
    path = "/api/keyvault/secret/v0/{name}",
    params(("name" = String, Path, description = "Name of the secret", example = "database-password")),
    responses(
        (status = 200, description = "Secret retrieved", body = SecretResponse),
        (status = 401, description = "The service principal was rejected", body = SecretResponse),
        (status = 404, description = "No secret with this name", body = SecretResponse),
        (status = 500, description = "Unexpected failure or integration disabled", body = SecretResponse)
    ),
    tag = "Azure Key Vault"
)]
async fn get_secret_v0(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    respond(&state, &path.into_inner(), ClientLifecycle::Ephemeral).await
}

/// Liveness check; does not contact the vault
#[utoipa::path(
    get,
    path = "/api/keyvault/health",
    responses(
        (status = 200, description = "Service is running", body = String, content_type = "text/plain")
    ),
    tag = "Azure Key Vault"
)]
async fn health() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(HEALTH_MESSAGE)
}

async fn respond(state: &AppState, name: &str, lifecycle: ClientLifecycle) -> HttpResponse {
    info!(secret = name, ?lifecycle, "Received request to retrieve secret");

    let Some(gateway) = &state.gateway else {
        warn!(secret = name, "Secret requested while the integration is disabled");
        return HttpResponse::InternalServerError().json(SecretResponse::error(name, DISABLED_MESSAGE));
    };

    let (status, body) = SecretResponse::from_result(gateway.fetch(name, lifecycle).await);
    if body.success {
        info!(secret = name, ?lifecycle, "Successfully returned secret");
    }
    HttpResponse::build(status).json(body)
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Azure Key Vault Integration API",
        version = "1.0.0",
        description = "Retrieves secrets from Azure Key Vault with a service principal",
        contact(name = "Azure Key Vault Integration Team", email = "support@example.com"),
        license(name = "MIT License", url = "https://opensource.org/licenses/MIT")
    ),
    servers((url = "http://localhost:8080", description = "Local Development Server")),
    paths(get_secret, get_secret_v0, health),
    components(schemas(SecretResponse)),
    tags((name = "Azure Key Vault", description = "Secret retrieval"))
)]
pub struct ApiDoc;

async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Registers the API routes; used by `start_server` and by tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api-docs/openapi.json", web::get().to(openapi_json))
        .service(
            web::scope("/api/keyvault")
                .route("/health", web::get().to(health))
                .route("/secret/v0/{name}", web::get().to(get_secret_v0))
                .route("/secret/{name}", web::get().to(get_secret)),
        );
}

/// Start the web server on `listen_addr` and run until shutdown.
pub async fn start_server(listen_addr: &str, state: AppState) -> std::io::Result<()> {
    let state = web::Data::new(state);

    info!("Listening on {}", listen_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(listen_addr)?
    .run()
    .await
}
