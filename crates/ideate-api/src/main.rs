//! ideate-api - HTTP API server for the ideate board

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use ideate_core::{
    share_url, CreateIdeaRequest, IdeaRepository, Platform, ReorderOutcome, ShareConfig,
    SortUpdate, TagRepository, UpdateIdeaRequest,
};
use ideate_db::Database;

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically, which keeps
/// log correlation and debugging straightforward.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Global rate limiter type (direct quota, no keyed bucketing for a personal
/// board).
type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    db: Database,
    /// Global rate limiter (None if rate limiting is disabled).
    rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

// =============================================================================
// CORS CONFIGURATION HELPER
// =============================================================================

/// Parse allowed origins from the comma-separated `ALLOWED_ORIGINS`
/// environment variable, falling back to local development origins.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

    if origins_str.trim().is_empty() {
        return vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"),
        ];
    }

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse().ok()
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "ideate_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ideate_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("ideate-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/ideate".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    // Rate limiting configuration (generous for a personal board)
    // RATE_LIMIT_REQUESTS: requests per period (default: 100)
    // RATE_LIMIT_PERIOD_SECS: period in seconds (default: 60 = 1 minute)
    let rate_limit_requests: u32 = std::env::var("RATE_LIMIT_REQUESTS")
        .unwrap_or_else(|_| "100".to_string())
        .parse()
        .unwrap_or(100);
    let rate_limit_period_secs: u64 = std::env::var("RATE_LIMIT_PERIOD_SECS")
        .unwrap_or_else(|_| "60".to_string())
        .parse()
        .unwrap_or(60);
    let rate_limit_enabled: bool = std::env::var("RATE_LIMIT_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    info!(
        "Rate limiting: {} ({} requests per {} seconds)",
        if rate_limit_enabled {
            "enabled"
        } else {
            "disabled"
        },
        rate_limit_requests,
        rate_limit_period_secs
    );

    let rate_limiter = if rate_limit_enabled {
        let burst = NonZeroU32::new(rate_limit_requests).unwrap_or(NonZeroU32::MIN);
        let period =
            std::time::Duration::from_secs(rate_limit_period_secs.max(1)) / burst.get();
        Quota::with_period(period)
            .map(|quota| Arc::new(RateLimiter::direct(quota.allow_burst(burst))))
    } else {
        None
    };

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    let state = AppState { db, rate_limiter };

    let app = Router::new()
        // System
        .route("/health", get(health_check))
        .route("/api/rate-limit/status", get(rate_limit_status))
        // Ideas
        .route("/api/ideas", get(list_ideas).post(create_idea))
        .route("/api/ideas/reorder", put(reorder_ideas))
        .route(
            "/api/ideas/:id",
            get(get_idea).put(update_idea).delete(delete_idea),
        )
        .route("/api/ideas/:id/tags", put(update_idea_tags))
        .route("/api/ideas/:id/move", put(move_idea))
        .route("/api/ideas/:id/share", get(share_idea))
        // Tags
        .route("/api/tags", get(list_tags))
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            let allowed_origins = parse_allowed_origins();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(3600))
        })
        .layer(RequestBodyLimitLayer::new(1024 * 1024)) // 1 MB
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// RATE LIMITING MIDDLEWARE
// =============================================================================

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    // If rate limiting is disabled, pass through
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!("Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "rate_limit_exceeded",
                    "error_description": "Too many requests. Please wait before retrying."
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}

/// Get rate limiting status.
async fn rate_limit_status(State(state): State<AppState>) -> impl IntoResponse {
    if state.rate_limiter.is_some() {
        Json(serde_json::json!({
            "enabled": true,
            "message": "Rate limiting is active"
        }))
    } else {
        Json(serde_json::json!({
            "enabled": false,
            "message": "Rate limiting is disabled"
        }))
    }
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// IDEA HANDLERS
// =============================================================================

/// Parse an optional platform query/body value, treating blank as absent.
fn parse_platform(value: Option<&str>) -> Result<Option<Platform>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<Platform>()
            .map(Some)
            .map_err(ApiError::BadRequest),
    }
}

#[derive(Debug, Deserialize)]
struct ListIdeasQuery {
    platform: Option<String>,
}

async fn list_ideas(
    State(state): State<AppState>,
    Query(query): Query<ListIdeasQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let platform = parse_platform(query.platform.as_deref())?;
    let ideas = state.db.ideas.list(platform).await?;
    Ok(Json(ideas))
}

#[derive(Debug, Deserialize)]
struct CreateIdeaBody {
    title: String,
    description: Option<String>,
    platform: String,
    #[serde(default)]
    tags: Vec<String>,
}

async fn create_idea(
    State(state): State<AppState>,
    Json(body): Json<CreateIdeaBody>,
) -> Result<impl IntoResponse, ApiError> {
    let title = body.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    let platform = body
        .platform
        .parse::<Platform>()
        .map_err(ApiError::BadRequest)?;

    let idea = state
        .db
        .ideas
        .insert(CreateIdeaRequest {
            title,
            description: body.description,
            platform,
            tags: body.tags,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(idea)))
}

async fn get_idea(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let idea = state.db.ideas.fetch(id).await?;
    Ok(Json(idea))
}

#[derive(Debug, Deserialize)]
struct UpdateIdeaBody {
    title: Option<String>,
    description: Option<String>,
    platform: Option<String>,
    order: Option<i32>,
}

async fn update_idea(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateIdeaBody>,
) -> Result<impl IntoResponse, ApiError> {
    let title = match body.title {
        Some(t) => {
            let trimmed = t.trim().to_string();
            if trimmed.is_empty() {
                return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
            }
            Some(trimmed)
        }
        None => None,
    };
    let platform = parse_platform(body.platform.as_deref())?;

    let idea = state
        .db
        .ideas
        .update(
            id,
            UpdateIdeaRequest {
                title,
                description: body.description,
                platform,
                sort_key: body.order,
            },
        )
        .await?;

    Ok(Json(idea))
}

#[derive(Debug, Deserialize)]
struct UpdateIdeaTagsBody {
    tags: Vec<String>,
}

async fn update_idea_tags(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateIdeaTagsBody>,
) -> Result<impl IntoResponse, ApiError> {
    let idea = state.db.ideas.set_tags(id, body.tags).await?;
    Ok(Json(idea))
}

async fn delete_idea(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.ideas.delete(id).await?;
    Ok(Json(serde_json::json!({
        "message": "Idea deleted successfully"
    })))
}

#[derive(Debug, Deserialize)]
struct ReorderBody {
    updates: Vec<SortUpdate>,
}

async fn reorder_ideas(
    State(state): State<AppState>,
    Json(body): Json<ReorderBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.updates.is_empty() {
        return Err(ApiError::BadRequest(
            "Reorder batch must not be empty".to_string(),
        ));
    }

    match state.db.ideas.reorder(body.updates).await? {
        ReorderOutcome::Applied { updated } => {
            tracing::debug!(update_count = updated, "Reorder batch applied");
            Ok(Json(serde_json::json!({
                "message": "Orders updated successfully"
            })))
        }
        ReorderOutcome::Rejected { missing } => Err(ApiError::BadRequest(format!(
            "Reorder batch references unknown idea ids: {:?}",
            missing
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct MoveIdeaBody {
    position: usize,
}

async fn move_idea(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<MoveIdeaBody>,
) -> Result<impl IntoResponse, ApiError> {
    let ideas = state.db.ideas.move_to(id, body.position).await?;
    Ok(Json(ideas))
}

#[derive(Debug, Deserialize)]
struct ShareQuery {
    /// Optional link to attach to the share intent.
    url: Option<String>,
}

async fn share_idea(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<ShareQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let idea = state.db.ideas.fetch(id).await?;

    let config = ShareConfig {
        text: idea.idea.title.clone(),
        url: query.url,
        title: None,
        tags: idea.tags.iter().map(|t| t.name.clone()).collect(),
    };

    match share_url(idea.idea.platform, &config) {
        Some(url) => Ok(Json(serde_json::json!({
            "platform": idea.idea.platform,
            "url": url,
        }))),
        None => Err(ApiError::BadRequest(format!(
            "Platform '{}' has no share intent",
            idea.idea.platform
        ))),
    }
}

// =============================================================================
// TAG HANDLERS
// =============================================================================

async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let tags = state.db.tags.list().await?;
    Ok(Json(tags))
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
enum ApiError {
    Database(ideate_core::Error),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<ideate_core::Error> for ApiError {
    fn from(err: ideate_core::Error) -> Self {
        match &err {
            ideate_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            ideate_core::Error::IdeaNotFound(id) => {
                ApiError::NotFound(format!("Idea {} not found", id))
            }
            ideate_core::Error::TagNotFound(name) => {
                ApiError::NotFound(format!("Tag '{}' not found", name))
            }
            ideate_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            ideate_core::Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    let friendly_msg = if msg.contains("idx_unique_tag_name") {
                        "A tag with this name already exists".to_string()
                    } else {
                        msg
                    };
                    return ApiError::Conflict(friendly_msg);
                }
                if msg.contains("foreign key") {
                    return ApiError::BadRequest(msg);
                }
                ApiError::Database(err)
            }
            _ => ApiError::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
