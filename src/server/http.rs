use super::http_errors::{
    map_account_create_error, map_account_read_error, map_checkout_error, map_generation_error,
    map_webhook_error,
};
use super::http_parse::{clamp_pagination, required_field};
use super::http_types::{
    AccountResponse, CheckoutRequest, CheckoutResponse, CreateAccountRequest, ErrorResponse,
    GenerateRequest, GenerateResponse, GenerationResponse, HealthResponse, PaginationParams,
    WebhookAck,
};
use super::state::AppState;
use crate::domain::{Account, Tone};
use crate::infrastructure::SIGNATURE_HEADER;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, header::HeaderMap, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use validator::Validate;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.app_url);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/generate", post(generate_blog))
        .route("/api/stripe/checkout", post(create_checkout))
        .route("/api/stripe/webhook", post(stripe_webhook))
        .route("/api/accounts", post(create_account))
        .route("/api/accounts/:id", get(get_account))
        .route("/api/accounts/:id/generations", get(list_generations))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(app_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match HeaderValue::from_str(app_url.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!(app_url = %app_url, "app_url is not a valid origin; CORS disabled");
            layer
        }
    }
}

fn bad_request(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!(ErrorResponse {
            error: message.to_string(),
        })),
    )
}

fn invalid_json(rejection: &JsonRejection) -> (StatusCode, Json<serde_json::Value>) {
    warn!(error = %rejection, "Rejected request body");
    bad_request("Invalid JSON body")
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        generate_blog,
        create_checkout,
        stripe_webhook,
        create_account,
        get_account,
        list_generations,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            GenerateRequest,
            GenerateResponse,
            CheckoutRequest,
            CheckoutResponse,
            WebhookAck,
            CreateAccountRequest,
            AccountResponse,
            GenerationResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Generation", description = "Credit-metered blog generation"),
        (name = "Payments", description = "Stripe checkout and webhook endpoints"),
        (name = "Accounts", description = "Account and history endpoints"),
    ),
    info(
        title = "Blogforge API",
        version = "0.1.0",
        description = "Credit-metered SEO blog generation with Stripe billing",
        license(name = "MIT OR Apache-2.0")
    )
)]
struct ApiDoc;

/// Health check endpoint
///
/// Verifies database connectivity and returns service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.account_repo.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                error: None,
            }),
        ),
        Err(e) => {
            error!(error = %e, "Health check failed: DB connectivity issue");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    error: Some("Database connectivity failed".to_string()),
                }),
            )
        }
    }
}

/// Generate a blog post
///
/// Spends one credit. The credit is handed back when the model fails or
/// returns nothing.
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "Generation",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Blog generated", body = GenerateResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 403, description = "Not enough credits", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 502, description = "Model call failed", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
async fn generate_blog(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match body {
        Ok(b) => b,
        Err(rejection) => return invalid_json(&rejection),
    };

    if let Err(errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid request", "details": errors})),
        );
    }

    let (Some(keyword), Some(uid)) = (required_field(req.keyword), required_field(req.uid)) else {
        return bad_request("Missing required fields");
    };
    let tone = Tone::parse(req.tone.as_deref());

    // Run to completion even if the client goes away, so a reserved credit is
    // always either spent or refunded.
    let service = state.generation.clone();
    let task = tokio::spawn(async move { service.generate(&uid, &keyword, tone).await });

    match task.await {
        Ok(Ok(blog)) => (StatusCode::OK, Json(serde_json::json!(GenerateResponse { blog }))),
        Ok(Err(e)) => {
            let (status, body) = map_generation_error(&e);
            if status.is_server_error() {
                error!(error = %e, "Blog generation failed");
            }
            (status, Json(body))
        }
        Err(e) => {
            error!(error = %e, "Generation task aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Something went wrong"})),
            )
        }
    }
}

/// Start a subscription checkout
#[utoipa::path(
    post,
    path = "/api/stripe/checkout",
    tag = "Payments",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout session created", body = CheckoutResponse),
        (status = 400, description = "Missing priceId or uid", body = ErrorResponse),
        (status = 500, description = "Failed to create checkout session", body = ErrorResponse)
    )
)]
async fn create_checkout(
    State(state): State<AppState>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match body {
        Ok(b) => b,
        Err(rejection) => return invalid_json(&rejection),
    };

    if let Err(errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid request", "details": errors})),
        );
    }

    let (Some(price_id), Some(uid)) = (required_field(req.price_id), required_field(req.uid))
    else {
        return bad_request("Missing priceId or uid");
    };

    match state.payments.start_checkout(&uid, &price_id).await {
        Ok(url) => (StatusCode::OK, Json(serde_json::json!(CheckoutResponse { url }))),
        Err(e) => {
            error!(error = %e, "Checkout failed");
            let (status, body) = map_checkout_error(&e);
            (status, Json(body))
        }
    }
}

/// Stripe webhook receiver
///
/// Verifies the signature over the raw body before any parsing.
#[utoipa::path(
    post,
    path = "/api/stripe/webhook",
    tag = "Payments",
    request_body(content = String, content_type = "application/json"),
    params(("stripe-signature" = String, Header, description = "Stripe signature header")),
    responses(
        (status = 200, description = "Event acknowledged", body = WebhookAck),
        (status = 400, description = "Missing or invalid signature", body = ErrorResponse),
        (status = 500, description = "Processing failed, provider should retry", body = ErrorResponse)
    )
)]
async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.payments.handle_notification(&body, signature).await {
        Ok(outcome) => {
            info!(outcome = ?outcome, "Webhook processed");
            (
                StatusCode::OK,
                Json(serde_json::json!(WebhookAck { received: true })),
            )
        }
        Err(e) => {
            let (status, body) = map_webhook_error(&e);
            if status.is_server_error() {
                error!(error = %e, "Webhook processing failed");
            } else {
                warn!(error = %e, "Webhook rejected");
            }
            (status, Json(body))
        }
    }
}

/// Create a new account
///
/// New accounts start on the free plan with the signup allowance.
#[utoipa::path(
    post,
    path = "/api/accounts",
    tag = "Accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created successfully", body = AccountResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Account already exists", body = ErrorResponse),
        (status = 500, description = "Failed to create account", body = ErrorResponse)
    )
)]
async fn create_account(
    State(state): State<AppState>,
    body: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match body {
        Ok(b) => b,
        Err(rejection) => return invalid_json(&rejection),
    };

    if let Err(errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Invalid request", "details": errors})),
        );
    }

    let Some(uid) = required_field(Some(req.uid)) else {
        return bad_request("Missing required fields");
    };

    let account = Account::new(uid, req.email.trim().to_string());
    match state.account_repo.create(&account).await {
        Ok(()) => {
            info!(account_id = %account.id, "Account created");
            (
                StatusCode::CREATED,
                Json(serde_json::json!(AccountResponse::from(account))),
            )
        }
        Err(e) => {
            error!(error = %e, "Failed to create account");
            let (status, body) = map_account_create_error(&e);
            (status, Json(body))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/accounts/{id}",
    tag = "Accounts",
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account found", body = AccountResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
async fn get_account(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.account_repo.get_by_id(&id).await {
        Ok(account) => (
            StatusCode::OK,
            Json(serde_json::json!(AccountResponse::from(account))),
        ),
        Err(e) => {
            let (status, body) = map_account_read_error(&e);
            if status.is_server_error() {
                error!(error = %e, "Failed to get account");
            }
            (status, Json(body))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/accounts/{id}/generations",
    tag = "Accounts",
    params(("id" = String, Path, description = "Account ID"), PaginationParams),
    responses(
        (status = 200, description = "Generation history, newest first", body = [GenerationResponse]),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 500, description = "Failed to list generations", body = ErrorResponse)
    )
)]
async fn list_generations(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let (limit, offset) = clamp_pagination(params.limit, params.offset);

    if let Err(e) = state.account_repo.get_by_id(&id).await {
        let (status, body) = map_account_read_error(&e);
        if status.is_server_error() {
            error!(error = %e, "Failed to load account for history");
        }
        return (status, Json(body));
    }

    match state.account_repo.list_generations(&id, limit, offset).await {
        Ok(records) => {
            let items: Vec<GenerationResponse> = records.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(serde_json::json!(items)))
        }
        Err(e) => {
            error!(error = %e, "Failed to list generations");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to list generations"})),
            )
        }
    }
}
