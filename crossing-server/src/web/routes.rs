//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::domain::{CrossingId, DomainError, PhoneNumber, Subscription};
use crate::store::StorageError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/crossings", get(list_crossings))
        .route("/subscriptions", post(subscribe))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// List known crossings ordered by id.
async fn list_crossings(
    State(state): State<AppState>,
) -> Result<Json<ListCrossingsResponse>, AppError> {
    let crossings = state.store.list_crossings().await?;

    Ok(Json(ListCrossingsResponse {
        crossings: crossings.into_iter().map(CrossingResult::from).collect(),
    }))
}

/// Subscribe a phone number to a crossing's transitions.
async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), AppError> {
    let phone_number = PhoneNumber::parse(&req.phone_number)?;
    let crossing_id = CrossingId(req.crossing_id);

    if !state.store.crossing_exists(crossing_id).await? {
        warn!(crossing_id = %crossing_id, "crossing not found");
        return Err(AppError::NotFound {
            message: "invalid crossing_id".to_string(),
        });
    }

    let subscription = Subscription {
        crossing_id,
        phone_number,
    };
    state.store.insert_subscription(&subscription).await?;
    info!(crossing_id = %crossing_id, "subscription added");

    Ok((StatusCode::CREATED, Json(subscription.into())))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            // A crossing removed between the existence check and the insert.
            StorageError::NotFound { .. } => AppError::NotFound {
                message: "invalid crossing_id".to_string(),
            },
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => {
                error!(error = %message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
