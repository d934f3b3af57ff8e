// Route exports
pub mod donors;
pub mod messages;
pub mod requests;

use actix_web::dev::Payload;
use actix_web::http::{header, StatusCode};
use actix_web::{error, web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use std::future::{ready, Ready};
use std::sync::Arc;
use thiserror::Error;

use crate::config::MatchingSettings;
use crate::core::inbox::InboxError;
use crate::core::DonorMatcher;
use crate::models::{BloodTypeError, DonorProfile, ErrorResponse};
use crate::services::{
    CacheError, CacheKey, CacheManager, DonorQuery, Session, SessionError, SessionVerifier, SupabaseClient,
    SupabaseError,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SupabaseClient>,
    pub cache: Arc<CacheManager>,
    pub matcher: DonorMatcher,
    pub matching: MatchingSettings,
}

/// Errors surfaced by handlers, rendered as `ErrorResponse` JSON
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    InvalidJson(String),

    #[error("{0}")]
    InvalidQuery(String),

    #[error(transparent)]
    BloodType(#[from] BloodTypeError),

    #[error(transparent)]
    Inbox(#[from] InboxError),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] SupabaseError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_failed",
            ApiError::InvalidJson(_) => "invalid_json",
            ApiError::InvalidQuery(_) => "invalid_query",
            ApiError::BloodType(_) => "invalid_blood_type",
            ApiError::Inbox(_) => "invalid_message",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Session(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) | ApiError::Store(SupabaseError::Conflict(_)) => "conflict",
            ApiError::Store(SupabaseError::NotFound(_)) => "not_found",
            ApiError::Store(_) => "store_unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::InvalidJson(_)
            | ApiError::InvalidQuery(_)
            | ApiError::BloodType(_)
            | ApiError::Inbox(_)
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Session(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) | ApiError::Store(SupabaseError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) | ApiError::Store(SupabaseError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Store(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::InvalidJson(format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query payload error on {}: {}", req.path(), err);
    ApiError::InvalidQuery(format!("Invalid query: {}", err)).into()
}

impl FromRequest for Session {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let result = match req.app_data::<web::Data<SessionVerifier>>() {
            Some(verifier) => verifier.verify_header(header).map_err(|e| {
                tracing::debug!("Rejected session on {}: {}", req.path(), e);
                ApiError::from(e)
            }),
            None => Err(ApiError::Internal("session verifier not configured".to_string())),
        };

        ready(result)
    }
}

/// Drop an entry that no longer decodes so the next read refills it
async fn evict_on_error(state: &AppState, key: &str, err: CacheError) {
    match err {
        CacheError::CacheMiss(_) => {}
        CacheError::SerializationError(e) => {
            tracing::warn!("Evicting undecodable cache entry {}: {}", key, e);
            if let Err(e) = state.cache.delete(key).await {
                tracing::warn!("Failed to invalidate cache: {}", e);
            }
        }
        e => tracing::warn!("Cache read failed for {}: {}", key, e),
    }
}

/// Donor directory read, served from cache when possible
pub(crate) async fn load_donors(state: &AppState, query: &DonorQuery) -> Result<Vec<DonorProfile>, ApiError> {
    let key = CacheKey::donors(&query.scope_key());

    match state.cache.get::<Vec<DonorProfile>>(&key).await {
        Ok(donors) => {
            tracing::debug!("Serving {} donors from cache ({})", donors.len(), key);
            return Ok(donors);
        }
        Err(e) => evict_on_error(state, &key, e).await,
    }

    let donors = state.store.list_donors(query).await?;

    if let Err(e) = state.cache.set(&key, &donors).await {
        tracing::warn!("Cache write failed for {}: {}", key, e);
    }

    Ok(donors)
}

/// The caller's own profile
pub(crate) async fn load_profile(state: &AppState, user_id: &str) -> Result<DonorProfile, ApiError> {
    let key = CacheKey::profile(user_id);

    match state.cache.get::<DonorProfile>(&key).await {
        Ok(profile) => return Ok(profile),
        Err(e) => evict_on_error(state, &key, e).await,
    }

    let profile = state.store.get_profile(user_id).await?;

    if let Err(e) = state.cache.set(&key, &profile).await {
        tracing::warn!("Cache write failed for {}: {}", key, e);
    }

    Ok(profile)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(donors::configure)
            .configure(requests::configure)
            .configure(messages::configure),
    );
}
