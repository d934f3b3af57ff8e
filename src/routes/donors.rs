use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use super::{load_donors, load_profile, ApiError, AppState};
use crate::core::achievements::{earned_achievements, next_achievement};
use crate::core::{compatible_donor_types, recipients_of};
use crate::models::{
    Availability, BloodType, CompatibilityResponse, EligibilityResponse, HealthResponse, MatchMode,
    SearchCriteria, SearchDonorsRequest, SearchDonorsResponse,
};
use crate::services::{DonorQuery, Session, SupabaseError};

/// Configure donor routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/donors/search", web::post().to(search_donors))
        .route("/donors/compatible/{blood_type}", web::get().to(compatibility))
        .route("/donors/me/eligibility", web::get().to(my_eligibility));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        cache: state.cache.stats(),
    })
}

/// Store-side pre-filter for a search
fn donor_query(req: &SearchDonorsRequest) -> DonorQuery {
    let blood_types = match (req.blood_type, req.match_mode) {
        (Some(patient), MatchMode::Compatible) => compatible_donor_types(patient).to_vec(),
        (Some(patient), MatchMode::Exact) => vec![patient],
        (None, _) => Vec::new(),
    };

    DonorQuery {
        blood_types,
        active_only: req.availability == Availability::Available,
        district_id: req.district_id.clone(),
    }
}

/// Search donors
///
/// POST /api/v1/donors/search
///
/// Request body:
/// ```json
/// {
///   "bloodType": "AB-",
///   "matchMode": "compatible",
///   "location": "Bangalore",
///   "maxDistanceKm": 25,
///   "availability": "eligible",
///   "sortBy": "distance"
/// }
/// ```
///
/// Distances are measured from the caller's profile location.
async fn search_donors(
    state: web::Data<AppState>,
    session: Session,
    req: web::Json<SearchDonorsRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let origin = match load_profile(&state, &session.user_id).await {
        Ok(profile) => profile.coordinates,
        Err(ApiError::Store(SupabaseError::NotFound(_))) => None,
        Err(e) => return Err(e),
    };

    tracing::info!(
        "Donor search by {}: blood_type={:?}, mode={:?}, availability={:?}, max_distance_km={:?}",
        session.user_id,
        req.blood_type,
        req.match_mode,
        req.availability,
        req.max_distance_km
    );

    let donors = load_donors(&state, &donor_query(&req)).await?;

    let req = req.into_inner();
    let criteria = SearchCriteria {
        patient_blood_type: req.blood_type,
        match_mode: req.match_mode,
        location: req.location,
        origin,
        max_distance_km: req.max_distance_km,
        availability: req.availability,
        sort_by: req.sort_by,
        exclude_donor_ids: vec![session.user_id],
    };

    let result = state.matcher.search(donors, &criteria, Utc::now());

    Ok(HttpResponse::Ok().json(SearchDonorsResponse {
        total_results: result.matches.len(),
        total_candidates: result.total_candidates,
        matches: result.matches,
    }))
}

/// Compatibility table lookup
///
/// GET /api/v1/donors/compatible/{blood_type}
async fn compatibility(path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    let blood_type: BloodType = path.parse()?;

    Ok(HttpResponse::Ok().json(CompatibilityResponse {
        blood_type,
        can_receive_from: compatible_donor_types(blood_type).to_vec(),
        can_donate_to: recipients_of(blood_type),
    }))
}

/// Caller's donation interval status and milestones
///
/// GET /api/v1/donors/me/eligibility
async fn my_eligibility(state: web::Data<AppState>, session: Session) -> Result<HttpResponse, ApiError> {
    let profile = load_profile(&state, &session.user_id).await?;
    let eligibility = state.matcher.eligibility(&profile, Utc::now());

    Ok(HttpResponse::Ok().json(EligibilityResponse {
        eligibility,
        total_donations: profile.total_donations,
        achievements: earned_achievements(profile.total_donations),
        next_achievement: next_achievement(profile.total_donations),
    }))
}
