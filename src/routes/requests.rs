use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use super::{load_donors, load_profile, ApiError, AppState};
use crate::core::compatible_donor_types;
use crate::core::requests::{filter_by_tab, remaining_units, requests_for_donor, urgent_requests};
use crate::models::{
    BloodRequest, CreateBloodRequest, MatchDonorsQuery, MyRequestsQuery, NewBloodRequest, RequestStatus,
    RequestSummary, RequestsResponse, SearchDonorsResponse, UpdateRequestStatus,
};
use crate::services::{DonorQuery, RequestQuery, Session};

/// Configure blood request routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/requests", web::post().to(create_request))
        .route("/requests/mine", web::get().to(my_requests))
        .route("/requests/urgent", web::get().to(urgent))
        .route("/requests/for-me", web::get().to(requests_for_me))
        .route("/requests/{id}/donors", web::get().to(request_donors))
        .route("/requests/{id}/status", web::patch().to(update_status));
}

fn summarize(requests: Vec<BloodRequest>) -> RequestsResponse {
    let requests: Vec<RequestSummary> = requests
        .into_iter()
        .map(|request| RequestSummary {
            remaining_units: remaining_units(&request),
            request,
        })
        .collect();

    RequestsResponse {
        total: requests.len(),
        requests,
    }
}

fn new_request(requester_id: String, body: CreateBloodRequest) -> NewBloodRequest {
    NewBloodRequest {
        requester_id,
        patient_name: body.patient_name.trim().to_string(),
        patient_age: body.patient_age,
        patient_blood_type: body.patient_blood_type,
        medical_condition: body.medical_condition,
        urgency_level: body.urgency_level,
        units_required: body.units_required,
        units_fulfilled: 0,
        hospital_name: body.hospital_name.trim().to_string(),
        hospital_address: body.hospital_address,
        hospital_contact: body.hospital_contact,
        required_by_date: body.required_by_date,
        special_requirements: body.special_requirements,
        status: RequestStatus::Active,
        contact_person: body.contact_person,
        contact_number: body.contact_number,
        district_id: body.district_id,
        coordinates: body.coordinates,
    }
}

/// Open a blood request
///
/// POST /api/v1/requests
async fn create_request(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<CreateBloodRequest>,
) -> Result<HttpResponse, ApiError> {
    body.validate()?;

    let row = new_request(session.user_id, body.into_inner());
    let created = state.store.create_request(&row).await?;

    tracing::info!(
        "Blood request {} opened: {} {} unit(s), {:?}",
        created.id,
        created.patient_blood_type,
        created.units_required,
        created.urgency_level
    );

    Ok(HttpResponse::Created().json(RequestSummary {
        remaining_units: remaining_units(&created),
        request: created,
    }))
}

/// Caller's own requests, split into tabs
///
/// GET /api/v1/requests/mine?tab=active|completed|all
async fn my_requests(
    state: web::Data<AppState>,
    session: Session,
    query: web::Query<MyRequestsQuery>,
) -> Result<HttpResponse, ApiError> {
    let requests = state
        .store
        .list_requests(&RequestQuery {
            requester_id: Some(session.user_id),
            ..Default::default()
        })
        .await?;

    Ok(HttpResponse::Ok().json(summarize(filter_by_tab(requests, query.tab))))
}

/// Newest critical requests still waiting for units
///
/// GET /api/v1/requests/urgent
async fn urgent(state: web::Data<AppState>, _session: Session) -> Result<HttpResponse, ApiError> {
    let requests = state
        .store
        .list_requests(&RequestQuery {
            statuses: vec![RequestStatus::Active, RequestStatus::Partial],
            ..Default::default()
        })
        .await?;

    Ok(HttpResponse::Ok().json(summarize(urgent_requests(requests, state.matching.urgent_feed_size))))
}

/// Active requests the caller's blood can serve
///
/// GET /api/v1/requests/for-me
async fn requests_for_me(state: web::Data<AppState>, session: Session) -> Result<HttpResponse, ApiError> {
    let profile = load_profile(&state, &session.user_id).await?;
    let donor_type = profile
        .blood_type
        .ok_or_else(|| ApiError::BadRequest("Your profile has no blood type set".to_string()))?;

    let requests = state
        .store
        .list_requests(&RequestQuery {
            statuses: vec![RequestStatus::Active],
            ..Default::default()
        })
        .await?;

    let mut matching = requests_for_donor(requests, donor_type);
    matching.retain(|r| r.requester_id != session.user_id);

    Ok(HttpResponse::Ok().json(summarize(matching)))
}

/// Donors who can serve a request now
///
/// GET /api/v1/requests/{id}/donors?maxDistanceKm=50
async fn request_donors(
    state: web::Data<AppState>,
    _session: Session,
    path: web::Path<String>,
    query: web::Query<MatchDonorsQuery>,
) -> Result<HttpResponse, ApiError> {
    let max_distance_km = query
        .max_distance_km
        .unwrap_or(state.matching.default_max_distance_km);
    if max_distance_km.is_nan() || max_distance_km < 0.0 {
        return Err(ApiError::BadRequest("maxDistanceKm must be a non-negative number".to_string()));
    }

    let request = state.store.get_request(&path).await?;

    let donors = load_donors(
        &state,
        &DonorQuery {
            blood_types: compatible_donor_types(request.patient_blood_type).to_vec(),
            active_only: true,
            district_id: None,
        },
    )
    .await?;

    let result = state
        .matcher
        .match_request(&request, donors, Some(max_distance_km), Utc::now());

    tracing::info!(
        "Matched {} of {} donors to request {} within {} km",
        result.matches.len(),
        result.total_candidates,
        request.id,
        max_distance_km
    );

    Ok(HttpResponse::Ok().json(SearchDonorsResponse {
        total_results: result.matches.len(),
        total_candidates: result.total_candidates,
        matches: result.matches,
    }))
}

/// Move a request forward
///
/// PATCH /api/v1/requests/{id}/status
async fn update_status(
    state: web::Data<AppState>,
    session: Session,
    path: web::Path<String>,
    body: web::Json<UpdateRequestStatus>,
) -> Result<HttpResponse, ApiError> {
    let request = state.store.get_request(&path).await?;

    if request.requester_id != session.user_id {
        return Err(ApiError::Forbidden("Only the requester can update this request".to_string()));
    }

    if !request.status.can_transition_to(body.status) {
        return Err(ApiError::Conflict(format!(
            "Cannot move request from {} to {}",
            request.status.as_str(),
            body.status.as_str()
        )));
    }

    let updated = state
        .store
        .update_request_status(&request.id, &session.user_id, request.status, body.status)
        .await?;

    tracing::info!("Request {} moved to {}", updated.id, updated.status.as_str());

    Ok(HttpResponse::Ok().json(RequestSummary {
        remaining_units: remaining_units(&updated),
        request: updated,
    }))
}
