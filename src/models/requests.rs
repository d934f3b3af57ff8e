use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{
    Availability, BloodType, Coordinates, MatchMode, RequestStatus, RequestTab, SortKey, UrgencyLevel,
};

/// Request to search the donor directory
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchDonorsRequest {
    #[serde(alias = "blood_type", rename = "bloodType", default)]
    pub blood_type: Option<BloodType>,
    #[serde(alias = "match_mode", rename = "matchMode", default)]
    pub match_mode: MatchMode,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub location: Option<String>,
    #[validate(range(min = 0.0, max = 20000.0))]
    #[serde(alias = "max_distance_km", rename = "maxDistanceKm", default)]
    pub max_distance_km: Option<f64>,
    #[serde(default)]
    pub availability: Availability,
    #[serde(alias = "sort_by", rename = "sortBy", default)]
    pub sort_by: SortKey,
    #[serde(alias = "district_id", rename = "districtId", default)]
    pub district_id: Option<String>,
}

/// Request to open a new blood request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBloodRequest {
    #[validate(length(min = 1, max = 120))]
    #[serde(alias = "patient_name", rename = "patientName")]
    pub patient_name: String,
    #[validate(range(max = 130))]
    #[serde(alias = "patient_age", rename = "patientAge", default)]
    pub patient_age: Option<u16>,
    #[serde(alias = "patient_blood_type", rename = "patientBloodType")]
    pub patient_blood_type: BloodType,
    #[validate(length(max = 500))]
    #[serde(alias = "medical_condition", rename = "medicalCondition", default)]
    pub medical_condition: Option<String>,
    #[serde(alias = "urgency_level", rename = "urgencyLevel")]
    pub urgency_level: UrgencyLevel,
    #[validate(range(min = 1, max = 50))]
    #[serde(alias = "units_required", rename = "unitsRequired")]
    pub units_required: u32,
    #[validate(length(min = 1, max = 200))]
    #[serde(alias = "hospital_name", rename = "hospitalName")]
    pub hospital_name: String,
    #[serde(alias = "hospital_address", rename = "hospitalAddress", default)]
    pub hospital_address: Option<String>,
    #[serde(alias = "hospital_contact", rename = "hospitalContact", default)]
    pub hospital_contact: Option<String>,
    #[serde(alias = "required_by_date", rename = "requiredByDate", default)]
    pub required_by_date: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    #[serde(alias = "special_requirements", rename = "specialRequirements", default)]
    pub special_requirements: Option<String>,
    #[serde(alias = "contact_person", rename = "contactPerson", default)]
    pub contact_person: Option<String>,
    #[serde(alias = "contact_number", rename = "contactNumber", default)]
    pub contact_number: Option<String>,
    #[serde(alias = "district_id", rename = "districtId", default)]
    pub district_id: Option<String>,
    #[validate(nested)]
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequestStatus {
    pub status: RequestStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MyRequestsQuery {
    #[serde(default)]
    pub tab: RequestTab,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchDonorsQuery {
    #[serde(alias = "max_distance_km", rename = "maxDistanceKm", default)]
    pub max_distance_km: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationsQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Request to send an inbox message
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "receiver_id", rename = "receiverId")]
    pub receiver_id: String,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[serde(alias = "request_id", rename = "requestId", default)]
    pub request_id: Option<String>,
}
