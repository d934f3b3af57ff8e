use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

use super::dates::{deserialize_optional_datetime, deserialize_datetime};

/// Rejected blood type string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown blood type '{0}', expected one of A+, A-, B+, B-, AB+, AB-, O+, O-")]
pub struct BloodTypeError(pub String);

/// The eight ABO/Rh blood types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodType {
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
        BloodType::OPositive,
        BloodType::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = BloodTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        BloodType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| BloodTypeError(s.to_string()))
    }
}

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Coordinates {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Rotaractor,
    Rotary,
    Public,
    Medical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

/// Donor profile as stored in the `profiles` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorProfile {
    pub id: String,
    #[serde(alias = "full_name", rename = "fullName", default)]
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(alias = "blood_type", rename = "bloodType", default)]
    pub blood_type: Option<BloodType>,
    #[serde(alias = "district_id", rename = "districtId", default)]
    pub district_id: Option<String>,
    #[serde(alias = "club_name", rename = "clubName", default)]
    pub club_name: Option<String>,
    #[serde(alias = "user_type", rename = "userType", default)]
    pub user_type: Option<UserType>,
    #[serde(alias = "verification_status", rename = "verificationStatus", default)]
    pub verification_status: VerificationStatus,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(
        alias = "last_donation_date",
        rename = "lastDonationDate",
        default,
        deserialize_with = "deserialize_optional_datetime"
    )]
    pub last_donation_date: Option<DateTime<Utc>>,
    #[serde(alias = "total_donations", rename = "totalDonations", default)]
    pub total_donations: u32,
    #[serde(alias = "is_active", rename = "isActive", default = "default_true")]
    pub is_active: bool,
    #[serde(
        alias = "created_at",
        rename = "createdAt",
        default,
        deserialize_with = "deserialize_optional_datetime"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Critical,
    Urgent,
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Active,
    Partial,
    Fulfilled,
    Received,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Active => "active",
            RequestStatus::Partial => "partial",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Received => "received",
        }
    }

    /// Still waiting for units
    pub fn is_open(&self) -> bool {
        matches!(self, RequestStatus::Active | RequestStatus::Partial)
    }

    /// Statuses only move forward: active -> partial -> fulfilled -> received
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        self.rank() < next.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            RequestStatus::Active => 0,
            RequestStatus::Partial => 1,
            RequestStatus::Fulfilled => 2,
            RequestStatus::Received => 3,
        }
    }
}

/// Blood request as stored in the `blood_requests` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodRequest {
    pub id: String,
    #[serde(alias = "requester_id", rename = "requesterId")]
    pub requester_id: String,
    #[serde(alias = "patient_name", rename = "patientName")]
    pub patient_name: String,
    #[serde(alias = "patient_age", rename = "patientAge", default)]
    pub patient_age: Option<u16>,
    #[serde(alias = "patient_blood_type", rename = "patientBloodType")]
    pub patient_blood_type: BloodType,
    #[serde(alias = "medical_condition", rename = "medicalCondition", default)]
    pub medical_condition: Option<String>,
    #[serde(alias = "urgency_level", rename = "urgencyLevel")]
    pub urgency_level: UrgencyLevel,
    #[serde(alias = "units_required", rename = "unitsRequired")]
    pub units_required: u32,
    #[serde(alias = "units_fulfilled", rename = "unitsFulfilled", default)]
    pub units_fulfilled: u32,
    #[serde(alias = "hospital_name", rename = "hospitalName")]
    pub hospital_name: String,
    #[serde(alias = "hospital_address", rename = "hospitalAddress", default)]
    pub hospital_address: Option<String>,
    #[serde(alias = "hospital_contact", rename = "hospitalContact", default)]
    pub hospital_contact: Option<String>,
    #[serde(
        alias = "required_by_date",
        rename = "requiredByDate",
        default,
        deserialize_with = "deserialize_optional_datetime"
    )]
    pub required_by_date: Option<DateTime<Utc>>,
    #[serde(alias = "special_requirements", rename = "specialRequirements", default)]
    pub special_requirements: Option<String>,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(alias = "contact_person", rename = "contactPerson", default)]
    pub contact_person: Option<String>,
    #[serde(alias = "contact_number", rename = "contactNumber", default)]
    pub contact_number: Option<String>,
    #[serde(alias = "district_id", rename = "districtId", default)]
    pub district_id: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(
        alias = "created_at",
        rename = "createdAt",
        default,
        deserialize_with = "deserialize_optional_datetime"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        alias = "updated_at",
        rename = "updatedAt",
        default,
        deserialize_with = "deserialize_optional_datetime"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row inserted into `blood_requests`
#[derive(Debug, Clone, Serialize)]
pub struct NewBloodRequest {
    pub requester_id: String,
    pub patient_name: String,
    pub patient_age: Option<u16>,
    pub patient_blood_type: BloodType,
    pub medical_condition: Option<String>,
    pub urgency_level: UrgencyLevel,
    pub units_required: u32,
    pub units_fulfilled: u32,
    pub hospital_name: String,
    pub hospital_address: Option<String>,
    pub hospital_contact: Option<String>,
    pub required_by_date: Option<DateTime<Utc>>,
    pub special_requirements: Option<String>,
    pub status: RequestStatus,
    pub contact_person: Option<String>,
    pub contact_number: Option<String>,
    pub district_id: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// Inbox message as stored in the `messages` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(alias = "sender_id", rename = "senderId")]
    pub sender_id: String,
    #[serde(alias = "receiver_id", rename = "receiverId")]
    pub receiver_id: String,
    #[serde(alias = "request_id", rename = "requestId", default)]
    pub request_id: Option<String>,
    pub content: String,
    #[serde(deserialize_with = "deserialize_datetime")]
    pub timestamp: DateTime<Utc>,
    #[serde(alias = "is_read", rename = "isRead", default)]
    pub is_read: bool,
}

/// Row inserted into `messages`
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub request_id: Option<String>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

/// Outcome of the donation-interval check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub eligible: bool,
    #[serde(rename = "daysRemaining")]
    pub days_remaining: i64,
    #[serde(rename = "daysSinceLastDonation")]
    pub days_since_last_donation: Option<i64>,
}

/// Donor that passed a search, with derived fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorMatch {
    pub donor: DonorProfile,
    #[serde(rename = "distanceKm")]
    pub distance_km: Option<f64>,
    pub eligibility: Eligibility,
}

/// How the target blood type restricts donors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Any donor type the patient can receive
    #[default]
    Compatible,
    /// Donor type equals the requested type
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    All,
    #[default]
    Available,
    Eligible,
}

/// Result ordering. Keys without a defined order keep input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortKey {
    #[default]
    Distance,
    Donations,
    Rating,
    ResponseTime,
    Unspecified,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Distance => "distance",
            SortKey::Donations => "donations",
            SortKey::Rating => "rating",
            SortKey::ResponseTime => "responseTime",
            SortKey::Unspecified => "unspecified",
        }
    }
}

impl From<String> for SortKey {
    fn from(value: String) -> Self {
        match value.as_str() {
            "distance" => SortKey::Distance,
            "donations" => SortKey::Donations,
            "rating" => SortKey::Rating,
            "responseTime" => SortKey::ResponseTime,
            _ => SortKey::Unspecified,
        }
    }
}

impl From<SortKey> for String {
    fn from(value: SortKey) -> Self {
        value.as_str().to_string()
    }
}

/// Search parameters after boundary validation
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub patient_blood_type: Option<BloodType>,
    pub match_mode: MatchMode,
    pub location: Option<String>,
    pub origin: Option<Coordinates>,
    pub max_distance_km: Option<f64>,
    pub availability: Availability,
    pub sort_by: SortKey,
    pub exclude_donor_ids: Vec<String>,
}

/// Requester tabs over their own requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestTab {
    #[default]
    Active,
    Completed,
    All,
}
