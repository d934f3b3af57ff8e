use serde::{Deserialize, Serialize};

use crate::core::achievements::Achievement;
use crate::core::inbox::ConversationSummary;
use crate::models::domain::{BloodRequest, BloodType, DonorMatch, Eligibility, Message};
use crate::services::CacheStats;

/// Response for donor search and request matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDonorsResponse {
    pub matches: Vec<DonorMatch>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
    #[serde(rename = "totalResults")]
    pub total_results: usize,
}

/// Compatibility table lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityResponse {
    #[serde(rename = "bloodType")]
    pub blood_type: BloodType,
    #[serde(rename = "canReceiveFrom")]
    pub can_receive_from: Vec<BloodType>,
    #[serde(rename = "canDonateTo")]
    pub can_donate_to: Vec<BloodType>,
}

/// Caller's donation status
#[derive(Debug, Clone, Serialize)]
pub struct EligibilityResponse {
    pub eligibility: Eligibility,
    #[serde(rename = "totalDonations")]
    pub total_donations: u32,
    pub achievements: Vec<&'static Achievement>,
    #[serde(rename = "nextAchievement")]
    pub next_achievement: Option<&'static Achievement>,
}

/// Blood request with derived progress
#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
    #[serde(flatten)]
    pub request: BloodRequest,
    #[serde(rename = "remainingUnits")]
    pub remaining_units: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestsResponse {
    pub requests: Vec<RequestSummary>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationSummary>,
    #[serde(rename = "unreadTotal")]
    pub unread_total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadResponse {
    #[serde(rename = "otherUserId")]
    pub other_user_id: String,
    pub messages: Vec<Message>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub cache: CacheStats,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
