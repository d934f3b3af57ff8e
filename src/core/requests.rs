use crate::core::compatibility::can_donate;
use crate::models::{BloodRequest, BloodType, RequestStatus, RequestTab, UrgencyLevel};

/// Active requests a donor of `donor_type` could give to
pub fn requests_for_donor(requests: Vec<BloodRequest>, donor_type: BloodType) -> Vec<BloodRequest> {
    requests
        .into_iter()
        .filter(|r| r.status == RequestStatus::Active)
        .filter(|r| can_donate(donor_type, r.patient_blood_type))
        .collect()
}

#[inline]
pub fn in_tab(status: RequestStatus, tab: RequestTab) -> bool {
    match tab {
        RequestTab::Active => status.is_open(),
        RequestTab::Completed => matches!(status, RequestStatus::Fulfilled | RequestStatus::Received),
        RequestTab::All => true,
    }
}

pub fn filter_by_tab(requests: Vec<BloodRequest>, tab: RequestTab) -> Vec<BloodRequest> {
    requests.into_iter().filter(|r| in_tab(r.status, tab)).collect()
}

/// First `limit` open critical requests, in input order
pub fn urgent_requests(requests: Vec<BloodRequest>, limit: usize) -> Vec<BloodRequest> {
    requests
        .into_iter()
        .filter(|r| r.urgency_level == UrgencyLevel::Critical && r.status.is_open())
        .take(limit)
        .collect()
}

#[inline]
pub fn remaining_units(request: &BloodRequest) -> u32 {
    request.units_required.saturating_sub(request.units_fulfilled)
}
