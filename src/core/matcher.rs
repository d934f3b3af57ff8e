use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::core::{
    distance::distance_between,
    eligibility::{check_eligibility, ELIGIBILITY_WINDOW_DAYS},
    filters::{matches_availability, matches_blood_type, matches_location, within_distance},
};
use crate::models::{
    Availability, BloodRequest, DonorMatch, DonorProfile, Eligibility, MatchMode, SearchCriteria, SortKey,
};

/// Result of a donor search
#[derive(Debug)]
pub struct SearchResult {
    pub matches: Vec<DonorMatch>,
    pub total_candidates: usize,
}

/// Donor search orchestrator
///
/// # Pipeline Stages
/// 1. Exclusions (the searching user)
/// 2. Blood type compatibility
/// 3. Location text match
/// 4. Availability / eligibility
/// 5. Distance bound
/// 6. Stable sort by the requested key
///
/// Holds no mutable state; a single instance is shared across workers.
#[derive(Debug, Clone, Copy)]
pub struct DonorMatcher {
    eligibility_window_days: i64,
}

impl DonorMatcher {
    pub fn new(eligibility_window_days: i64) -> Self {
        Self { eligibility_window_days }
    }

    pub fn with_default_window() -> Self {
        Self::new(ELIGIBILITY_WINDOW_DAYS)
    }

    pub fn eligibility_window_days(&self) -> i64 {
        self.eligibility_window_days
    }

    /// Eligibility of one donor at `now`
    pub fn eligibility(&self, profile: &DonorProfile, now: DateTime<Utc>) -> Eligibility {
        check_eligibility(profile.last_donation_date, now, self.eligibility_window_days)
    }

    /// Filter and order `donors` against `criteria`
    ///
    /// The distance bound only applies when both an origin and a maximum are
    /// given; donors without coordinates then drop out.
    pub fn search(
        &self,
        donors: Vec<DonorProfile>,
        criteria: &SearchCriteria,
        now: DateTime<Utc>,
    ) -> SearchResult {
        let total_candidates = donors.len();
        let distance_bound = criteria.origin.and(criteria.max_distance_km);

        let mut matches: Vec<DonorMatch> = donors
            .into_iter()
            // Stage 1: exclusions
            .filter(|donor| !criteria.exclude_donor_ids.contains(&donor.id))
            // Stage 2: compatibility
            .filter(|donor| matches_blood_type(donor, criteria.patient_blood_type, criteria.match_mode))
            // Stage 3: location text
            .filter(|donor| matches_location(donor, criteria.location.as_deref()))
            // Stages 4 & 5: availability and distance
            .filter_map(|donor| {
                let eligibility = self.eligibility(&donor, now);
                if !matches_availability(&donor, criteria.availability, &eligibility) {
                    return None;
                }

                let distance_km = distance_between(criteria.origin.as_ref(), donor.coordinates.as_ref());
                if !within_distance(distance_km, distance_bound) {
                    return None;
                }

                Some(DonorMatch {
                    donor,
                    distance_km: distance_km.is_finite().then_some(distance_km),
                    eligibility,
                })
            })
            .collect();

        // Stage 6
        sort_matches(&mut matches, criteria.sort_by);

        tracing::debug!(
            "Donor search kept {} of {} candidates (sort: {})",
            matches.len(),
            total_candidates,
            criteria.sort_by.as_str()
        );

        SearchResult {
            matches,
            total_candidates,
        }
    }

    /// Donors who can serve a stored blood request right now
    ///
    /// Compatible, active and past the donation interval, within
    /// `max_distance_km` of the request's hospital, nearest first.
    /// The requester is never offered as their own donor.
    pub fn match_request(
        &self,
        request: &BloodRequest,
        donors: Vec<DonorProfile>,
        max_distance_km: Option<f64>,
        now: DateTime<Utc>,
    ) -> SearchResult {
        let criteria = SearchCriteria {
            patient_blood_type: Some(request.patient_blood_type),
            match_mode: MatchMode::Compatible,
            location: None,
            origin: request.coordinates,
            max_distance_km,
            availability: Availability::Eligible,
            sort_by: SortKey::Distance,
            exclude_donor_ids: vec![request.requester_id.clone()],
        };

        let mut result = self.search(donors, &criteria, now);
        result.matches.retain(|m| m.donor.is_active);
        result
    }
}

impl Default for DonorMatcher {
    fn default() -> Self {
        Self::with_default_window()
    }
}

/// Stable sort; unknown keys keep input order
pub fn sort_matches(matches: &mut [DonorMatch], sort_by: SortKey) {
    match sort_by {
        SortKey::Distance => matches.sort_by(|a, b| compare_distance(a.distance_km, b.distance_km)),
        SortKey::Donations => {
            matches.sort_by(|a, b| b.donor.total_donations.cmp(&a.donor.total_donations))
        }
        SortKey::Rating | SortKey::ResponseTime | SortKey::Unspecified => {}
    }
}

/// Ascending, with unknown distances last
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
