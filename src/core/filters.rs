use crate::core::compatibility::can_donate;
use crate::models::{Availability, BloodType, DonorProfile, Eligibility, MatchMode};

/// Check a donor's blood type against the requested patient type
///
/// With no target type every donor passes. Donors without a recorded
/// blood type never match a typed search.
#[inline]
pub fn matches_blood_type(
    profile: &DonorProfile,
    target: Option<BloodType>,
    mode: MatchMode,
) -> bool {
    let Some(target) = target else {
        return true;
    };

    match (profile.blood_type, mode) {
        (None, _) => false,
        (Some(donor), MatchMode::Compatible) => can_donate(donor, target),
        (Some(donor), MatchMode::Exact) => donor == target,
    }
}

/// Case-insensitive substring match over city, state and address
#[inline]
pub fn matches_location(profile: &DonorProfile, term: Option<&str>) -> bool {
    let term = match term.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_lowercase(),
        _ => return true,
    };

    [&profile.city, &profile.state, &profile.address]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
}

/// Apply the availability filter
///
/// `Available` means the donor's active flag is set; `Eligible` means the
/// donation interval has elapsed.
#[inline]
pub fn matches_availability(
    profile: &DonorProfile,
    availability: Availability,
    eligibility: &Eligibility,
) -> bool {
    match availability {
        Availability::All => true,
        Availability::Available => profile.is_active,
        Availability::Eligible => eligibility.eligible,
    }
}

/// Inclusive distance bound; a missing bound accepts everything
#[inline]
pub fn within_distance(distance_km: f64, max_distance_km: Option<f64>) -> bool {
    match max_distance_km {
        Some(max) => distance_km <= max,
        None => true,
    }
}
