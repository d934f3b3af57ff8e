//! Bloodlink - donor matching service for district blood donation networks
//!
//! This library provides blood type compatibility, donation eligibility and
//! the donor search pipeline, plus the HTTP surface that serves them from a
//! hosted profile store.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    can_donate, check_eligibility, compatible_donor_types, distance_between, haversine_distance, DonorMatcher,
    SearchResult, ELIGIBILITY_WINDOW_DAYS,
};
pub use crate::models::{
    BloodRequest, BloodType, Coordinates, DonorMatch, DonorProfile, Eligibility, SearchCriteria,
    SearchDonorsRequest, SearchDonorsResponse,
};
