// Core algorithm exports
pub mod achievements;
pub mod compatibility;
pub mod distance;
pub mod eligibility;
pub mod filters;
pub mod inbox;
pub mod matcher;
pub mod requests;

pub use compatibility::{can_donate, compatible_donor_types, compatible_donor_types_for, recipients_of};
pub use distance::{distance_between, haversine_distance};
pub use eligibility::{check_eligibility, days_since, ELIGIBILITY_WINDOW_DAYS};
pub use filters::{matches_availability, matches_blood_type, matches_location, within_distance};
pub use matcher::{DonorMatcher, SearchResult};
