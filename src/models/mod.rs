// Model exports
pub mod dates;
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Availability, BloodRequest, BloodType, BloodTypeError, Coordinates, DonorMatch, DonorProfile,
    Eligibility, MatchMode, Message, NewBloodRequest, NewMessage, RequestStatus, RequestTab,
    SearchCriteria, SortKey, UrgencyLevel, UserType, VerificationStatus,
};
pub use requests::{
    ConversationsQuery, CreateBloodRequest, MatchDonorsQuery, MyRequestsQuery, SearchDonorsRequest,
    SendMessageRequest, UpdateRequestStatus,
};
pub use responses::{
    CompatibilityResponse, ConversationsResponse, EligibilityResponse, ErrorResponse, HealthResponse,
    RequestSummary, RequestsResponse, SearchDonorsResponse, ThreadResponse,
};
