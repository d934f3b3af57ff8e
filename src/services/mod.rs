// Service exports
pub mod cache;
pub mod session;
pub mod supabase;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use session::{Claims, Session, SessionError, SessionVerifier};
pub use supabase::{DonorQuery, RequestQuery, SupabaseClient, SupabaseError, SupabaseTables};
