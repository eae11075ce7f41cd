pub mod bearer;
pub mod rate_limit;

pub use bearer::{BearerAuth, bearer_matches};
pub use rate_limit::RateLimitGuard;
