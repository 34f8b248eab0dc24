pub mod clock;
pub mod model;
pub mod service;

pub use clock::{Clock, SystemClock};
pub use model::{LimitReason, RateDecision, RateLimits, UsageSnapshot};
pub use service::RateLimiter;
