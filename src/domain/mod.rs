pub mod admission;
pub mod auth;
pub mod job;
pub mod preferences;
pub mod rate_limit;
pub mod shared;
pub mod sources;
pub mod status;
pub mod tts;
