pub mod error;
pub mod model;
pub mod processor;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::JobError;
pub use model::{EnvelopeHeader, JobEnvelope, JobPayload};
pub use processor::{JobProcessor, TextSources};
pub use worker::WorkerPool;
