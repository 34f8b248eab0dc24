pub mod dto;
pub mod error;
pub mod service;

pub use dto::{SubmitJobRequest, SubmitJobResponse};
pub use error::AdmissionError;
pub use service::AdmissionService;
