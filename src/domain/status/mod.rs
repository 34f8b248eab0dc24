pub mod job_status;
pub mod reporter;

pub use job_status::JobStatus;
pub use reporter::{ReporterError, StatusHandle, StatusReporter};
