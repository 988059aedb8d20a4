pub mod submission;
pub mod tracking;

pub use submission::{ApplicantFields, NewSubmission, SubmissionRecord, SubmissionStatus};
pub use tracking::TrackingParams;
