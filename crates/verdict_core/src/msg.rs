use crate::{ApiError, JobId, JobInput, JobSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskMsg {
    /// Caller asked to start analysing a thread.
    Submit(JobInput),
    /// The submit call issued under `ticket` returned.
    Submitted {
        ticket: u64,
        result: Result<JobId, ApiError>,
    },
    /// The poll timer for a job fired.
    PollDue { job_id: JobId },
    /// A status fetch issued for `job_id` returned.
    PollCompleted {
        job_id: JobId,
        result: Result<JobSnapshot, ApiError>,
    },
    /// Caller dropped the current job.
    Reset,
}
