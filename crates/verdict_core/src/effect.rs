use std::time::Duration;

use crate::{JobId, JobInput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEffect {
    SubmitJob { ticket: u64, input: JobInput },
    FetchStatus { job_id: JobId },
    /// Fire `PollDue` one `interval` after the previous poll started
    /// (or after now, when no poll has run yet).
    SchedulePoll { job_id: JobId, interval: Duration },
    CancelPoll,
}
