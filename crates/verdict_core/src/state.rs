use std::time::Duration;

use crate::view_model::TaskView;
use crate::{JobId, JobSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Succeeded,
    Failed,
}

impl TaskPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskPhase::Succeeded | TaskPhase::Failed)
    }
}

/// How often a live job is polled and how many lost polls in a row are tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_consecutive_failures: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_consecutive_failures: 5,
        }
    }
}

impl PollPolicy {
    /// At least one transient failure is always absorbed.
    pub(crate) fn failure_ceiling(&self) -> u32 {
        self.max_consecutive_failures.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskState {
    phase: TaskPhase,
    policy: PollPolicy,
    ticket: u64,
    job_id: Option<JobId>,
    snapshot: Option<JobSnapshot>,
    error: Option<String>,
    polls_issued: u32,
    consecutive_failures: u32,
    poll_in_flight: bool,
    dirty: bool,
}

impl TaskState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: PollPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    /// Submission counter; a submit response is only applied for the current ticket.
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn can_submit(&self) -> bool {
        self.phase == TaskPhase::Idle || self.phase.is_terminal()
    }

    pub fn view(&self) -> TaskView {
        TaskView {
            phase: self.phase,
            job_id: self.job_id.clone(),
            snapshot: self.snapshot.clone(),
            is_polling: self.phase == TaskPhase::Polling,
            error: self.error.clone(),
            polls_issued: self.polls_issued,
            consecutive_failures: self.consecutive_failures,
        }
    }

    /// Returns whether anything observable changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn is_active(&self, job_id: &JobId) -> bool {
        self.phase == TaskPhase::Polling && self.job_id.as_ref() == Some(job_id)
    }

    pub(crate) fn begin_submission(&mut self) -> u64 {
        self.clear();
        self.phase = TaskPhase::Submitting;
        self.ticket
    }

    pub(crate) fn start_polling(&mut self, job_id: JobId) {
        self.snapshot = Some(JobSnapshot::pending(job_id.clone()));
        self.job_id = Some(job_id);
        self.phase = TaskPhase::Polling;
        self.dirty = true;
    }

    pub(crate) fn try_begin_poll(&mut self) -> bool {
        if self.poll_in_flight {
            return false;
        }
        self.poll_in_flight = true;
        self.polls_issued += 1;
        self.dirty = true;
        true
    }

    pub(crate) fn finish_poll(&mut self) {
        self.poll_in_flight = false;
    }

    pub(crate) fn record_progress(&mut self, mut snapshot: JobSnapshot) {
        let previous = self.snapshot.as_ref().and_then(|s| s.progress);
        snapshot.progress = crate::Progress::merge(previous, snapshot.progress);
        self.snapshot = Some(snapshot);
        self.consecutive_failures = 0;
        self.dirty = true;
    }

    /// Counts a lost poll; returns `true` once the ceiling is reached.
    pub(crate) fn record_transient_failure(&mut self) -> bool {
        self.consecutive_failures += 1;
        self.dirty = true;
        self.consecutive_failures >= self.policy.failure_ceiling()
    }

    pub(crate) fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub(crate) fn succeed(&mut self, snapshot: JobSnapshot) {
        self.snapshot = Some(snapshot);
        self.consecutive_failures = 0;
        self.phase = TaskPhase::Succeeded;
        self.dirty = true;
    }

    pub(crate) fn fail(&mut self, reason: String, snapshot: Option<JobSnapshot>) {
        if snapshot.is_some() {
            self.snapshot = snapshot;
        }
        self.error = Some(reason);
        self.phase = TaskPhase::Failed;
        self.dirty = true;
    }

    pub(crate) fn reset(&mut self) {
        self.clear();
        self.phase = TaskPhase::Idle;
    }

    fn clear(&mut self) {
        self.ticket = self.ticket.wrapping_add(1);
        self.job_id = None;
        self.snapshot = None;
        self.error = None;
        self.polls_issued = 0;
        self.consecutive_failures = 0;
        self.poll_in_flight = false;
        self.dirty = true;
    }
}
