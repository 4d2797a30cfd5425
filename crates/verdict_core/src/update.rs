use verdict_logging::{verdict_debug, verdict_info, verdict_warn};

use crate::view_model::GENERIC_FAILURE;
use crate::{ApiError, JobStatus, TaskEffect, TaskMsg, TaskPhase, TaskState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: TaskState, msg: TaskMsg) -> (TaskState, Vec<TaskEffect>) {
    let effects = match msg {
        TaskMsg::Submit(input) => {
            if !state.can_submit() {
                verdict_warn!("Ignoring submit while {:?}", state.phase());
                return (state, Vec::new());
            }
            let ticket = state.begin_submission();
            verdict_info!("Submitting job ticket={} url={}", ticket, input.url());
            vec![TaskEffect::SubmitJob { ticket, input }]
        }
        TaskMsg::Submitted { ticket, result } => {
            if ticket != state.ticket() || state.phase() != TaskPhase::Submitting {
                verdict_debug!("Discarding stale submit response ticket={}", ticket);
                return (state, Vec::new());
            }
            match result {
                Ok(job_id) => {
                    verdict_info!("Job {} accepted, polling", job_id);
                    state.start_polling(job_id.clone());
                    vec![TaskEffect::SchedulePoll {
                        job_id,
                        interval: state.policy().interval,
                    }]
                }
                Err(err) => {
                    verdict_warn!("Job submission failed: {}", err);
                    state.fail(err.user_message(), None);
                    Vec::new()
                }
            }
        }
        TaskMsg::PollDue { job_id } => {
            if !state.is_active(&job_id) || !state.try_begin_poll() {
                return (state, Vec::new());
            }
            vec![TaskEffect::FetchStatus { job_id }]
        }
        TaskMsg::PollCompleted { job_id, result } => {
            if !state.is_active(&job_id) {
                verdict_debug!("Discarding stale poll for job {}", job_id);
                return (state, Vec::new());
            }
            state.finish_poll();
            match result {
                Ok(mut snapshot) => {
                    snapshot.job_id = job_id.clone();
                    match snapshot.status {
                        JobStatus::Succeeded => {
                            verdict_info!("Job {} succeeded", job_id);
                            state.succeed(snapshot);
                            vec![TaskEffect::CancelPoll]
                        }
                        JobStatus::Failed => {
                            let reason = snapshot
                                .error
                                .clone()
                                .filter(|message| !message.trim().is_empty())
                                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                            verdict_warn!("Job {} failed: {}", job_id, reason);
                            state.fail(reason, Some(snapshot));
                            vec![TaskEffect::CancelPoll]
                        }
                        JobStatus::Pending | JobStatus::Running => {
                            state.record_progress(snapshot);
                            vec![TaskEffect::SchedulePoll {
                                job_id,
                                interval: state.policy().interval,
                            }]
                        }
                    }
                }
                Err(ApiError::Transport(message)) => {
                    if state.record_transient_failure() {
                        let reason = format!(
                            "lost contact with job after {} consecutive poll failures",
                            state.consecutive_failures()
                        );
                        verdict_warn!("Job {}: {} ({})", job_id, reason, message);
                        state.fail(reason, None);
                        vec![TaskEffect::CancelPoll]
                    } else {
                        verdict_debug!(
                            "Transient poll failure {} for job {}: {}",
                            state.consecutive_failures(),
                            job_id,
                            message
                        );
                        vec![TaskEffect::SchedulePoll {
                            job_id,
                            interval: state.policy().interval,
                        }]
                    }
                }
                Err(err) => {
                    verdict_warn!("Polling job {} failed: {}", job_id, err);
                    state.fail(err.user_message(), None);
                    vec![TaskEffect::CancelPoll]
                }
            }
        }
        TaskMsg::Reset => {
            verdict_info!("Resetting task from {:?}", state.phase());
            state.reset();
            vec![TaskEffect::CancelPoll]
        }
    };

    (state, effects)
}
