use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use verdict_core::{
    update, JobId, JobInput, PollPolicy, TaskEffect, TaskMsg, TaskPhase, TaskState, TaskView,
};
use verdict_logging::verdict_trace;

use crate::api::AnalysisApi;
use crate::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("cannot submit while a job is {0:?}")]
    Busy(TaskPhase),
}

/// Submits analysis jobs and polls them to completion.
///
/// Owns the only poll timer. Polls start one interval after the previous
/// poll *started*, so a slow status call does not stretch the cadence.
/// Methods that start work spawn onto the current Tokio runtime.
pub struct TaskController {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn AnalysisApi>,
    state: Mutex<TaskState>,
    view_tx: watch::Sender<TaskView>,
    timer: Mutex<PollTimer>,
}

#[derive(Default)]
struct PollTimer {
    handle: Option<JoinHandle<()>>,
    last_poll_started: Option<(JobId, Instant)>,
}

impl PollTimer {
    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl TaskController {
    pub fn new(api: Arc<dyn AnalysisApi>, policy: PollPolicy) -> Self {
        let state = TaskState::with_policy(policy);
        let (view_tx, _) = watch::channel(state.view());
        Self {
            inner: Arc::new(Inner {
                api,
                state: Mutex::new(state),
                view_tx,
                timer: Mutex::new(PollTimer::default()),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TaskView> {
        self.inner.view_tx.subscribe()
    }

    pub fn view(&self) -> TaskView {
        self.inner.view_tx.borrow().clone()
    }

    pub fn submit(&self, input: JobInput) -> Result<(), LifecycleError> {
        let phase = lock(&self.inner.state).phase();
        if !(phase == TaskPhase::Idle || phase.is_terminal()) {
            return Err(LifecycleError::Busy(phase));
        }
        self.inner.dispatch(TaskMsg::Submit(input));
        Ok(())
    }

    /// Cancels the poll timer at once and returns to `Idle`.
    pub fn reset(&self) {
        self.inner.dispatch(TaskMsg::Reset);
    }

    /// Waits until the controller is terminal or back to `Idle`.
    pub async fn wait_until_settled(&self) -> TaskView {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|view| view.phase.is_terminal() || view.phase == TaskPhase::Idle)
            .await
            .map(|view| view.clone());
        settled.unwrap_or_else(|_| self.view())
    }
}

impl Drop for TaskController {
    fn drop(&mut self) {
        self.inner.dispatch(TaskMsg::Reset);
    }
}

impl Inner {
    fn dispatch(self: &Arc<Self>, msg: TaskMsg) {
        let (effects, view) = {
            let mut guard = lock(&self.state);
            let state = std::mem::take(&mut *guard);
            let (mut state, effects) = update(state, msg);
            let view = state.consume_dirty().then(|| state.view());
            *guard = state;
            (effects, view)
        };

        if let Some(view) = view {
            self.view_tx.send_replace(view);
        }
        for effect in effects {
            self.run(effect);
        }
    }

    fn run(self: &Arc<Self>, effect: TaskEffect) {
        match effect {
            TaskEffect::SubmitJob { ticket, input } => {
                let inner = Arc::clone(self);
                tokio::spawn(async move {
                    let result = inner.api.submit_job(&input).await;
                    inner.dispatch(TaskMsg::Submitted { ticket, result });
                });
            }
            TaskEffect::FetchStatus { job_id } => {
                lock(&self.timer).last_poll_started = Some((job_id.clone(), Instant::now()));
                verdict_trace!("Polling job {}", job_id);
                let inner = Arc::clone(self);
                tokio::spawn(async move {
                    let result = inner.api.job_status(&job_id).await;
                    inner.dispatch(TaskMsg::PollCompleted { job_id, result });
                });
            }
            TaskEffect::SchedulePoll { job_id, interval } => {
                let mut timer = lock(&self.timer);
                timer.cancel();
                let anchor = match &timer.last_poll_started {
                    Some((polled, started)) if *polled == job_id => *started,
                    _ => Instant::now(),
                };
                let deadline = anchor + interval;
                let inner = Arc::clone(self);
                timer.handle = Some(tokio::spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    inner.dispatch(TaskMsg::PollDue { job_id });
                }));
            }
            TaskEffect::CancelPoll => {
                let mut timer = lock(&self.timer);
                timer.cancel();
                timer.last_poll_started = None;
            }
        }
    }
}
