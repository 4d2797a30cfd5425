//! Verdict core: pure job-lifecycle and optimistic-reconciliation state machines.
mod conversation;
mod effect;
mod error;
mod input;
mod msg;
mod optimistic;
mod state;
mod types;
mod update;
mod view_model;

pub use conversation::{ConversationReconciler, PendingSend, PROVISIONAL_PREFIX};
pub use effect::TaskEffect;
pub use error::ApiError;
pub use input::{JobInput, DEFAULT_MAX_COMMENTS, MAX_COMMENTS_LIMIT};
pub use msg::TaskMsg;
pub use optimistic::{FetchTicket, MutationHandle, OptimisticStore, StaleMutation};
pub use state::{PollPolicy, TaskPhase, TaskState};
pub use types::{
    ChatExchange, ConversationSummary, JobId, JobResult, JobSnapshot, JobStatus, Message,
    MessageId, Progress, Role,
};
pub use update::update;
pub use view_model::{ConversationView, TaskView, GENERIC_FAILURE};
