//! Verdict engine: backend access, fallback policy and the async drivers.
mod api;
mod chat_session;
pub mod demo;
mod http;
mod resolver;
mod task_controller;
mod wire;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use api::AnalysisApi;
pub use chat_session::{ChatSession, SendOutcome};
pub use http::{ClientSettings, HttpAnalysisApi};
pub use resolver::{FallbackPolicy, ResilientApi};
pub use task_controller::{LifecycleError, TaskController};

/// State guarded here is always left consistent, so a poisoned lock is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
