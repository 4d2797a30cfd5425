use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use verdict_core::{ApiError, ConversationReconciler, ConversationView, PendingSend};
use verdict_logging::{verdict_debug, verdict_info};

use crate::api::AnalysisApi;
use crate::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// A newer send on the same conversation replaced this one before it resolved.
    Superseded,
}

/// Message list of one conversation, with optimistic sends.
pub struct ChatSession {
    api: Arc<dyn AnalysisApi>,
    reconciler: Mutex<ConversationReconciler>,
    view_tx: watch::Sender<ConversationView>,
    in_flight: Mutex<Option<CancellationToken>>,
}

impl ChatSession {
    pub fn new(api: Arc<dyn AnalysisApi>, conversation_id: impl Into<String>) -> Self {
        let reconciler = ConversationReconciler::new(conversation_id);
        let (view_tx, _) = watch::channel(reconciler.view());
        Self {
            api,
            reconciler: Mutex::new(reconciler),
            view_tx,
            in_flight: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationView> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> ConversationView {
        self.view_tx.borrow().clone()
    }

    /// Fetches the confirmed list; dropped if a send starts before it returns.
    pub async fn load(&self) -> Result<(), ApiError> {
        let (ticket, conversation_id) = {
            let reconciler = lock(&self.reconciler);
            (
                reconciler.begin_load(),
                reconciler.conversation_id().to_string(),
            )
        };
        let messages = match self.api.list_messages(&conversation_id).await {
            Ok(messages) => messages,
            Err(err) => {
                lock(&self.reconciler).fail_load(err.clone());
                self.publish();
                return Err(err);
            }
        };
        let applied = lock(&self.reconciler).finish_load(ticket, messages);
        if applied {
            self.publish();
        }
        Ok(())
    }

    /// Shows `text` at once, then reconciles it with the server's answer.
    ///
    /// A failed post restores the previous list and returns the error.
    /// Dropping the future before it resolves restores the list as well.
    pub async fn send(&self, text: &str) -> Result<SendOutcome, ApiError> {
        let token = CancellationToken::new();
        if let Some(previous) = lock(&self.in_flight).replace(token.clone()) {
            verdict_debug!("Superseding in-flight send");
            previous.cancel();
        }

        let (pending, conversation_id) = {
            let mut reconciler = lock(&self.reconciler);
            let pending = reconciler.begin_send(text, Utc::now());
            (pending, reconciler.conversation_id().to_string())
        };
        self.publish();

        let mut guard = AbandonGuard {
            session: self,
            pending,
            token: token.clone(),
            armed: true,
        };
        let result = tokio::select! {
            _ = token.cancelled() => return Ok(SendOutcome::Superseded),
            result = self.api.post_message(&conversation_id, text) => result,
        };
        guard.armed = false;
        let pending = &guard.pending;

        {
            // Only the newest send leaves an uncancelled token behind.
            let mut slot = lock(&self.in_flight);
            if !token.is_cancelled() {
                *slot = None;
            }
        }

        let resolved = {
            let mut reconciler = lock(&self.reconciler);
            match result {
                Ok(exchange) => reconciler
                    .confirm_send(pending, exchange)
                    .map(|()| Ok(SendOutcome::Delivered)),
                Err(err) => reconciler.fail_send(pending, err.clone()).map(|()| Err(err)),
            }
        };

        match resolved {
            Ok(outcome) => {
                self.publish();
                if outcome.is_ok() {
                    verdict_info!("Message delivered to conversation {}", conversation_id);
                }
                outcome
            }
            Err(_stale) => Ok(SendOutcome::Superseded),
        }
    }

    fn publish(&self) {
        let view = lock(&self.reconciler).view();
        self.view_tx.send_replace(view);
    }
}

/// Rolls back a send whose future was dropped before the post resolved.
struct AbandonGuard<'a> {
    session: &'a ChatSession,
    pending: PendingSend,
    token: CancellationToken,
    armed: bool,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        // A cancelled token means a newer send owns the list now.
        if !self.armed || self.token.is_cancelled() {
            return;
        }
        // Uncancelled, so the slot still holds this send's token.
        *lock(&self.session.in_flight) = None;
        let restored = lock(&self.session.reconciler)
            .abandon_send(&self.pending)
            .is_ok();
        if restored {
            self.session.publish();
        }
    }
}
