use chrono::{DateTime, Utc};
use verdict_logging::{verdict_debug, verdict_warn};

use crate::optimistic::{FetchTicket, MutationHandle, OptimisticStore, StaleMutation};
use crate::view_model::ConversationView;
use crate::{ApiError, ChatExchange, Message, MessageId, Role};

/// Reserved prefix for locally generated message ids.
pub const PROVISIONAL_PREFIX: &str = "optimistic-";

/// A send that has been shown tentatively and awaits the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    handle: MutationHandle<String>,
    provisional: Message,
}

impl PendingSend {
    pub fn provisional(&self) -> &Message {
        &self.provisional
    }

    pub fn generation(&self) -> u64 {
        self.handle.generation()
    }
}

/// Ordered message list of one conversation with optimistic sends.
#[derive(Debug, Clone)]
pub struct ConversationReconciler {
    conversation_id: String,
    store: OptimisticStore<String, Vec<Message>>,
    next_provisional: u64,
    last_error: Option<ApiError>,
}

impl ConversationReconciler {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            store: OptimisticStore::new(),
            next_provisional: 0,
            last_error: None,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn messages(&self) -> &[Message] {
        self.store
            .get(&self.conversation_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_sending(&self) -> bool {
        self.store.is_pending(&self.conversation_id)
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn begin_load(&self) -> FetchTicket<String> {
        self.store.begin_fetch(self.conversation_id.clone())
    }

    /// Installs a fetched list; ignored if a send started or resolved meanwhile.
    pub fn finish_load(&mut self, ticket: FetchTicket<String>, messages: Vec<Message>) -> bool {
        self.store.finish_fetch(ticket, dedupe_by_id(messages))
    }

    /// Appends a provisional user message and returns the pending send.
    pub fn begin_send(&mut self, text: &str, now: DateTime<Utc>) -> PendingSend {
        self.next_provisional += 1;
        let provisional = Message {
            id: MessageId::new(format!(
                "{PROVISIONAL_PREFIX}{}-{}",
                now.timestamp_millis(),
                self.next_provisional
            )),
            role: Role::User,
            content: text.to_string(),
            created_at: now,
            is_optimistic: true,
        };
        let mut tentative = self.messages().to_vec();
        tentative.push(provisional.clone());
        let handle = self.store.apply(self.conversation_id.clone(), tentative);
        self.last_error = None;
        verdict_debug!(
            "Optimistic message {} in conversation {}",
            provisional.id,
            self.conversation_id
        );
        PendingSend {
            handle,
            provisional,
        }
    }

    /// Replaces every provisional entry with the confirmed pair in one write.
    ///
    /// An echoed id the list already holds is updated where it stands;
    /// only new ids are appended.
    pub fn confirm_send(
        &mut self,
        pending: &PendingSend,
        exchange: ChatExchange,
    ) -> Result<(), StaleMutation> {
        let mut user = Some(settle(exchange.user_message));
        let mut assistant = Some(settle(exchange.assistant_message));
        let mut confirmed = Vec::with_capacity(self.messages().len() + 2);
        for message in self
            .messages()
            .iter()
            .filter(|message| !message.is_optimistic && !message.id.is_provisional())
        {
            if user.as_ref().is_some_and(|echo| echo.id == message.id) {
                confirmed.extend(user.take());
            } else if assistant.as_ref().is_some_and(|echo| echo.id == message.id) {
                confirmed.extend(assistant.take());
            } else {
                confirmed.push(message.clone());
            }
        }
        confirmed.extend(user);
        confirmed.extend(assistant);
        self.store.commit(&pending.handle, confirmed)?;
        self.last_error = None;
        Ok(())
    }

    /// Restores the pre-send list and records the failure.
    pub fn fail_send(&mut self, pending: &PendingSend, error: ApiError) -> Result<(), StaleMutation> {
        self.store.rollback(&pending.handle)?;
        verdict_warn!(
            "Send failed in conversation {}: {}",
            self.conversation_id,
            error
        );
        self.last_error = Some(error);
        Ok(())
    }

    /// Restores the pre-send list for a send nobody is waiting on any more.
    pub fn abandon_send(&mut self, pending: &PendingSend) -> Result<(), StaleMutation> {
        self.store.rollback(&pending.handle)?;
        verdict_debug!(
            "Abandoned send {} in conversation {}",
            pending.provisional.id,
            self.conversation_id
        );
        Ok(())
    }

    /// Records a failed message listing; the list itself is left alone.
    pub fn fail_load(&mut self, error: ApiError) {
        verdict_warn!(
            "Loading conversation {} failed: {}",
            self.conversation_id,
            error
        );
        self.last_error = Some(error);
    }

    pub fn view(&self) -> ConversationView {
        ConversationView {
            conversation_id: self.conversation_id.clone(),
            messages: self.messages().to_vec(),
            is_sending: self.is_sending(),
            last_error: self.last_error.clone(),
        }
    }
}

fn settle(mut message: Message) -> Message {
    message.is_optimistic = false;
    message
}

fn dedupe_by_id(messages: Vec<Message>) -> Vec<Message> {
    let mut seen = std::collections::HashSet::new();
    messages
        .into_iter()
        .filter(|message| seen.insert(message.id.clone()))
        .collect()
}
