mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{exchange, init_logging, message, transport, ScriptedApi, UnreachableApi};
use pretty_assertions::assert_eq;
use verdict_core::{ApiError, Message, Role};
use verdict_engine::{ChatSession, FallbackPolicy, ResilientApi, SendOutcome};

fn history() -> Vec<Message> {
    vec![
        message("m-1", Role::User, "Is the X13 any good?"),
        message("m-2", Role::Assistant, "Most commenters like the screen."),
    ]
}

fn ids(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.id.as_str()).collect()
}

async fn loaded(api: Arc<ScriptedApi>) -> ChatSession {
    let session = ChatSession::new(api, "conv-1");
    session.load().await.unwrap();
    session
}

#[tokio::test(start_paused = true)]
async fn load_publishes_confirmed_history() {
    init_logging();
    let api = Arc::new(ScriptedApi::new().messages(history()));
    let session = ChatSession::new(api, "conv-1");
    let mut rx = session.subscribe();

    session.load().await.unwrap();

    assert!(rx.has_changed().unwrap());
    let view = rx.borrow_and_update().clone();
    assert_eq!(view.conversation_id, "conv-1");
    assert_eq!(ids(&view.messages), vec!["m-1", "m-2"]);
    assert!(!view.is_sending);
}

#[tokio::test(start_paused = true)]
async fn send_shows_provisional_message_then_confirms() {
    init_logging();
    let api = Arc::new(
        ScriptedApi::new()
            .messages(history())
            .post(Duration::from_secs(1), Ok(exchange("1", "What about battery?"))),
    );
    let session = loaded(api).await;

    let (outcome, during) = tokio::join!(session.send("What about battery?"), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        session.view()
    });

    assert_eq!(during.messages.len(), 3);
    let provisional = &during.messages[2];
    assert!(provisional.is_optimistic);
    assert!(provisional.id.is_provisional());
    assert_eq!(provisional.content, "What about battery?");
    assert!(during.is_sending);

    assert_eq!(outcome, Ok(SendOutcome::Delivered));
    let view = session.view();
    assert_eq!(ids(&view.messages), vec!["m-1", "m-2", "u-1", "a-1"]);
    assert!(view.messages.iter().all(|m| !m.is_optimistic));
    assert!(!view.is_sending);
    assert!(view.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_send_restores_previous_list() {
    init_logging();
    let api = Arc::new(
        ScriptedApi::new()
            .messages(history())
            .post(Duration::from_secs(1), Err(transport())),
    );
    let session = loaded(api).await;
    let before = session.view().messages;

    let (outcome, during) = tokio::join!(session.send("Hello?"), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        session.view()
    });

    assert_eq!(during.messages.len(), 3);
    assert_eq!(outcome, Err(transport()));
    let view = session.view();
    assert_eq!(view.messages, before);
    assert_eq!(view.last_error, Some(transport()));
    assert!(!view.is_sending);
}

#[tokio::test(start_paused = true)]
async fn newer_send_supersedes_older_one() {
    init_logging();
    let api = Arc::new(
        ScriptedApi::new()
            .messages(history())
            .post(Duration::from_secs(3), Ok(exchange("1", "first")))
            .post(Duration::from_secs(1), Ok(exchange("2", "second"))),
    );
    let session = loaded(api).await;

    let (first, second) = tokio::join!(session.send("first"), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.send("second").await
    });

    assert_eq!(first, Ok(SendOutcome::Superseded));
    assert_eq!(second, Ok(SendOutcome::Delivered));
    let view = session.view();
    assert_eq!(ids(&view.messages), vec!["m-1", "m-2", "u-2", "a-2"]);
    assert!(!view.is_sending);
}

#[tokio::test(start_paused = true)]
async fn superseding_send_that_fails_restores_the_original_list() {
    init_logging();
    let api = Arc::new(
        ScriptedApi::new()
            .messages(history())
            .post(Duration::from_secs(3), Ok(exchange("1", "first")))
            .post(
                Duration::from_secs(1),
                Err(ApiError::Server {
                    status: 500,
                    message: "Error processing chat".into(),
                }),
            ),
    );
    let session = loaded(api).await;

    let (first, second) = tokio::join!(session.send("first"), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.send("second").await
    });

    assert_eq!(first, Ok(SendOutcome::Superseded));
    assert!(matches!(second, Err(ApiError::Server { status: 500, .. })));
    assert_eq!(ids(&session.view().messages), vec!["m-1", "m-2"]);
}

#[tokio::test(start_paused = true)]
async fn offline_send_gets_a_canned_reply() {
    init_logging();
    let backend = Arc::new(UnreachableApi::new());
    let api = Arc::new(ResilientApi::new(backend.clone(), FallbackPolicy::default()));
    let session = ChatSession::new(api, "conv-1");

    let outcome = session.send("anyone there?").await;

    assert_eq!(outcome, Ok(SendOutcome::Delivered));
    let view = session.view();
    assert_eq!(ids(&view.messages), vec!["demo-user-1", "demo-assistant-1"]);
    assert_eq!(view.messages[0].content, "anyone there?");
    assert_eq!(view.messages[1].role, Role::Assistant);
    assert!(view.last_error.is_none());
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn demo_conversation_never_touches_the_network() {
    init_logging();
    let backend = Arc::new(UnreachableApi::new());
    let api = Arc::new(ResilientApi::new(backend.clone(), FallbackPolicy::default()));
    let session = ChatSession::new(api, "demo");

    session.load().await.unwrap();
    assert_eq!(ids(&session.view().messages), vec!["demo-msg-1"]);

    let outcome = session.send("Summarise the thread").await;
    assert_eq!(outcome, Ok(SendOutcome::Delivered));
    assert_eq!(session.view().messages.len(), 3);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropped_send_restores_the_list() {
    init_logging();
    let api = Arc::new(
        ScriptedApi::new()
            .messages(history())
            .post(Duration::from_secs(10), Ok(exchange("1", "hi"))),
    );
    let session = loaded(api).await;
    let before = session.view().messages;

    let timed_out = tokio::time::timeout(Duration::from_secs(1), session.send("hi")).await;
    assert!(timed_out.is_err());

    tokio::time::sleep(Duration::from_secs(30)).await;
    let view = session.view();
    assert_eq!(view.messages, before);
    assert!(view.messages.iter().all(|m| !m.is_optimistic));
    assert!(!view.is_sending);
    assert!(view.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn send_after_a_dropped_send_is_not_superseded() {
    init_logging();
    let api = Arc::new(
        ScriptedApi::new()
            .messages(history())
            .post(Duration::from_secs(10), Ok(exchange("1", "first")))
            .post(Duration::from_secs(1), Ok(exchange("2", "second"))),
    );
    let session = loaded(api).await;

    let _ = tokio::time::timeout(Duration::from_secs(1), session.send("first")).await;
    let outcome = session.send("second").await;

    assert_eq!(outcome, Ok(SendOutcome::Delivered));
    assert_eq!(ids(&session.view().messages), vec!["m-1", "m-2", "u-2", "a-2"]);
}

#[tokio::test(start_paused = true)]
async fn failed_load_is_exposed_on_the_view() {
    init_logging();
    let session = ChatSession::new(Arc::new(UnreachableApi::new()), "conv-1");

    let result = session.load().await;

    assert_eq!(result, Err(transport()));
    let view = session.view();
    assert!(view.messages.is_empty());
    assert_eq!(view.last_error, Some(transport()));
}
