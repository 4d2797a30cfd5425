use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Local, Utc};
use verdict_core::{
    ConversationSummary, JobInput, JobStatus, Message, Role, TaskPhase, TaskView, GENERIC_FAILURE,
};
use verdict_engine::{
    AnalysisApi, ChatSession, HttpAnalysisApi, ResilientApi, SendOutcome, TaskController,
};
use verdict_logging::{verdict_info, verdict_warn};

use super::cli::Command;
use super::config::Settings;

pub async fn execute(command: Command, settings: Settings) -> anyhow::Result<()> {
    let http = HttpAnalysisApi::new(settings.client.clone())
        .with_context(|| format!("cannot use backend at {}", settings.client.base_url))?;
    let api: Arc<dyn AnalysisApi> = Arc::new(ResilientApi::new(http, settings.fallback.clone()));

    match command {
        Command::Analyze { url, max_comments } => {
            analyze(api, &settings, &url, max_comments).await
        }
        Command::Conversations => conversations(api.as_ref()).await,
        Command::Chat {
            conversation_id,
            text,
        } => chat(api, &conversation_id, &text).await,
    }
}

async fn analyze(
    api: Arc<dyn AnalysisApi>,
    settings: &Settings,
    url: &str,
    max_comments: u32,
) -> anyhow::Result<()> {
    let input = JobInput::new(url)
        .and_then(|input| input.with_max_comments(max_comments))
        .map_err(|err| anyhow!(err.user_message()))
        .context("rejected job input")?;

    let controller = TaskController::new(api, settings.poll);
    let mut views = controller.subscribe();
    controller.submit(input)?;

    let mut last_line = String::new();
    let view = loop {
        let view = views.borrow_and_update().clone();
        let line = describe(&view);
        if line != last_line {
            println!("{line}");
            last_line = line;
        }
        if view.phase.is_terminal() {
            break view;
        }
        tokio::select! {
            changed = views.changed() => changed.context("job controller stopped")?,
            _ = tokio::signal::ctrl_c() => {
                verdict_info!("Interrupted, cancelling job");
                controller.reset();
                bail!("cancelled");
            }
        }
    };

    match view.phase {
        TaskPhase::Succeeded => {
            match view.conversation_id() {
                Some(id) => println!("Analysis complete. Chat with: verdict chat {id} \"...\""),
                None => println!("Analysis complete."),
            }
            Ok(())
        }
        _ => bail!(view
            .error
            .unwrap_or_else(|| GENERIC_FAILURE.to_string())),
    }
}

fn describe(view: &TaskView) -> String {
    let job = view.job_id.as_ref().map(|id| id.as_str()).unwrap_or("-");
    match view.phase {
        TaskPhase::Idle => "Idle".to_string(),
        TaskPhase::Submitting => "Submitting job...".to_string(),
        TaskPhase::Polling => {
            let status = match view.snapshot.as_ref().map(|s| s.status) {
                Some(JobStatus::Running) => "running",
                Some(JobStatus::Succeeded) => "finishing",
                _ => "queued",
            };
            let progress = view
                .snapshot
                .as_ref()
                .and_then(|s| s.progress)
                .map(|p| format!(" {}/{} comments", p.done, p.total))
                .unwrap_or_default();
            let retrying = if view.consecutive_failures > 0 {
                format!(" (retry {})", view.consecutive_failures)
            } else {
                String::new()
            };
            format!("Job {job}: {status}{progress}{retrying}")
        }
        TaskPhase::Succeeded => format!("Job {job}: done"),
        TaskPhase::Failed => format!("Job {job}: failed"),
    }
}

async fn conversations(api: &dyn AnalysisApi) -> anyhow::Result<()> {
    let conversations = api
        .list_conversations()
        .await
        .map_err(|err| anyhow!(err.user_message()))
        .context("cannot list conversations")?;
    if conversations.is_empty() {
        println!("No conversations yet.");
        return Ok(());
    }
    for conversation in &conversations {
        println!("{}", summary_line(conversation));
    }
    Ok(())
}

fn summary_line(conversation: &ConversationSummary) -> String {
    let title = conversation.title.as_deref().unwrap_or("(untitled)");
    let comments = conversation
        .total_comments
        .map(|n| format!("{n} comments"))
        .unwrap_or_else(|| "? comments".to_string());
    format!(
        "{}  {}  [{}, updated {}]",
        conversation.id,
        title,
        comments,
        local_time(conversation.updated_at)
    )
}

async fn chat(api: Arc<dyn AnalysisApi>, conversation_id: &str, text: &str) -> anyhow::Result<()> {
    let session = ChatSession::new(api, conversation_id);
    session
        .load()
        .await
        .map_err(|err| anyhow!(err.user_message()))
        .with_context(|| format!("cannot open conversation {conversation_id}"))?;

    let outcome = session.send(text).await;
    for message in &session.view().messages {
        println!("{}", message_line(message));
    }

    match outcome {
        Ok(SendOutcome::Delivered) => Ok(()),
        Ok(SendOutcome::Superseded) => {
            verdict_warn!("Send was superseded");
            Ok(())
        }
        Err(err) => Err(anyhow!(err.user_message())).context("message not delivered"),
    }
}

fn message_line(message: &Message) -> String {
    let speaker = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    format!(
        "[{}] {}: {}",
        local_time(message.created_at),
        speaker,
        message.content
    )
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use verdict_core::{JobId, JobSnapshot, Progress};

    #[test]
    fn polling_line_shows_progress_and_retries() {
        let view = TaskView {
            phase: TaskPhase::Polling,
            job_id: Some(JobId::from("t1")),
            snapshot: Some(JobSnapshot {
                status: JobStatus::Running,
                progress: Some(Progress { done: 40, total: 500 }),
                ..JobSnapshot::pending(JobId::from("t1"))
            }),
            consecutive_failures: 2,
            ..TaskView::default()
        };

        assert_eq!(describe(&view), "Job t1: running 40/500 comments (retry 2)");
    }

    #[test]
    fn message_line_names_the_speaker() {
        let at = Utc.with_ymd_and_hms(2025, 5, 2, 9, 0, 0).unwrap();
        let line = message_line(&Message::confirmed("m1", Role::Assistant, "Hi", at));
        assert!(line.ends_with("] assistant: Hi"), "{line}");
    }
}
