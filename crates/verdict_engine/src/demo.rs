//! Canned data served when the backend is unreachable or the demo thread is opened.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use verdict_core::{
    ChatExchange, ConversationSummary, JobId, JobResult, JobSnapshot, Message, Role,
};

pub const DEMO_CONVERSATION_ID: &str = "demo";
pub const DEMO_JOB_ID: &str = "demo-task";

const DEMO_TITLE: &str = "Is the Orion X13 worth upgrading to?";
const DEMO_URL: &str = "https://www.reddit.com/r/tech/comments/demo/orion_x13_upgrade/";
const DEMO_GREETING: &str = "Ask me anything about the Orion X13 Reddit thread. I have consensus, arguments, and quotes ready.";
const DEMO_REPLY: &str = "Demo mode: the thread is MIXED. Most commenters praise the camera pipeline but push back on thermals and the price delta. Connect to the backend for a live answer.";

fn fixed_time(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

pub fn conversation() -> ConversationSummary {
    ConversationSummary {
        id: DEMO_CONVERSATION_ID.to_string(),
        title: Some(DEMO_TITLE.to_string()),
        source_url: Some(DEMO_URL.to_string()),
        total_comments: Some(512),
        created_at: fixed_time(1, 12, 0),
        updated_at: fixed_time(2, 8, 30),
    }
}

pub fn messages() -> Vec<Message> {
    vec![Message::confirmed(
        "demo-msg-1",
        Role::Assistant,
        DEMO_GREETING,
        fixed_time(2, 8, 30),
    )]
}

pub fn job_id() -> JobId {
    JobId::new(DEMO_JOB_ID)
}

/// Terminal status for the fallback job so polling stops at once.
pub fn job_status() -> JobSnapshot {
    JobSnapshot::succeeded(
        job_id(),
        JobResult::new(json!({
            "conversation_id": DEMO_CONVERSATION_ID,
            "total_comments": 512,
            "processed_comments": 500,
            "insights_generated": 0,
        })),
    )
}

/// Echo plus canned answer; `sequence` keeps ids unique across repeated fallbacks.
pub fn reply(conversation_id: &str, text: &str, sequence: u64, now: DateTime<Utc>) -> ChatExchange {
    ChatExchange {
        conversation_id: conversation_id.to_string(),
        user_message: Message::confirmed(
            format!("demo-user-{sequence}"),
            Role::User,
            text,
            now,
        ),
        assistant_message: Message::confirmed(
            format!("demo-assistant-{sequence}"),
            Role::Assistant,
            DEMO_REPLY,
            now,
        ),
    }
}
