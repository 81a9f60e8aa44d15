use chrono::Utc;

use crate::api::{ChatEntry, ChatRole};

/// Entries addressed to or written by `agent_id`, oldest first. When there
/// are none, a single local greeting stands in; it is never sent anywhere.
pub fn visible_messages<'a>(
    log: impl IntoIterator<Item = &'a ChatEntry>,
    agent_id: Option<&str>,
    greeting: &str,
) -> Vec<ChatEntry> {
    let Some(agent_id) = agent_id else {
        return Vec::new();
    };

    let mut visible: Vec<ChatEntry> = log
        .into_iter()
        .filter(|entry| entry.agent_id == agent_id)
        .cloned()
        .collect();
    // Stable, so entries sharing a timestamp keep log order.
    visible.sort_by_key(|entry| entry.ts);

    if visible.is_empty() {
        visible.push(ChatEntry {
            ts: Utc::now(),
            project_id: String::new(),
            agent_id: agent_id.to_string(),
            role: ChatRole::Assistant,
            text: greeting.to_string(),
            run_id: None,
        });
    }
    visible
}
