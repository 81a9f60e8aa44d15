//! Per-project message log with optimistic sends.
//!
//! The authoritative log is always exactly what the service last returned.
//! Entries synthesized locally for a send live in a separate overlay, keyed
//! by an idempotency key, and are dropped by the first successful log load
//! that was started after their run settled.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::{ChatEntry, ChatRole, RunResponse};
use crate::core::loadable::Loadable;
use crate::core::validation::ValidationError;

/// Shown when a run succeeds without any output text.
pub const RUN_OUTPUT_PLACEHOLDER: &str = "(no output)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub key: String,
    pub send_id: u64,
    pub entry: ChatEntry,
}

/// A run the caller should issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTicket {
    pub send_id: u64,
    pub project_id: String,
    pub agent_id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSettlement {
    /// Fetch the authoritative log for this project under this generation.
    Reconcile { project_id: String, generation: u64 },
    /// The project is no longer shown; its optimistic entries were dropped.
    Dropped,
    /// No such send is being tracked.
    Unknown,
}

#[derive(Debug)]
struct SendRecord {
    project_id: String,
    agent_id: String,
    settled: bool,
}

#[derive(Debug, Default)]
pub struct ChatReconciler {
    project_id: Option<String>,
    pub log: Loadable<Vec<ChatEntry>>,
    pending: Vec<PendingEntry>,
    sends: BTreeMap<u64, SendRecord>,
    next_send_id: u64,
    settled_at_load: BTreeSet<u64>,
    send_error: Option<String>,
}

fn local_entry(project_id: &str, agent_id: &str, role: ChatRole, text: String) -> ChatEntry {
    ChatEntry {
        ts: Utc::now(),
        project_id: project_id.to_string(),
        agent_id: agent_id.to_string(),
        role,
        text,
        run_id: None,
    }
}

impl ChatReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project whose log is held (or being loaded).
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Exactly the entries the service returned on the last successful load.
    pub fn authoritative(&self) -> &[ChatEntry] {
        self.log.data().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pending(&self) -> &[PendingEntry] {
        &self.pending
    }

    /// Log as displayed: authoritative entries followed by optimistic ones
    /// for the same project.
    pub fn entries(&self) -> impl Iterator<Item = &ChatEntry> {
        let project_id = self.project_id.as_deref();
        self.authoritative().iter().chain(
            self.pending
                .iter()
                .filter(move |pending| Some(pending.entry.project_id.as_str()) == project_id)
                .map(|pending| &pending.entry),
        )
    }

    pub fn send_error(&self) -> Option<&str> {
        self.send_error.as_deref()
    }

    pub fn is_sending(&self) -> bool {
        self.sends.values().any(|send| !send.settled)
    }

    /// Starts loading `project_id`'s log, or clears everything when there is
    /// no project. Switching projects drops the previous log immediately.
    pub fn begin_load(&mut self, project_id: Option<&str>) -> Option<u64> {
        let Some(project_id) = project_id.filter(|id| !id.is_empty()) else {
            debug!("no project; clearing chat log");
            self.project_id = None;
            self.log.reset();
            self.forget_settled_elsewhere(None);
            self.settled_at_load.clear();
            return None;
        };

        Some(self.begin_load_for(project_id))
    }

    fn begin_load_for(&mut self, project_id: &str) -> u64 {
        if self.project_id.as_deref() != Some(project_id) {
            self.log.reset();
            self.forget_settled_elsewhere(Some(project_id));
            self.project_id = Some(project_id.to_string());
        }

        self.settled_at_load = self
            .sends
            .iter()
            .filter(|(_, send)| send.settled && send.project_id == project_id)
            .map(|(id, _)| *id)
            .collect();
        self.log.begin()
    }

    /// Drops overlay entries of settled sends outside `project_id`. Sends
    /// still in flight keep theirs so switching back shows them again.
    fn forget_settled_elsewhere(&mut self, project_id: Option<&str>) {
        let sends = &self.sends;
        self.pending.retain(|pending| {
            Some(pending.entry.project_id.as_str()) == project_id
                || sends
                    .get(&pending.send_id)
                    .is_some_and(|send| !send.settled)
        });
        self.sends
            .retain(|_, send| !send.settled || Some(send.project_id.as_str()) == project_id);
    }

    /// Replaces the log wholesale with a load result. Stale results (older
    /// generation, or a project that is no longer shown) are discarded.
    pub fn apply_load(
        &mut self,
        project_id: &str,
        generation: u64,
        result: Result<Vec<ChatEntry>, String>,
    ) -> bool {
        if self.project_id.as_deref() != Some(project_id) {
            debug!(project = project_id, "discarding chat log for inactive project");
            return false;
        }
        let succeeded = result.is_ok();
        if let Err(message) = &result {
            warn!(project = project_id, error = %message, "chat log failed");
        }
        if !self.log.finish(generation, result) {
            return false;
        }
        if succeeded {
            let settled = std::mem::take(&mut self.settled_at_load);
            self.pending
                .retain(|pending| !settled.contains(&pending.send_id));
            self.sends.retain(|id, _| !settled.contains(id));
            info!(
                project = project_id,
                entries = self.authoritative().len(),
                pending = self.pending.len(),
                "chat log reconciled"
            );
        }
        true
    }

    /// Validates a send and appends the optimistic user entry. A rejected
    /// send leaves every field untouched.
    pub fn begin_send(
        &mut self,
        project_id: Option<&str>,
        agent_id: Option<&str>,
        text: &str,
    ) -> Result<SendTicket, ValidationError> {
        let message = text.trim();
        if message.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        let project_id = project_id
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::NoActiveProject)?;
        let agent_id = agent_id
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::NoActiveAgent)?;

        self.next_send_id += 1;
        let send_id = self.next_send_id;
        self.pending.push(PendingEntry {
            key: Uuid::new_v4().to_string(),
            send_id,
            entry: local_entry(project_id, agent_id, ChatRole::User, message.to_string()),
        });
        self.sends.insert(
            send_id,
            SendRecord {
                project_id: project_id.to_string(),
                agent_id: agent_id.to_string(),
                settled: false,
            },
        );
        self.send_error = None;

        Ok(SendTicket {
            send_id,
            project_id: project_id.to_string(),
            agent_id: agent_id.to_string(),
            message: message.to_string(),
        })
    }

    /// Settles a run. On success the optimistic assistant entry is appended;
    /// either way the log is reloaded when its project is still shown.
    pub fn apply_run_result(
        &mut self,
        send_id: u64,
        result: Result<RunResponse, String>,
    ) -> RunSettlement {
        let Some(send) = self.sends.get_mut(&send_id) else {
            return RunSettlement::Unknown;
        };
        send.settled = true;
        let project_id = send.project_id.clone();
        let agent_id = send.agent_id.clone();

        match result {
            Ok(response) => {
                let text = response
                    .output_text()
                    .filter(|text| !text.is_empty())
                    .unwrap_or(RUN_OUTPUT_PLACEHOLDER)
                    .to_string();
                let mut entry = local_entry(&project_id, &agent_id, ChatRole::Assistant, text);
                entry.run_id = response.run_id;
                info!(project = %project_id, agent = %agent_id, run = ?entry.run_id, "run finished");
                self.pending.push(PendingEntry {
                    key: Uuid::new_v4().to_string(),
                    send_id,
                    entry,
                });
            }
            Err(message) => {
                warn!(project = %project_id, agent = %agent_id, error = %message, "run failed");
                self.send_error = Some(message);
            }
        }

        if self.project_id.as_deref() == Some(project_id.as_str()) {
            let generation = self.begin_load_for(&project_id);
            RunSettlement::Reconcile {
                project_id,
                generation,
            }
        } else {
            debug!(project = %project_id, "run settled for inactive project");
            self.pending.retain(|pending| pending.send_id != send_id);
            self.sends.remove(&send_id);
            RunSettlement::Dropped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RunOutput;
    use chrono::TimeZone;

    fn server_entry(agent: &str, role: ChatRole, text: &str, minute: u32) -> ChatEntry {
        ChatEntry {
            ts: Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
            project_id: "p1".into(),
            agent_id: agent.into(),
            role,
            text: text.into(),
            run_id: None,
        }
    }

    fn run_ok(content: Option<&str>, run_id: &str) -> Result<RunResponse, String> {
        Ok(RunResponse {
            output: Some(RunOutput {
                content: content.map(str::to_string),
            }),
            run_id: Some(run_id.to_string()),
        })
    }

    fn loaded(project: &str) -> ChatReconciler {
        let mut chat = ChatReconciler::new();
        let generation = chat.begin_load(Some(project)).unwrap();
        assert!(chat.apply_load(project, generation, Ok(Vec::new())));
        chat
    }

    #[test]
    fn falsy_project_clears_without_load() {
        let mut chat = loaded("p1");
        assert_eq!(chat.begin_load(None), None);
        assert_eq!(chat.begin_load(Some("")), None);
        assert!(chat.project_id().is_none());
        assert_eq!(chat.entries().count(), 0);
    }

    #[test]
    fn load_replaces_log_exactly() {
        let mut chat = loaded("p1");
        let first = vec![server_entry("dev", ChatRole::User, "a", 0)];
        let generation = chat.begin_load(Some("p1")).unwrap();
        chat.apply_load("p1", generation, Ok(first));

        let second = vec![
            server_entry("qa", ChatRole::User, "b", 1),
            server_entry("qa", ChatRole::Assistant, "c", 2),
        ];
        let generation = chat.begin_load(Some("p1")).unwrap();
        chat.apply_load("p1", generation, Ok(second.clone()));
        assert_eq!(chat.authoritative(), second.as_slice());
    }

    #[test]
    fn rejected_sends_do_not_mutate() {
        let mut chat = loaded("p1");
        assert_eq!(
            chat.begin_send(Some("p1"), Some("dev"), "   "),
            Err(ValidationError::EmptyMessage)
        );
        assert_eq!(
            chat.begin_send(None, Some("dev"), "Hello"),
            Err(ValidationError::NoActiveProject)
        );
        assert!(chat.pending().is_empty());
        assert!(!chat.is_sending());
    }

    #[test]
    fn optimistic_entries_precede_reconciliation() {
        let mut chat = loaded("p1");
        let ticket = chat.begin_send(Some("p1"), Some("dev"), "Hello").unwrap();
        assert_eq!(ticket.message, "Hello");
        assert!(chat.is_sending());

        let settlement = chat.apply_run_result(ticket.send_id, run_ok(Some("Done"), "r1"));
        assert!(matches!(settlement, RunSettlement::Reconcile { ref project_id, .. } if project_id == "p1"));

        let shown: Vec<_> = chat
            .entries()
            .map(|entry| (entry.role, entry.text.as_str(), entry.run_id.as_deref()))
            .collect();
        assert_eq!(
            shown,
            vec![
                (ChatRole::User, "Hello", None),
                (ChatRole::Assistant, "Done", Some("r1")),
            ]
        );
        let keys: BTreeSet<_> = chat.pending().iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn reconciliation_replaces_optimistic_entries_without_duplicates() {
        let mut chat = loaded("p1");
        let ticket = chat.begin_send(Some("p1"), Some("dev"), "Hello").unwrap();
        let RunSettlement::Reconcile { generation, .. } =
            chat.apply_run_result(ticket.send_id, run_ok(Some("Done"), "r1"))
        else {
            panic!("expected reconciliation");
        };

        let server = vec![
            server_entry("dev", ChatRole::User, "Hello", 0),
            server_entry("dev", ChatRole::Assistant, "Done", 1),
        ];
        assert!(chat.apply_load("p1", generation, Ok(server.clone())));
        assert_eq!(chat.authoritative(), server.as_slice());
        assert!(chat.pending().is_empty());
        assert_eq!(chat.entries().count(), 2);
        assert!(!chat.is_sending());
    }

    #[test]
    fn load_started_before_run_settles_keeps_overlay() {
        let mut chat = loaded("p1");
        let ticket = chat.begin_send(Some("p1"), Some("dev"), "Hello").unwrap();
        let early = chat.begin_load(Some("p1")).unwrap();
        assert!(chat.apply_load("p1", early, Ok(Vec::new())));
        assert_eq!(chat.pending().len(), 1);

        chat.apply_run_result(ticket.send_id, run_ok(None, "r2"));
        let assistant = chat.pending().last().unwrap();
        assert_eq!(assistant.entry.text, RUN_OUTPUT_PLACEHOLDER);
    }

    #[test]
    fn most_recently_started_load_wins() {
        let mut chat = loaded("p1");
        let older = chat.begin_load(Some("p1")).unwrap();
        let newer = chat.begin_load(Some("p1")).unwrap();
        let fresh = vec![server_entry("dev", ChatRole::User, "fresh", 2)];

        assert!(chat.apply_load("p1", newer, Ok(fresh.clone())));
        assert!(!chat.apply_load(
            "p1",
            older,
            Ok(vec![server_entry("dev", ChatRole::User, "stale", 1)])
        ));
        assert_eq!(chat.authoritative(), fresh.as_slice());
    }

    #[test]
    fn load_for_previous_project_is_fenced() {
        let mut chat = loaded("p1");
        let for_p1 = chat.begin_load(Some("p1")).unwrap();
        chat.begin_load(Some("p2")).unwrap();
        assert!(!chat.apply_load("p1", for_p1, Ok(vec![server_entry("dev", ChatRole::User, "x", 0)])));
        assert!(chat.authoritative().is_empty());
        assert_eq!(chat.project_id(), Some("p2"));
    }

    #[test]
    fn failed_run_records_error_and_still_reconciles() {
        let mut chat = loaded("p1");
        let ticket = chat.begin_send(Some("p1"), Some("dev"), "Hello").unwrap();
        let settlement = chat.apply_run_result(ticket.send_id, Err("HTTP 502".into()));
        let RunSettlement::Reconcile { generation, .. } = settlement else {
            panic!("expected reconciliation");
        };
        assert_eq!(chat.send_error(), Some("HTTP 502"));
        assert_eq!(chat.pending().len(), 1);

        assert!(chat.apply_load("p1", generation, Ok(Vec::new())));
        assert!(chat.pending().is_empty());
        assert_eq!(chat.send_error(), Some("HTTP 502"));
    }

    #[test]
    fn run_for_project_switched_away_is_dropped() {
        let mut chat = loaded("p1");
        let ticket = chat.begin_send(Some("p1"), Some("dev"), "Hello").unwrap();
        chat.begin_load(Some("p2"));
        assert_eq!(
            chat.apply_run_result(ticket.send_id, run_ok(Some("Done"), "r1")),
            RunSettlement::Dropped
        );
        assert!(chat.pending().is_empty());
        assert_eq!(chat.apply_run_result(ticket.send_id, Err("late".into())), RunSettlement::Unknown);
    }

    #[test]
    fn switching_away_and_back_keeps_in_flight_user_entry() {
        let mut chat = loaded("p1");
        let ticket = chat.begin_send(Some("p1"), Some("dev"), "Hello").unwrap();

        chat.begin_load(Some("p2"));
        assert_eq!(chat.entries().count(), 0);
        chat.begin_load(Some("p1"));

        let settlement = chat.apply_run_result(ticket.send_id, run_ok(Some("Done"), "r1"));
        assert!(matches!(settlement, RunSettlement::Reconcile { ref project_id, .. } if project_id == "p1"));
        let shown: Vec<_> = chat
            .entries()
            .map(|entry| (entry.role, entry.text.as_str()))
            .collect();
        assert_eq!(
            shown,
            vec![(ChatRole::User, "Hello"), (ChatRole::Assistant, "Done")]
        );
    }

    #[test]
    fn settled_entries_of_other_projects_are_forgotten_on_switch() {
        let mut chat = loaded("p1");
        let ticket = chat.begin_send(Some("p1"), Some("dev"), "Hello").unwrap();
        chat.apply_run_result(ticket.send_id, Err("HTTP 502".into()));
        assert_eq!(chat.pending().len(), 1);

        chat.begin_load(Some("p2"));
        assert!(chat.pending().is_empty());
        assert!(!chat.is_sending());
    }
}
