//! Agent roster and the profile document of the active agent.

use tracing::{debug, info, warn};

use crate::api::{Agent, AgentProfileResponse};
use crate::core::loadable::Loadable;
use crate::core::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    pub agent: Agent,
    pub raw_content: String,
    pub parsed_name: Option<String>,
    pub parsed_role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileFields {
    pub name: Option<String>,
    pub role: Option<String>,
}

fn labeled_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let line = line.trim_start();
    let head = line.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = &line[label.len()..];
    rest.strip_prefix(':').map(str::trim)
}

/// Pulls the first `Name:` and `Role:` lines out of a freeform profile.
/// Labels match case-insensitively; values are trimmed.
pub fn parse_profile(content: &str) -> ProfileFields {
    let mut fields = ProfileFields::default();
    for line in content.lines() {
        if fields.name.is_none() {
            if let Some(value) = labeled_value(line, "name") {
                fields.name = Some(value.to_string());
                continue;
            }
        }
        if fields.role.is_none() {
            if let Some(value) = labeled_value(line, "role") {
                fields.role = Some(value.to_string());
            }
        }
        if fields.name.is_some() && fields.role.is_some() {
            break;
        }
    }
    fields
}

impl AgentProfile {
    pub fn from_response(requested: &Agent, response: AgentProfileResponse) -> Self {
        let fields = parse_profile(&response.content);
        let agent = response
            .agent
            .filter(|agent| agent.id == requested.id)
            .map(|agent| Agent {
                name: if agent.name.is_empty() {
                    requested.name.clone()
                } else {
                    agent.name
                },
                ..agent
            })
            .unwrap_or_else(|| requested.clone());
        Self {
            agent,
            raw_content: response.content,
            parsed_name: fields.name,
            parsed_role: fields.role,
        }
    }
}

/// A profile fetch the caller should issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRequest {
    pub agent_id: String,
    pub generation: u64,
}

#[derive(Debug)]
pub struct AgentStore {
    default_roster: Vec<Agent>,
    pub roster: Loadable<Vec<Agent>>,
    active_agent_id: Option<String>,
    pub profile: Loadable<AgentProfile>,
    profile_agent_id: Option<String>,
}

impl AgentStore {
    /// `default_roster` stands in whenever the service returns no agents.
    pub fn new(default_roster: Vec<Agent>) -> Self {
        let active_agent_id = default_roster.first().map(|agent| agent.id.clone());
        Self {
            default_roster,
            roster: Loadable::new(),
            active_agent_id,
            profile: Loadable::new(),
            profile_agent_id: None,
        }
    }

    /// The loaded roster, or the default one before anything has loaded.
    pub fn agents(&self) -> &[Agent] {
        self.roster
            .data()
            .map(Vec::as_slice)
            .unwrap_or(&self.default_roster)
    }

    pub fn active_agent_id(&self) -> Option<&str> {
        self.active_agent_id.as_deref()
    }

    pub fn active_agent(&self) -> Option<&Agent> {
        let id = self.active_agent_id.as_deref()?;
        self.agents().iter().find(|agent| agent.id == id)
    }

    pub fn begin_roster_load(&mut self) -> u64 {
        self.roster.begin()
    }

    /// Installs a roster result, substituting the default roster when the
    /// fetch failed or came back empty, and re-derives the active agent.
    /// Returns the profile fetch to issue when the active agent's profile is
    /// not already loaded or loading.
    pub fn apply_roster(
        &mut self,
        generation: u64,
        result: Result<Vec<Agent>, String>,
    ) -> Option<ProfileRequest> {
        let applied = match result {
            Ok(agents) if !agents.is_empty() => {
                info!(count = agents.len(), "agent roster loaded");
                self.roster.finish(generation, Ok(agents))
            }
            Ok(_) => {
                info!("agent roster empty; using defaults");
                self.roster.finish(generation, Ok(self.default_roster.clone()))
            }
            Err(message) => {
                warn!(error = %message, "agent roster failed; using defaults");
                self.roster
                    .recover(generation, self.default_roster.clone(), message)
            }
        };
        if !applied {
            return None;
        }

        self.reconcile_active();
        self.profile_request_if_needed()
    }

    fn reconcile_active(&mut self) {
        let agents = self.agents();
        let still_present = self
            .active_agent_id
            .as_deref()
            .is_some_and(|id| agents.iter().any(|agent| agent.id == id));
        if still_present {
            return;
        }
        let fallback = agents.first().map(|agent| agent.id.clone());
        debug!(
            previous = ?self.active_agent_id,
            next = ?fallback,
            "active agent not in roster; falling back"
        );
        self.active_agent_id = fallback;
    }

    fn profile_request_if_needed(&mut self) -> Option<ProfileRequest> {
        let active = self.active_agent_id.clone()?;
        if self.profile_agent_id.as_deref() == Some(active.as_str()) {
            return None;
        }
        Some(self.begin_profile_load_for(active))
    }

    fn begin_profile_load_for(&mut self, agent_id: String) -> ProfileRequest {
        if self.profile_agent_id.as_deref() != Some(agent_id.as_str()) {
            self.profile.clear_data();
        }
        self.profile_agent_id = Some(agent_id.clone());
        let generation = self.profile.begin();
        ProfileRequest {
            agent_id,
            generation,
        }
    }

    /// Switches the active agent. Selecting the already active agent is a
    /// no-op; any other valid choice starts exactly one profile fetch.
    pub fn select_agent(
        &mut self,
        agent_id: &str,
    ) -> Result<Option<ProfileRequest>, ValidationError> {
        if !self.agents().iter().any(|agent| agent.id == agent_id) {
            return Err(ValidationError::UnknownAgent(agent_id.to_string()));
        }
        if self.active_agent_id.as_deref() == Some(agent_id) {
            return Ok(None);
        }
        info!(agent = agent_id, "active agent changed");
        self.active_agent_id = Some(agent_id.to_string());
        Ok(Some(self.begin_profile_load_for(agent_id.to_string())))
    }

    /// Re-fetches the active agent's profile.
    pub fn reload_profile(&mut self) -> Option<ProfileRequest> {
        let active = self.active_agent_id.clone()?;
        Some(self.begin_profile_load_for(active))
    }

    /// Applies a profile fetch. Results for an agent that is no longer active,
    /// or from a superseded fetch, are dropped.
    pub fn apply_profile(
        &mut self,
        agent_id: &str,
        generation: u64,
        result: Result<AgentProfileResponse, String>,
    ) -> bool {
        if self.active_agent_id.as_deref() != Some(agent_id) {
            debug!(agent = agent_id, "discarding profile for inactive agent");
            return false;
        }
        match result {
            Ok(response) => {
                let requested = self
                    .active_agent()
                    .cloned()
                    .unwrap_or_else(|| Agent::new(agent_id, agent_id));
                let profile = AgentProfile::from_response(&requested, response);
                self.profile.finish(generation, Ok(profile))
            }
            Err(message) => {
                if !self.profile.is_current(generation) {
                    return false;
                }
                self.profile.clear_data();
                self.profile.finish(generation, Err(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loadable::LoadStatus;

    fn roster(ids: &[&str]) -> Vec<Agent> {
        ids.iter().map(|id| Agent::new(*id, id.to_uppercase())).collect()
    }

    fn profile_response(id: &str, content: &str) -> AgentProfileResponse {
        AgentProfileResponse {
            agent: Some(Agent::new(id, "")),
            content: content.to_string(),
        }
    }

    #[test]
    fn parse_profile_reads_labeled_lines() {
        let fields = parse_profile("Name: Bob\nRole: QA");
        assert_eq!(fields.name.as_deref(), Some("Bob"));
        assert_eq!(fields.role.as_deref(), Some("QA"));
    }

    #[test]
    fn parse_profile_without_labels_is_empty() {
        assert_eq!(
            parse_profile("# Developer\nWrites code all day."),
            ProfileFields::default()
        );
        assert_eq!(parse_profile(""), ProfileFields::default());
    }

    #[test]
    fn parse_profile_is_case_insensitive_and_takes_first_match() {
        let fields = parse_profile("intro\nNAME:  Alice  \nrole: Lead: Platform\nName: Ignored");
        assert_eq!(fields.name.as_deref(), Some("Alice"));
        assert_eq!(fields.role.as_deref(), Some("Lead: Platform"));
    }

    #[test]
    fn parse_profile_requires_colon_after_label() {
        let fields = parse_profile("Names are hard\nRoles: many\nname: Zed");
        assert_eq!(fields.name.as_deref(), Some("Zed"));
        assert!(fields.role.is_none());
    }

    #[test]
    fn empty_or_failed_roster_uses_defaults() {
        let mut store = AgentStore::new(roster(&["orchestrator", "dev"]));
        let generation = store.begin_roster_load();
        store.apply_roster(generation, Ok(Vec::new()));
        assert_eq!(store.agents(), roster(&["orchestrator", "dev"]).as_slice());
        assert_eq!(store.roster.status(), LoadStatus::Success);

        let generation = store.begin_roster_load();
        store.apply_roster(generation, Err("HTTP 503".into()));
        assert_eq!(store.agents(), roster(&["orchestrator", "dev"]).as_slice());
        assert_eq!(store.roster.error(), Some("HTTP 503"));
    }

    #[test]
    fn active_agent_falls_back_to_first_of_new_roster() {
        let mut store = AgentStore::new(roster(&["orchestrator"]));
        let generation = store.begin_roster_load();
        store.apply_roster(generation, Ok(roster(&["pm", "dev"])));
        assert_eq!(store.active_agent_id(), Some("pm"));

        store.select_agent("dev").unwrap();
        let generation = store.begin_roster_load();
        store.apply_roster(generation, Ok(roster(&["dev", "qa"])));
        assert_eq!(store.active_agent_id(), Some("dev"));

        let generation = store.begin_roster_load();
        store.apply_roster(generation, Ok(roster(&["qa", "devops"])));
        assert_eq!(store.active_agent_id(), Some("qa"));

        let generation = store.begin_roster_load();
        store.apply_roster(generation, Ok(Vec::new()));
        assert_eq!(store.active_agent_id(), Some("orchestrator"));
    }

    #[test]
    fn roster_load_requests_profile_once() {
        let mut store = AgentStore::new(roster(&["orchestrator"]));
        let generation = store.begin_roster_load();
        let request = store
            .apply_roster(generation, Ok(roster(&["orchestrator", "dev"])))
            .expect("profile requested for initial agent");
        assert_eq!(request.agent_id, "orchestrator");

        let generation = store.begin_roster_load();
        assert!(store
            .apply_roster(generation, Ok(roster(&["orchestrator", "dev"])))
            .is_none());
    }

    #[test]
    fn selecting_agents_starts_one_profile_load_each() {
        let mut store = AgentStore::new(roster(&["a", "b"]));
        assert_eq!(store.select_agent("a"), Ok(None));

        let request = store.select_agent("b").unwrap().expect("profile load");
        assert_eq!(request.agent_id, "b");
        assert!(store.profile.is_loading());
        assert_eq!(
            store.select_agent("zzz"),
            Err(ValidationError::UnknownAgent("zzz".into()))
        );
    }

    #[test]
    fn stale_profile_cannot_overwrite_new_agent() {
        let mut store = AgentStore::new(roster(&["a", "b"]));
        let for_b = store.select_agent("b").unwrap().unwrap();
        let for_a = store.select_agent("a").unwrap().unwrap();

        assert!(!store.apply_profile(
            &for_b.agent_id,
            for_b.generation,
            Ok(profile_response("b", "Name: Bee"))
        ));
        assert!(store.profile.data().is_none());

        assert!(store.apply_profile(
            &for_a.agent_id,
            for_a.generation,
            Ok(profile_response("a", "Name: Ay\nRole: PM"))
        ));
        let profile = store.profile.data().expect("profile installed");
        assert_eq!(profile.agent.id, "a");
        assert_eq!(profile.agent.name, "A");
        assert_eq!(profile.parsed_name.as_deref(), Some("Ay"));
        assert_eq!(profile.parsed_role.as_deref(), Some("PM"));
    }

    #[test]
    fn switching_back_and_forth_fences_by_generation() {
        let mut store = AgentStore::new(roster(&["a", "b"]));
        let first_b = store.select_agent("b").unwrap().unwrap();
        store.select_agent("a").unwrap();
        let second_b = store.select_agent("b").unwrap().unwrap();

        assert!(!store.apply_profile("b", first_b.generation, Ok(profile_response("b", "old"))));
        assert!(store.apply_profile("b", second_b.generation, Ok(profile_response("b", "new"))));
        assert_eq!(store.profile.data().unwrap().raw_content, "new");
    }

    #[test]
    fn failed_profile_clears_previous_profile() {
        let mut store = AgentStore::new(roster(&["a"]));
        let request = store.reload_profile().unwrap();
        store.apply_profile("a", request.generation, Ok(profile_response("a", "Role: PM")));
        assert!(store.profile.data().is_some());

        let request = store.reload_profile().unwrap();
        assert!(store.apply_profile("a", request.generation, Err("HTTP 404".into())));
        assert!(store.profile.data().is_none());
        assert_eq!(store.profile.error(), Some("HTTP 404"));
    }
}
