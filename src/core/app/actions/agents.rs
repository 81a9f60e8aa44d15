use super::{require_workspace, App, AppAction, AppCommand};

pub(super) fn handle_agent_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::LoadAgents => {
            if !require_workspace(app) {
                return Vec::new();
            }
            vec![AppCommand::FetchAgents {
                generation: app.agents.begin_roster_load(),
            }]
        }
        AppAction::AgentsLoaded { generation, result } => app
            .agents
            .apply_roster(generation, result)
            .map(AppCommand::FetchAgentProfile)
            .into_iter()
            .collect(),
        AppAction::SelectAgent { agent_id } => match app.agents.select_agent(&agent_id) {
            Ok(request) => request.map(AppCommand::FetchAgentProfile).into_iter().collect(),
            Err(err) => {
                app.set_status(err.to_string());
                Vec::new()
            }
        },
        AppAction::ReloadProfile => {
            if !require_workspace(app) {
                return Vec::new();
            }
            app.agents
                .reload_profile()
                .map(AppCommand::FetchAgentProfile)
                .into_iter()
                .collect()
        }
        AppAction::AgentProfileLoaded {
            agent_id,
            generation,
            result,
        } => {
            app.agents.apply_profile(&agent_id, generation, result);
            Vec::new()
        }
        _ => unreachable!("non-agent action routed to agent handler"),
    }
}
