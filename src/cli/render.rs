//! Plain-text views of the state container.

use crate::api::{ChatEntry, ChatRole};
use crate::core::app::App;
use crate::core::loadable::Loadable;
use crate::core::projects::ProjectMutation;

fn load_summary<T>(name: &str, loadable: &Loadable<T>) -> String {
    match loadable.error() {
        Some(error) => format!("  {name}: {} ({error})", loadable.status().label()),
        None => format!("  {name}: {}", loadable.status().label()),
    }
}

pub fn agent_lines(app: &App) -> Vec<String> {
    let active = app.agents.active_agent_id();
    let mut lines = vec!["Agents:".to_string()];
    for agent in app.agents.agents() {
        let marker = if Some(agent.id.as_str()) == active {
            '*'
        } else {
            ' '
        };
        lines.push(format!("{marker} {:<14} {}", agent.id, agent.name));
    }
    if let Some(error) = app.agents.roster.error() {
        lines.push(format!("  (roster failed: {error}; showing defaults)"));
    }
    lines
}

pub fn project_lines(app: &App) -> Vec<String> {
    if app.projects.connected() == Some(false) {
        let mut lines = vec!["Storage is not connected; no projects available.".to_string()];
        if let Some(error) = app.projects.projects.error() {
            lines.push(format!("  ({error})"));
        }
        return lines;
    }

    let active = app.projects.active_project_id();
    let mut lines = vec!["Projects:".to_string()];
    if app.projects.list().is_empty() {
        lines.push("  (none yet; /new <name> creates one)".to_string());
    }
    for project in app.projects.list() {
        let marker = if Some(project.id.as_str()) == active {
            '*'
        } else {
            ' '
        };
        lines.push(format!("{marker} {:<14} {}", project.id, project.name));
    }
    if let Some(error) = app.projects.projects.error() {
        lines.push(format!("  (index failed: {error})"));
    }
    if let Some(project) = app.projects.pending_delete() {
        lines.push(format!(
            "  '{}' is staged for deletion: /confirm or /cancel",
            project.name
        ));
    }
    match app.projects.mutation_in_flight() {
        Some(ProjectMutation::Create) => lines.push("  (creating project...)".to_string()),
        Some(ProjectMutation::Delete) => lines.push("  (deleting project...)".to_string()),
        None => {}
    }
    if let Some(error) = app.projects.mutation_error() {
        lines.push(format!("  (last change failed: {error})"));
    }
    lines
}

pub fn profile_lines(app: &App) -> Vec<String> {
    let Some(agent) = app.agents.active_agent() else {
        return vec!["No active agent.".to_string()];
    };
    let mut lines = vec![format!("Profile for {} ({}):", agent.name, agent.id)];
    match app.agents.profile.data() {
        Some(profile) => {
            lines.push(format!(
                "  Name: {}",
                profile.parsed_name.as_deref().unwrap_or("-")
            ));
            lines.push(format!(
                "  Role: {}",
                profile.parsed_role.as_deref().unwrap_or("-")
            ));
            if !profile.raw_content.trim().is_empty() {
                lines.push(String::new());
                lines.extend(profile.raw_content.lines().map(|line| format!("  {line}")));
            }
        }
        None => lines.push(load_summary("profile", &app.agents.profile)),
    }
    lines
}

pub fn status_lines(app: &App) -> Vec<String> {
    let session = if app.session.is_checking() {
        "checking".to_string()
    } else if app.session.login.is_busy() {
        format!("signing in as {}", app.session.login.email)
    } else if app.session.is_authenticated() {
        format!(
            "signed in as {}",
            app.session.email().unwrap_or("(unknown email)")
        )
    } else {
        "signed out".to_string()
    };
    let connected = match app.projects.connected() {
        None => "unknown",
        Some(true) => "connected",
        Some(false) => "not connected",
    };

    let mut lines = vec![
        format!("Session: {session}"),
        format!("Storage: {connected}"),
        format!(
            "Active: project {} / agent {}",
            app.projects.active_project_id().unwrap_or("-"),
            app.agents.active_agent_id().unwrap_or("-")
        ),
        load_summary("roster", &app.agents.roster),
        load_summary("profile", &app.agents.profile),
        load_summary("projects", &app.projects.projects),
        load_summary("chat", &app.chat.log),
    ];
    if app.chat.is_sending() {
        lines.push("  run in progress".to_string());
    }
    if let Some(error) = app.chat.send_error() {
        lines.push(format!("  last run failed: {error}"));
    }
    lines
}

pub fn message_line(app: &App, entry: &ChatEntry) -> String {
    let speaker = match entry.role {
        ChatRole::User => "you".to_string(),
        ChatRole::Assistant => app
            .agents
            .agents()
            .iter()
            .find(|agent| agent.id == entry.agent_id)
            .map(|agent| agent.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| entry.agent_id.clone()),
    };
    format!("[{}] {speaker}: {}", entry.ts.format("%H:%M"), entry.text)
}

pub fn message_lines(app: &App) -> Vec<String> {
    app.visible_messages()
        .iter()
        .map(|entry| message_line(app, entry))
        .collect()
}
