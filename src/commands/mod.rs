//! Slash commands understood by the interactive shell.

mod registry;

pub use registry::{all_commands, find_command, CommandInvocation};

use crate::cli::render::{agent_lines, profile_lines, project_lines, status_lines};
use crate::core::app::{App, AppAction};

#[derive(Debug)]
pub enum CommandResult {
    Print(Vec<String>),
    Dispatch(Vec<AppAction>),
    ProcessAsMessage(String),
    Quit,
}

pub fn process_input(app: &App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        let invocation = CommandInvocation { args };
        (command.handler)(app, invocation)
    } else {
        CommandResult::Print(vec![format!(
            "Unknown command /{command_name}. Try /help."
        )])
    }
}

fn usage(name: &str) -> CommandResult {
    let usage = find_command(name)
        .map(|command| command.usage)
        .unwrap_or_default();
    CommandResult::Print(vec![format!("Usage: {usage}")])
}

pub(super) fn handle_help(_app: &App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut lines = vec!["Commands:".to_string()];
    for command in all_commands() {
        lines.push(format!("  {:<18} {}", command.usage, command.help));
    }
    lines.push("Anything else is sent to the active agent.".to_string());
    CommandResult::Print(lines)
}

pub(super) fn handle_agents(app: &App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Print(agent_lines(app))
}

pub(super) fn handle_agent(_app: &App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return usage("agent");
    }
    CommandResult::Dispatch(vec![AppAction::SelectAgent {
        agent_id: invocation.args.to_string(),
    }])
}

pub(super) fn handle_projects(app: &App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Print(project_lines(app))
}

pub(super) fn handle_project(_app: &App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return usage("project");
    }
    CommandResult::Dispatch(vec![AppAction::SelectProject {
        project_id: invocation.args.to_string(),
    }])
}

pub(super) fn handle_new(_app: &App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return usage("new");
    }
    CommandResult::Dispatch(vec![AppAction::CreateProject {
        name: invocation.args.to_string(),
    }])
}

pub(super) fn handle_delete(_app: &App, invocation: CommandInvocation<'_>) -> CommandResult {
    let project_id = Some(invocation.args)
        .filter(|args| !args.is_empty())
        .map(str::to_string);
    CommandResult::Dispatch(vec![AppAction::RequestDeleteProject { project_id }])
}

pub(super) fn handle_confirm(_app: &App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Dispatch(vec![AppAction::ConfirmDeleteProject])
}

pub(super) fn handle_cancel(_app: &App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Dispatch(vec![AppAction::CancelDeleteProject])
}

pub(super) fn handle_reload(_app: &App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Dispatch(vec![
        AppAction::LoadAgents,
        AppAction::ReloadChat,
        AppAction::LoadProjects,
    ])
}

pub(super) fn handle_profile(app: &App, invocation: CommandInvocation<'_>) -> CommandResult {
    match invocation.args {
        "" => CommandResult::Print(profile_lines(app)),
        arg if arg.eq_ignore_ascii_case("reload") => {
            CommandResult::Dispatch(vec![AppAction::ReloadProfile])
        }
        _ => usage("profile"),
    }
}

pub(super) fn handle_status(app: &App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Print(status_lines(app))
}

pub(super) fn handle_quit(_app: &App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}
