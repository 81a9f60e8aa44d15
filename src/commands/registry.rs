use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&App, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "agents",
        usage: "/agents",
        help: "List the roster; the active agent is marked.",
        handler: super::handle_agents,
    },
    Command {
        name: "agent",
        usage: "/agent <id>",
        help: "Talk to another agent.",
        handler: super::handle_agent,
    },
    Command {
        name: "projects",
        usage: "/projects",
        help: "List projects; the active project is marked.",
        handler: super::handle_projects,
    },
    Command {
        name: "project",
        usage: "/project <id>",
        help: "Switch to another project.",
        handler: super::handle_project,
    },
    Command {
        name: "new",
        usage: "/new <name>",
        help: "Create a project.",
        handler: super::handle_new,
    },
    Command {
        name: "delete",
        usage: "/delete [id]",
        help: "Stage the active (or given) project for deletion.",
        handler: super::handle_delete,
    },
    Command {
        name: "confirm",
        usage: "/confirm",
        help: "Delete the staged project.",
        handler: super::handle_confirm,
    },
    Command {
        name: "cancel",
        usage: "/cancel",
        help: "Keep the staged project.",
        handler: super::handle_cancel,
    },
    Command {
        name: "reload",
        usage: "/reload",
        help: "Reload the roster, the projects and the chat log.",
        handler: super::handle_reload,
    },
    Command {
        name: "profile",
        usage: "/profile [reload]",
        help: "Show the active agent's profile, or fetch it again.",
        handler: super::handle_profile,
    },
    Command {
        name: "status",
        usage: "/status",
        help: "Show session, connectivity and load states.",
        handler: super::handle_status,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Leave the shell.",
        handler: super::handle_quit,
    },
];
