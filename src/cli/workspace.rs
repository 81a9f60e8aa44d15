//! One-shot subcommands: sign in, do one thing, print the result.

use std::error::Error;
use std::sync::Arc;

use super::prompt::Prompt;
use super::render::{agent_lines, message_lines, profile_lines, project_lines, status_lines};
use super::session::sign_in_once;
use super::Commands;
use crate::api::WorkspaceBackend;
use crate::core::app::{App, AppAction};
use crate::core::config::Config;
use crate::desk_loop::DeskLoop;

pub async fn run(
    backend: Arc<dyn WorkspaceBackend>,
    config: &Config,
    email: Option<String>,
    command: Commands,
) -> Result<(), Box<dyn Error>> {
    let mut app = App::from_config(config);
    let mut desk = DeskLoop::new(backend);
    let mut prompt = Prompt::stdin();

    sign_in_once(&mut app, &mut desk, &mut prompt, email).await?;
    let lines = execute(&mut app, &mut desk, command).await?;
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

async fn apply_all(app: &mut App, desk: &mut DeskLoop, actions: Vec<AppAction>) {
    for action in actions {
        desk.apply(app, action);
    }
    desk.run_until_idle(app).await;
}

/// Turns whatever the last action left in the status line into an error.
fn fail_with_status(app: &mut App, fallback: &str) -> Box<dyn Error> {
    app.status
        .take()
        .unwrap_or_else(|| fallback.to_string())
        .into()
}

fn ensure_project(app: &mut App, project_id: &str) -> Result<(), Box<dyn Error>> {
    if app.projects.active_project_id() == Some(project_id) {
        Ok(())
    } else {
        Err(fail_with_status(
            app,
            &format!("Unknown project: {project_id}"),
        ))
    }
}

fn ensure_agent(app: &mut App, agent_id: &str) -> Result<(), Box<dyn Error>> {
    if app.agents.active_agent_id() == Some(agent_id) {
        Ok(())
    } else {
        Err(fail_with_status(app, &format!("Unknown agent: {agent_id}")))
    }
}

/// Runs one subcommand against a signed-in workspace.
pub async fn execute(
    app: &mut App,
    desk: &mut DeskLoop,
    command: Commands,
) -> Result<Vec<String>, Box<dyn Error>> {
    let lines = match command {
        Commands::Status => status_lines(app),
        Commands::Login => {
            vec![format!(
                "Signed in as {}",
                app.session.email().unwrap_or("(unknown email)")
            )]
        }
        Commands::Agents => agent_lines(app),
        Commands::Profile { agent } => {
            apply_all(app, desk, vec![AppAction::SelectAgent { agent_id: agent.clone() }]).await;
            ensure_agent(app, &agent)?;
            if let Some(error) = app.agents.profile.error() {
                return Err(error.to_string().into());
            }
            profile_lines(app)
        }
        Commands::Projects => project_lines(app),
        Commands::Create { name } => {
            app.status = None;
            apply_all(app, desk, vec![AppAction::CreateProject { name: name.join(" ") }]).await;
            if let Some(error) = app.projects.mutation_error() {
                return Err(format!("Create failed: {error}").into());
            }
            if app.status.as_deref() != Some("Project created") {
                return Err(fail_with_status(app, "Create failed"));
            }
            let mut lines = vec!["Project created".to_string()];
            lines.extend(project_lines(app));
            lines
        }
        Commands::Delete { id, yes } => {
            if !yes {
                return Err(format!("Refusing to delete {id} without --yes").into());
            }
            apply_all(
                app,
                desk,
                vec![
                    AppAction::RequestDeleteProject {
                        project_id: Some(id.clone()),
                    },
                    AppAction::ConfirmDeleteProject,
                ],
            )
            .await;
            if let Some(error) = app.projects.mutation_error() {
                return Err(format!("Delete failed: {error}").into());
            }
            if app.projects.list().iter().any(|project| project.id == id) {
                return Err(fail_with_status(app, "Delete failed"));
            }
            let mut lines = vec![format!("Deleted {id}")];
            lines.extend(project_lines(app));
            lines
        }
        Commands::Chat { project, agent } => {
            let mut actions = vec![AppAction::SelectProject {
                project_id: project.clone(),
            }];
            if let Some(agent) = &agent {
                actions.push(AppAction::SelectAgent {
                    agent_id: agent.clone(),
                });
            }
            apply_all(app, desk, actions).await;
            ensure_project(app, &project)?;
            if let Some(agent) = &agent {
                ensure_agent(app, agent)?;
            }
            if let Some(error) = app.chat.log.error() {
                return Err(format!("Chat log failed: {error}").into());
            }
            message_lines(app)
        }
        Commands::Send {
            project,
            agent,
            message,
        } => {
            apply_all(
                app,
                desk,
                vec![
                    AppAction::SelectProject {
                        project_id: project.clone(),
                    },
                    AppAction::SelectAgent {
                        agent_id: agent.clone(),
                    },
                ],
            )
            .await;
            ensure_project(app, &project)?;
            ensure_agent(app, &agent)?;

            let text = message.join(" ");
            if text.trim().is_empty() {
                return Err("Message is empty".into());
            }
            app.status = None;
            apply_all(app, desk, vec![AppAction::SubmitMessage { text }]).await;
            if let Some(error) = app.chat.send_error() {
                return Err(format!("Run failed: {error}").into());
            }
            message_lines(app)
        }
        Commands::Shell | Commands::Config { .. } | Commands::ConnectUrl { .. } => {
            return Err("not a workspace command".into());
        }
    };
    Ok(lines)
}
