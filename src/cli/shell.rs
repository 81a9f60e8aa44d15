//! Interactive line shell.
//!
//! Input and completions are multiplexed on one task: while a run is in
//! flight the user can keep typing, switch projects or agents, and every
//! completion is applied as it arrives.

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

use tracing::info;

use super::prompt::Prompt;
use super::render::message_line;
use super::session::sign_in;
use crate::api::{ChatRole, WorkspaceBackend};
use crate::commands::{process_input, CommandResult};
use crate::core::app::{App, AppAction};
use crate::core::config::Config;
use crate::desk_loop::DeskLoop;

/// What was last printed, so only changes are printed again.
#[derive(Default)]
struct ShellView {
    heading: Option<(Option<String>, Option<String>)>,
    shown: Vec<(ChatRole, String, String)>,
}

impl ShellView {
    fn refresh(&mut self, app: &mut App) {
        if let Some(status) = app.status.take() {
            println!("-- {status}");
        }
        if !app.session.is_authenticated() {
            return;
        }

        let heading = (
            app.projects.active_project_id().map(str::to_string),
            app.agents.active_agent_id().map(str::to_string),
        );
        let messages = app.visible_messages();
        let keys: Vec<(ChatRole, String, String)> = messages
            .iter()
            .map(|entry| (entry.role, entry.agent_id.clone(), entry.text.clone()))
            .collect();

        if self.heading.as_ref() != Some(&heading) || !keys.starts_with(&self.shown) {
            println!(
                "== project {} / agent {} ==",
                heading.0.as_deref().unwrap_or("(none)"),
                heading.1.as_deref().unwrap_or("(none)")
            );
            for entry in &messages {
                println!("{}", message_line(app, entry));
            }
        } else {
            for entry in &messages[self.shown.len()..] {
                println!("{}", message_line(app, entry));
            }
        }
        self.heading = Some(heading);
        self.shown = keys;
    }
}

fn prompt_label(app: &App) -> String {
    format!(
        "{}/{}> ",
        app.projects.active_project_id().unwrap_or("-"),
        app.agents.active_agent_id().unwrap_or("-")
    )
}

pub async fn run_shell(
    backend: Arc<dyn WorkspaceBackend>,
    config: &Config,
    email: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut app = App::from_config(config);
    let mut desk = DeskLoop::new(backend);
    let mut prompt = Prompt::stdin();

    if !sign_in(&mut app, &mut desk, &mut prompt, email).await? {
        return Ok(());
    }
    println!("Type /help for commands; anything else goes to the active agent.");

    let mut view = ShellView::default();
    view.refresh(&mut app);
    print!("{}", prompt_label(&app));
    io::stdout().flush()?;

    loop {
        tokio::select! {
            line = prompt.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    print!("{}", prompt_label(&app));
                    io::stdout().flush()?;
                    continue;
                }
                match process_input(&app, &line) {
                    CommandResult::Print(lines) => {
                        for line in lines {
                            println!("{line}");
                        }
                    }
                    CommandResult::Dispatch(actions) => {
                        for action in actions {
                            desk.apply(&mut app, action);
                        }
                    }
                    CommandResult::ProcessAsMessage(text) => {
                        desk.apply(&mut app, AppAction::SubmitMessage { text });
                    }
                    CommandResult::Quit => {
                        desk.apply(&mut app, AppAction::Quit);
                    }
                }
            }
            applied = desk.apply_next_completion(&mut app), if !desk.is_idle() => {
                if !applied {
                    continue;
                }
            }
        }

        if app.exit_requested {
            break;
        }
        desk.drain_action_queue(&mut app);
        view.refresh(&mut app);
        print!("{}", prompt_label(&app));
        io::stdout().flush()?;
    }

    if !desk.is_idle() {
        info!(in_flight = desk.in_flight(), "abandoning requests on exit");
    }
    desk.shutdown();
    Ok(())
}
