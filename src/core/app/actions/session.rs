use tracing::info;

use super::{App, AppAction, AppCommand};
use crate::core::session::GateTransition;

pub(super) fn handle_session_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::CheckSession => vec![begin_check(app)],
        AppAction::SessionChecked {
            generation,
            session,
        } => match app.session.apply_check(generation, session) {
            GateTransition::SignedIn => open_workspace(app),
            GateTransition::SignedOut => {
                info!("session ended");
                app.chat.begin_load(None);
                app.set_status("Signed out");
                Vec::new()
            }
            GateTransition::Unchanged => Vec::new(),
        },
        AppAction::SubmitLogin { email, password } => {
            match app.session.begin_login(&email, &password) {
                Ok(()) => vec![AppCommand::Login { email, password }],
                Err(err) => {
                    app.set_status(err.to_string());
                    Vec::new()
                }
            }
        }
        AppAction::LoginFinished { result } => {
            if app.session.finish_login(result) {
                info!("credentials accepted; re-checking session");
                vec![begin_check(app)]
            } else {
                let message = app.session.login.error().unwrap_or("Login failed").to_string();
                app.set_status(message);
                Vec::new()
            }
        }
        _ => unreachable!("non-session action routed to session handler"),
    }
}

fn begin_check(app: &mut App) -> AppCommand {
    AppCommand::CheckSession {
        generation: app.session.begin_check(),
    }
}

/// Roster and project index load independently and in parallel.
fn open_workspace(app: &mut App) -> Vec<AppCommand> {
    let email = app.session.email().unwrap_or("unknown").to_string();
    info!(%email, "signed in");
    app.set_status(format!("Signed in as {email}"));
    vec![
        AppCommand::FetchAgents {
            generation: app.agents.begin_roster_load(),
        },
        AppCommand::CheckConnectivity {
            generation: app.projects.begin_load(),
        },
    ]
}
