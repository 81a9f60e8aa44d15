//! Opening the session gate from the terminal.

use std::error::Error;

use super::prompt::Prompt;
use crate::core::app::{App, AppAction};
use crate::desk_loop::DeskLoop;

/// Checks the session and, when signed out, asks for credentials until the
/// service accepts them. Returns `false` when input ends first. Once the gate
/// opens the roster, the index and the first chat log are loaded.
pub async fn sign_in(
    app: &mut App,
    desk: &mut DeskLoop,
    prompt: &mut Prompt,
    email: Option<String>,
) -> Result<bool, Box<dyn Error>> {
    desk.apply(app, AppAction::CheckSession);
    desk.run_until_idle(app).await;

    if let Some(email) = email.filter(|email| !email.trim().is_empty()) {
        app.session.login.email = email;
    }

    while !app.session.is_authenticated() {
        let default_email = app.session.login.email.clone();
        let Some(email) = prompt.ask_with_default("Email", &default_email).await? else {
            return Ok(false);
        };
        let Some(password) = prompt.ask("Password: ").await? else {
            return Ok(false);
        };

        desk.apply(app, AppAction::SubmitLogin { email, password });
        desk.run_until_idle(app).await;
        if let Some(status) = app.status.take() {
            println!("{status}");
        }
    }
    Ok(true)
}

/// Non-interactive variant for one-shot commands: a single login attempt,
/// with the password read from the next stdin line.
pub async fn sign_in_once(
    app: &mut App,
    desk: &mut DeskLoop,
    prompt: &mut Prompt,
    email: Option<String>,
) -> Result<(), Box<dyn Error>> {
    desk.apply(app, AppAction::CheckSession);
    desk.run_until_idle(app).await;
    if app.session.is_authenticated() {
        return Ok(());
    }

    let email = email
        .filter(|email| !email.trim().is_empty())
        .unwrap_or_else(|| app.session.login.email.clone());
    if email.trim().is_empty() {
        return Err("Not signed in: pass --email or set login-email in the config".into());
    }
    let password = prompt
        .ask(&format!("Password for {email}: "))
        .await?
        .ok_or("Not signed in: no password given")?;

    desk.apply(app, AppAction::SubmitLogin { email, password });
    desk.run_until_idle(app).await;
    if app.session.is_authenticated() {
        app.status = None;
        Ok(())
    } else {
        let reason = app
            .session
            .login
            .error()
            .map(str::to_string)
            .or_else(|| app.status.take())
            .unwrap_or_else(|| "Login failed".to_string());
        Err(reason.into())
    }
}
