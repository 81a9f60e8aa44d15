use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::api::{Agent, ChatRole, Project};
use crate::utils::test_utils::{create_test_app, entry, FakeBackend};

fn signed_in_backend() -> FakeBackend {
    let backend = FakeBackend::new();
    backend.set_session(true, Some("ops@example.com"));
    backend.set_agents(vec![Agent::new("dev", "Developer"), Agent::new("qa", "QA")]);
    backend.set_profile("dev", "Name: Dana\nRole: Developer");
    backend.set_profile("qa", "Name: Quinn\nRole: Reviewer");
    backend.set_projects(vec![
        Project::new("p1", "Alpha"),
        Project::new("p2", "Beta"),
    ]);
    backend
}

async fn started(backend: &FakeBackend) -> (App, DeskLoop) {
    let mut app = create_test_app();
    let mut desk = DeskLoop::new(Arc::new(backend.clone()));
    desk.apply(&mut app, AppAction::CheckSession);
    desk.run_until_idle(&mut app).await;
    (app, desk)
}

#[tokio::test]
async fn startup_loads_the_whole_workspace() {
    let backend = signed_in_backend();
    backend.set_log(
        "p1",
        vec![entry("p1", "dev", ChatRole::User, "earlier", 1)],
    );

    let (app, desk) = started(&backend).await;

    assert!(desk.is_idle());
    assert!(app.session.is_authenticated());
    assert_eq!(app.agents.active_agent_id(), Some("dev"));
    let profile = app.agents.profile.data().expect("profile loaded");
    assert_eq!(profile.parsed_role.as_deref(), Some("Developer"));
    assert_eq!(app.projects.active_project_id(), Some("p1"));
    assert_eq!(app.chat.authoritative().len(), 1);
    assert_eq!(app.visible_messages()[0].text, "earlier");

    for call in ["session", "agents", "profile dev", "connectivity", "projects", "chat p1"] {
        assert_eq!(backend.count_calls(call), 1, "calls: {:?}", backend.calls());
    }
}

#[tokio::test]
async fn signed_out_startup_touches_nothing_else() {
    let backend = FakeBackend::new();
    let (app, _desk) = started(&backend).await;
    assert!(!app.session.is_checking());
    assert!(!app.session.is_authenticated());
    assert_eq!(backend.calls(), vec!["session".to_string()]);
}

#[tokio::test]
async fn login_then_workspace_loads() {
    let backend = FakeBackend::new();
    backend.accept_password("hunter2");
    backend.set_projects(vec![Project::new("p1", "Alpha")]);
    let (mut app, mut desk) = started(&backend).await;

    desk.apply(
        &mut app,
        AppAction::SubmitLogin {
            email: "ops@example.com".into(),
            password: "wrong".into(),
        },
    );
    desk.run_until_idle(&mut app).await;
    assert_eq!(app.session.login.error(), Some("Invalid credentials"));
    assert!(!app.session.is_authenticated());

    desk.apply(
        &mut app,
        AppAction::SubmitLogin {
            email: "ops@example.com".into(),
            password: "hunter2".into(),
        },
    );
    desk.run_until_idle(&mut app).await;
    assert!(app.session.is_authenticated());
    assert_eq!(app.session.email(), Some("ops@example.com"));
    assert_eq!(app.projects.active_project_id(), Some("p1"));
    // Empty roster from the service falls back to the built-in one.
    assert_eq!(app.agents.agents().len(), 5);
}

#[tokio::test]
async fn send_reconciles_without_duplicates() {
    let backend = signed_in_backend();
    let (mut app, mut desk) = started(&backend).await;

    desk.apply(
        &mut app,
        AppAction::SubmitMessage {
            text: "  Hello  ".into(),
        },
    );
    assert_eq!(desk.in_flight(), 1);
    assert_eq!(app.visible_messages()[0].text, "Hello");

    desk.run_until_idle(&mut app).await;

    assert_eq!(app.chat.authoritative(), backend.log("p1").as_slice());
    assert!(app.chat.pending().is_empty());
    let visible: Vec<(ChatRole, String)> = app
        .visible_messages()
        .into_iter()
        .map(|e| (e.role, e.text))
        .collect();
    assert_eq!(
        visible,
        vec![
            (ChatRole::User, "Hello".to_string()),
            (ChatRole::Assistant, "Done".to_string()),
        ]
    );
    assert_eq!(backend.count_calls("run p1 dev Hello"), 1);
    assert_eq!(backend.count_calls("chat p1"), 2);
}

#[tokio::test]
async fn slow_log_for_abandoned_project_is_ignored() {
    let backend = signed_in_backend();
    backend.set_log("p1", vec![entry("p1", "dev", ChatRole::User, "p1 log", 1)]);
    backend.set_log("p2", vec![entry("p2", "dev", ChatRole::User, "p2 log", 1)]);
    let (mut app, mut desk) = started(&backend).await;

    backend.delay_chat("p1", Duration::from_millis(80));
    desk.apply(&mut app, AppAction::ReloadChat);
    desk.apply(
        &mut app,
        AppAction::SelectProject {
            project_id: "p2".into(),
        },
    );
    desk.run_until_idle(&mut app).await;

    assert_eq!(app.chat.project_id(), Some("p2"));
    assert_eq!(app.chat.authoritative()[0].text, "p2 log");
}

#[tokio::test]
async fn create_and_delete_go_through_the_index() {
    let backend = signed_in_backend();
    let (mut app, mut desk) = started(&backend).await;

    desk.apply(
        &mut app,
        AppAction::CreateProject {
            name: "Gamma".into(),
        },
    );
    desk.run_until_idle(&mut app).await;
    assert_eq!(app.projects.list().len(), 3);
    assert_eq!(app.projects.active_project_id(), Some("p1"));

    desk.apply(&mut app, AppAction::RequestDeleteProject { project_id: None });
    assert_eq!(desk.in_flight(), 0);
    desk.apply(&mut app, AppAction::ConfirmDeleteProject);
    desk.run_until_idle(&mut app).await;

    assert_eq!(backend.count_calls("delete p1"), 1);
    assert_eq!(app.projects.active_project_id(), Some("p2"));
    assert_eq!(app.chat.project_id(), Some("p2"));
}

#[tokio::test]
async fn failed_connectivity_clears_the_project_side_only() {
    let backend = signed_in_backend();
    let (mut app, mut desk) = started(&backend).await;

    backend.fail_connectivity("store offline");
    desk.apply(&mut app, AppAction::LoadProjects);
    desk.run_until_idle(&mut app).await;

    assert_eq!(app.projects.connected(), Some(false));
    assert!(app.projects.list().is_empty());
    assert!(app.chat.project_id().is_none());
    assert_eq!(app.agents.agents().len(), 2);
    assert!(app.agents.profile.data().is_some());
}

#[tokio::test]
async fn shutdown_abandons_in_flight_requests() {
    let backend = signed_in_backend();
    let (mut app, mut desk) = started(&backend).await;

    backend.delay_chat("p1", Duration::from_millis(50));
    desk.apply(&mut app, AppAction::ReloadChat);
    assert_eq!(desk.in_flight(), 1);
    desk.shutdown();
    assert!(desk.is_idle());

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(!desk.drain_action_queue(&mut app));
    assert!(app.chat.log.is_loading());
}

#[tokio::test]
async fn drain_applies_completions_already_queued() {
    let backend = signed_in_backend();
    let (mut app, mut desk) = started(&backend).await;
    backend.set_log("p1", vec![entry("p1", "dev", ChatRole::User, "fresh", 3)]);

    desk.apply(&mut app, AppAction::ReloadChat);
    assert!(!desk.drain_action_queue(&mut app));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(desk.drain_action_queue(&mut app));

    assert!(desk.is_idle());
    assert_eq!(app.chat.authoritative()[0].text, "fresh");
}
