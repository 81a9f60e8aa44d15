//! Drives [`App`] against a [`WorkspaceBackend`].
//!
//! Actions are applied on the caller's task only; every command becomes one
//! spawned executor that dispatches its completion back through the queue.
//! Nothing else touches the state, so the only races left are stale results,
//! and those are fenced inside the stores.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::WorkspaceBackend;
use crate::core::app::{apply_action, apply_actions, App, AppAction, AppActionDispatcher, AppCommand};

pub mod executors;

use executors::{spawn_command, ExecutorContext};

pub struct DeskLoop {
    context: ExecutorContext,
    action_rx: mpsc::UnboundedReceiver<AppAction>,
    in_flight: usize,
}

impl DeskLoop {
    pub fn new(backend: Arc<dyn WorkspaceBackend>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        Self {
            context: ExecutorContext {
                backend,
                dispatcher: AppActionDispatcher::new(action_tx),
                cancel_token: CancellationToken::new(),
            },
            action_rx,
            in_flight: 0,
        }
    }

    /// Commands issued whose completion has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    /// Applies a user intent and issues whatever it asks for.
    pub fn apply(&mut self, app: &mut App, action: AppAction) {
        let commands = apply_action(app, action);
        self.execute(commands);
    }

    pub fn execute(&mut self, commands: Vec<AppCommand>) {
        for command in commands {
            self.in_flight += 1;
            spawn_command(self.context.clone(), command);
        }
    }

    fn settle(&mut self, app: &mut App, completions: Vec<AppAction>) {
        self.in_flight = self.in_flight.saturating_sub(completions.len());
        let commands = apply_actions(app, completions);
        self.execute(commands);
    }

    /// Applies every completion already queued without waiting. Returns
    /// `true` when anything was applied.
    pub fn drain_action_queue(&mut self, app: &mut App) -> bool {
        let mut pending = Vec::new();
        while let Ok(action) = self.action_rx.try_recv() {
            pending.push(action);
        }
        if pending.is_empty() {
            return false;
        }
        self.settle(app, pending);
        true
    }

    /// Waits for the next completion and applies it. Returns `false` when
    /// nothing is in flight.
    pub async fn apply_next_completion(&mut self, app: &mut App) -> bool {
        if self.is_idle() {
            return false;
        }
        match self.action_rx.recv().await {
            Some(action) => {
                self.settle(app, vec![action]);
                true
            }
            None => false,
        }
    }

    /// Applies completions, and the follow-up commands they trigger, until
    /// nothing is in flight.
    pub async fn run_until_idle(&mut self, app: &mut App) {
        while self.apply_next_completion(app).await {}
        debug!("desk loop idle");
    }

    /// Abandons every in-flight request; their completions are never
    /// dispatched.
    pub fn shutdown(&mut self) {
        self.context.cancel_token.cancel();
        self.in_flight = 0;
    }
}

#[cfg(test)]
mod tests;
