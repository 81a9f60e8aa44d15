//! Tri-state wrapper around one asynchronously fetched resource.
//!
//! Every load is tagged with a generation. Only the most recently started
//! load may write its result; anything older is dropped on arrival, which is
//! how stale completions are fenced off after a selection change.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl LoadStatus {
    pub fn label(self) -> &'static str {
        match self {
            LoadStatus::Idle => "idle",
            LoadStatus::Loading => "loading",
            LoadStatus::Success => "ready",
            LoadStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Loadable<T> {
    status: LoadStatus,
    data: Option<T>,
    error: Option<String>,
    generation: u64,
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Self {
            status: LoadStatus::Idle,
            data: None,
            error: None,
            generation: 0,
        }
    }
}

impl<T> Loadable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Starts a new attempt. Data from the previous attempt stays visible
    /// until the new one settles.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.status = LoadStatus::Loading;
        self.error = None;
        self.generation
    }

    /// Applies a completion. Returns `false` when `generation` is stale and
    /// the result was discarded.
    pub fn finish(&mut self, generation: u64, result: Result<T, String>) -> bool {
        if !self.is_current(generation) {
            debug!(
                generation,
                current = self.generation,
                "discarding stale load result"
            );
            return false;
        }
        match result {
            Ok(data) => {
                self.status = LoadStatus::Success;
                self.data = Some(data);
                self.error = None;
            }
            Err(message) => {
                self.status = LoadStatus::Error;
                self.error = Some(message);
            }
        }
        true
    }

    /// Settles a current attempt as failed while still installing usable
    /// data (a configured fallback, for instance).
    pub fn recover(&mut self, generation: u64, fallback: T, message: String) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.status = LoadStatus::Error;
        self.data = Some(fallback);
        self.error = Some(message);
        true
    }

    pub fn clear_data(&mut self) {
        self.data = None;
    }

    /// Back to idle with nothing held. In-flight attempts become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.status = LoadStatus::Idle;
        self.data = None;
        self.error = None;
    }
}
