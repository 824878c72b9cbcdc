use serde::Serialize;
use uuid::Uuid;

/// Lifecycle of one flow activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Running,
    Completed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Completed => "completed",
        }
    }
}

/// Live record of a flow activation.
///
/// Only the scheduler (or the external tracker) mutates a session; everything
/// else reads the snapshot it publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub state: RunState,
    pub current_ordinal: Option<usize>,
    /// Bumped on every activation so timers from an earlier run can be told apart
    pub generation: u64,
    pub run_id: Option<Uuid>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: RunState::Idle,
            current_ordinal: None,
            generation: 0,
            run_id: None,
        }
    }

    /// Active means a run exists, finished or not; only `Idle` is inactive
    pub fn is_active(&self) -> bool {
        self.state != RunState::Idle
    }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }

    /// Start a new run and return its generation
    pub(crate) fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.state = RunState::Running;
        self.current_ordinal = None;
        self.run_id = Some(Uuid::new_v4());
        self.generation
    }

    pub(crate) fn reset(&mut self) {
        self.state = RunState::Idle;
        self.current_ordinal = None;
        self.run_id = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_bumps_generation() {
        let mut session = Session::new();
        assert!(!session.is_active());
        assert_eq!(session.begin(), 1);
        assert!(session.is_running());
        let first_run = session.run_id;
        assert!(first_run.is_some());

        session.reset();
        assert!(!session.is_active());
        assert_eq!(session.current_ordinal, None);
        assert_eq!(session.generation, 1);

        assert_eq!(session.begin(), 2);
        assert_ne!(session.run_id, first_run);
    }

    #[test]
    fn test_completed_counts_as_active() {
        let mut session = Session::new();
        session.begin();
        session.state = RunState::Completed;
        assert!(session.is_active());
        assert!(!session.is_running());
    }
}
