// Externally driven mode: an outside caller reports stages as they happen

use crate::models::{RunState, Session, StageRegistry};
use crate::timeline::observer::{FlowControl, FlowObserver};
use log::debug;
use thiserror::Error;

/// What to do with ordinals the caller jumped over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipPolicy {
    /// Announce every intermediate stage, in order, before the reported one
    #[default]
    Visit,
    /// Announce only the reported stage
    Skip,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("flow is not running")]
    NotRunning,
    #[error("stage {ordinal} does not exist (last stage is {last})")]
    OutOfRange { ordinal: usize, last: usize },
    #[error("stage {ordinal} reported after stage {current}; stages only move forward")]
    NotIncreasing { ordinal: usize, current: usize },
}

/// Tracks a session whose stage changes arrive from outside.
///
/// Shares the session shape and observer contract with the scheduler but owns
/// no timers: `report` is the only thing that moves it forward.
#[derive(Debug)]
pub struct ExternalTracker {
    registry: StageRegistry,
    policy: SkipPolicy,
    session: Session,
}

impl ExternalTracker {
    pub fn new(registry: StageRegistry, policy: SkipPolicy) -> Self {
        Self {
            registry,
            policy,
            session: Session::new(),
        }
    }

    /// Start tracking a run. No-op while one is running.
    pub fn activate(&mut self) -> bool {
        if self.session.is_running() {
            return false;
        }
        let generation = self.session.begin();
        debug!("external tracking started, generation {}", generation);
        true
    }

    pub fn deactivate(&mut self) {
        self.session.reset();
    }

    /// Record that the flow reached `ordinal` at `now_ms`
    ///
    /// Returns the number of stage changes delivered to the observer.
    pub fn report(
        &mut self,
        ordinal: usize,
        now_ms: u64,
        observer: &mut dyn FlowObserver,
    ) -> Result<usize, ReportError> {
        if !self.session.is_running() {
            return Err(ReportError::NotRunning);
        }
        let last = self.registry.last_ordinal();
        if ordinal > last {
            return Err(ReportError::OutOfRange { ordinal, last });
        }
        let first = match self.session.current_ordinal {
            Some(current) if ordinal <= current => {
                return Err(ReportError::NotIncreasing { ordinal, current });
            }
            Some(current) => current + 1,
            None => 0,
        };
        let first = match self.policy {
            SkipPolicy::Visit => first,
            SkipPolicy::Skip => ordinal,
        };

        let mut delivered = 0;
        for step in first..=ordinal {
            let Some(stage) = self.registry.get(step) else {
                break;
            };
            self.session.current_ordinal = Some(step);
            let mut control = FlowControl::new(now_ms);
            observer.on_stage_change(stage, &mut control);
            delivered += 1;
            if control.deactivate_requested() {
                self.deactivate();
                break;
            }
        }
        Ok(delivered)
    }

    /// Mark the run finished. Fires `on_complete` once; later calls do nothing.
    pub fn complete(&mut self, now_ms: u64, observer: &mut dyn FlowObserver) -> bool {
        if !self.session.is_running() {
            return false;
        }
        self.session.state = RunState::Completed;
        let mut control = FlowControl::new(now_ms);
        observer.on_complete(&mut control);
        if control.deactivate_requested() {
            self.deactivate();
        }
        true
    }

    /// The collaborator failed: stop tracking and hand the message back for display
    pub fn fail(&mut self, message: &str) -> String {
        debug!("external flow failed: {}", message);
        self.deactivate();
        message.to_string()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn policy(&self) -> SkipPolicy {
        self.policy
    }
}
