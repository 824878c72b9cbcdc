// Callback contract shared by the scheduler and the external tracker

use crate::models::Stage;
use serde::Serialize;

/// Handed to every callback.
///
/// Lets the observer ask for the run to be torn down without needing a
/// reference back into the scheduler that is calling it.
#[derive(Debug)]
pub struct FlowControl {
    now_ms: u64,
    deactivate: bool,
}

impl FlowControl {
    pub(crate) fn new(now_ms: u64) -> Self {
        Self { now_ms, deactivate: false }
    }

    /// Time of the event being delivered, in milliseconds on the flow clock
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Deactivate once this callback returns; nothing else from this run fires
    pub fn deactivate(&mut self) {
        self.deactivate = true;
    }

    pub fn deactivate_requested(&self) -> bool {
        self.deactivate
    }
}

pub trait FlowObserver {
    fn on_stage_change(&mut self, _stage: &Stage, _control: &mut FlowControl) {}

    fn on_complete(&mut self, _control: &mut FlowControl) {}
}

/// Observer that ignores everything
impl FlowObserver for () {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FlowEvent {
    StageChanged {
        at_ms: u64,
        ordinal: usize,
        id: String,
        name: String,
        description: String,
    },
    Completed {
        at_ms: u64,
    },
}

/// Observer that keeps every event it sees
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<FlowEvent>,
    /// Deactivate from inside `on_complete`, the way a page resets its flag
    pub deactivate_on_complete: bool,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deactivating() -> Self {
        Self {
            events: Vec::new(),
            deactivate_on_complete: true,
        }
    }

    pub fn ordinals(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match e {
                FlowEvent::StageChanged { ordinal, .. } => Some(*ordinal),
                FlowEvent::Completed { .. } => None,
            })
            .collect()
    }

    pub fn completions(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, FlowEvent::Completed { .. }))
            .count()
    }
}

impl FlowObserver for EventLog {
    fn on_stage_change(&mut self, stage: &Stage, control: &mut FlowControl) {
        self.events.push(FlowEvent::StageChanged {
            at_ms: control.now_ms(),
            ordinal: stage.ordinal,
            id: stage.id.clone(),
            name: stage.title.clone(),
            description: stage.description.clone(),
        });
    }

    fn on_complete(&mut self, control: &mut FlowControl) {
        self.events.push(FlowEvent::Completed { at_ms: control.now_ms() });
        if self.deactivate_on_complete {
            control.deactivate();
        }
    }
}
