// A whole diagram: stage driver, projection and edge packets on one clock

use crate::models::{Layout, Point, RunState, Schedule, Session, StageRegistry};
use crate::timeline::edge::{derive_edges, EdgeLayer};
use crate::timeline::external::{ExternalTracker, ReportError};
use crate::timeline::observer::FlowObserver;
use crate::timeline::projection::{project, StagePhase};
use crate::timeline::scheduler::TimelineScheduler;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("{0} is only available in externally driven mode")]
    NotExternal(&'static str),
    #[error(transparent)]
    Report(#[from] ReportError),
}

#[derive(Debug)]
enum Driver {
    Autonomous(TimelineScheduler),
    External(ExternalTracker),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFrame {
    pub ordinal: usize,
    pub id: String,
    pub label: String,
    pub phase: StagePhase,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeFrame {
    pub from: usize,
    pub to: usize,
    pub caption: Option<String>,
    pub active: bool,
    pub packet: Option<Point>,
}

/// Everything needed to draw the diagram at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowFrame {
    pub at_ms: u64,
    pub state: RunState,
    pub generation: u64,
    pub run_id: Option<Uuid>,
    pub current: Option<usize>,
    pub percent: u8,
    pub title: String,
    pub description: Option<String>,
    pub stages: Vec<StageFrame>,
    pub edges: Vec<EdgeFrame>,
}

/// Registry, driver and edge layer advanced together.
///
/// The clock never moves backwards: `advance_to` with an earlier time is
/// treated as "now".
#[derive(Debug)]
pub struct FlowSimulation {
    registry: StageRegistry,
    driver: Driver,
    edges: EdgeLayer,
    now_ms: u64,
}

impl FlowSimulation {
    pub fn autonomous(scheduler: TimelineScheduler, layout: &Layout, travel_ms: u64) -> Self {
        let registry = scheduler.registry().clone();
        let edges = derive_edges(&registry, scheduler.schedule(), layout);
        Self {
            registry,
            driver: Driver::Autonomous(scheduler),
            edges: EdgeLayer::new(edges, travel_ms),
            now_ms: 0,
        }
    }

    /// Edge delays still come from `schedule`; stage changes come from `report`
    pub fn external(
        tracker: ExternalTracker,
        schedule: &Schedule,
        layout: &Layout,
        travel_ms: u64,
    ) -> Self {
        let registry = tracker.registry().clone();
        let edges = derive_edges(&registry, schedule, layout);
        Self {
            registry,
            driver: Driver::External(tracker),
            edges: EdgeLayer::new(edges, travel_ms),
            now_ms: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn is_external(&self) -> bool {
        matches!(self.driver, Driver::External(_))
    }

    pub fn session(&self) -> &Session {
        match &self.driver {
            Driver::Autonomous(scheduler) => scheduler.session(),
            Driver::External(tracker) => tracker.session(),
        }
    }

    pub fn activate(&mut self) -> bool {
        let started = match &mut self.driver {
            Driver::Autonomous(scheduler) => scheduler.activate(self.now_ms),
            Driver::External(tracker) => tracker.activate(),
        };
        if started {
            self.sync_edges();
        }
        started
    }

    pub fn deactivate(&mut self) {
        match &mut self.driver {
            Driver::Autonomous(scheduler) => scheduler.deactivate(),
            Driver::External(tracker) => tracker.deactivate(),
        }
        self.sync_edges();
    }

    /// Move the clock to `now_ms`, delivering every stage change and completion on the way
    pub fn advance_to(&mut self, now_ms: u64, observer: &mut dyn FlowObserver) -> usize {
        let target = now_ms.max(self.now_ms);
        let mut delivered = 0;

        if let Driver::Autonomous(scheduler) = &mut self.driver {
            while let Some(deadline) = scheduler.next_deadline().filter(|d| *d <= target) {
                self.edges.advance_to(deadline);
                delivered += scheduler.advance_to(deadline, observer);
                self.edges.sync(scheduler.session(), deadline);
            }
        }

        self.edges.advance_to(target);
        self.now_ms = target;
        delivered
    }

    pub fn report(
        &mut self,
        ordinal: usize,
        observer: &mut dyn FlowObserver,
    ) -> Result<usize, SimulationError> {
        let Driver::External(tracker) = &mut self.driver else {
            return Err(SimulationError::NotExternal("report"));
        };
        let delivered = tracker.report(ordinal, self.now_ms, observer)?;
        self.sync_edges();
        Ok(delivered)
    }

    pub fn complete(&mut self, observer: &mut dyn FlowObserver) -> Result<bool, SimulationError> {
        let Driver::External(tracker) = &mut self.driver else {
            return Err(SimulationError::NotExternal("complete"));
        };
        let fired = tracker.complete(self.now_ms, observer);
        self.sync_edges();
        Ok(fired)
    }

    pub fn fail(&mut self, message: &str) -> Result<String, SimulationError> {
        let Driver::External(tracker) = &mut self.driver else {
            return Err(SimulationError::NotExternal("fail"));
        };
        let message = tracker.fail(message);
        self.sync_edges();
        Ok(message)
    }

    /// Earliest pending stage, completion or packet timer
    pub fn next_deadline(&self) -> Option<u64> {
        let driver = match &self.driver {
            Driver::Autonomous(scheduler) => scheduler.next_deadline(),
            Driver::External(_) => None,
        };
        match (driver, self.edges.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn pending_timers(&self) -> usize {
        let driver = match &self.driver {
            Driver::Autonomous(scheduler) => scheduler.pending_timers(),
            Driver::External(_) => 0,
        };
        driver + self.edges.pending_timers()
    }

    pub fn edges(&self) -> &EdgeLayer {
        &self.edges
    }

    pub fn frame(&self) -> FlowFrame {
        let session = self.session();
        let projection = project(session.current_ordinal, self.registry.len());
        let headline = projection.headline(&self.registry);

        let stages = self
            .registry
            .stages()
            .iter()
            .map(|stage| StageFrame {
                ordinal: stage.ordinal,
                id: stage.id.clone(),
                label: stage.label.clone(),
                phase: projection.phase(stage.ordinal),
                status: projection.status_text(stage).map(str::to_string),
            })
            .collect();

        let edges = self
            .edges
            .edges()
            .iter()
            .enumerate()
            .map(|(index, edge)| EdgeFrame {
                from: edge.from_ordinal,
                to: edge.to_ordinal,
                caption: edge.caption.clone(),
                active: self.edges.is_active(index),
                packet: self.edges.packet_position(index, self.now_ms),
            })
            .collect();

        FlowFrame {
            at_ms: self.now_ms,
            state: session.state,
            generation: session.generation,
            run_id: session.run_id,
            current: session.current_ordinal,
            percent: projection.percent,
            title: headline.title.to_string(),
            description: headline.description.map(str::to_string),
            stages,
            edges,
        }
    }

    fn sync_edges(&mut self) {
        let session = match &self.driver {
            Driver::Autonomous(scheduler) => scheduler.session(),
            Driver::External(tracker) => tracker.session(),
        };
        self.edges.sync(session, self.now_ms);
    }
}

impl Drop for FlowSimulation {
    fn drop(&mut self) {
        self.edges.teardown();
    }
}
