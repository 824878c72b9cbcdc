// Autonomous timeline: fires stage changes from a fixed schedule

use crate::models::{RunState, Schedule, ScheduleError, Session, StageRegistry};
use crate::timeline::observer::{FlowControl, FlowObserver};
use crate::timeline::timers::TimerQueue;
use log::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimelineTask {
    Stage(usize),
    Complete,
}

/// Drives a session through the schedule.
///
/// States are `Idle -> Running -> Completed`, with `Running -> Idle` on
/// deactivation. Time only moves when the owner calls [`advance_to`], so a
/// test can play a whole run against a fake clock.
///
/// [`advance_to`]: TimelineScheduler::advance_to
#[derive(Debug)]
pub struct TimelineScheduler {
    registry: StageRegistry,
    schedule: Schedule,
    session: Session,
    timers: TimerQueue<TimelineTask>,
}

impl TimelineScheduler {
    /// Pair a registry with a schedule; the schedule must cover every stage
    pub fn new(registry: StageRegistry, schedule: Schedule) -> Result<Self, ScheduleError> {
        schedule.check_stage_count(registry.len())?;
        Ok(Self {
            registry,
            schedule,
            session: Session::new(),
            timers: TimerQueue::new(),
        })
    }

    pub fn serverless_order_flow() -> Self {
        Self {
            registry: StageRegistry::serverless_order_flow(),
            schedule: Schedule::serverless_order_flow(),
            session: Session::new(),
            timers: TimerQueue::new(),
        }
    }

    /// Start a run at `now_ms`. Returns false (and does nothing) while a run is in flight.
    pub fn activate(&mut self, now_ms: u64) -> bool {
        if self.session.is_running() {
            debug!("activate ignored: generation {} still running", self.session.generation);
            return false;
        }

        // A completed run may still be on screen; its timers are all spent,
        // but drop anything left over before the generation moves on
        self.timers.cancel_generation(self.session.generation);

        let generation = self.session.begin();
        for entry in self.schedule.entries() {
            self.timers.schedule(
                now_ms.saturating_add(entry.delay_ms),
                generation,
                TimelineTask::Stage(entry.target_ordinal),
            );
        }
        self.timers.schedule(
            now_ms.saturating_add(self.schedule.complete_ms()),
            generation,
            TimelineTask::Complete,
        );

        debug!(
            "activated generation {} at {}ms ({} timers)",
            generation,
            now_ms,
            self.timers.len()
        );
        true
    }

    /// Stop the current run from any state. Safe to call repeatedly.
    pub fn deactivate(&mut self) {
        let cancelled = self.timers.cancel_generation(self.session.generation);
        if self.session.is_active() {
            debug!(
                "deactivated generation {} ({} timers cancelled)",
                self.session.generation, cancelled
            );
        }
        self.session.reset();
    }

    /// Fire every timer due at or before `now_ms`, in order.
    ///
    /// Returns the number of callbacks delivered.
    pub fn advance_to(&mut self, now_ms: u64, observer: &mut dyn FlowObserver) -> usize {
        let mut delivered = 0;

        while let Some(fired) = self.timers.pop_due(now_ms) {
            if fired.generation != self.session.generation || !self.session.is_running() {
                warn!(
                    "discarding stale timer from generation {} (current {})",
                    fired.generation, self.session.generation
                );
                continue;
            }

            let mut control = FlowControl::new(fired.due_ms);
            match fired.payload {
                TimelineTask::Stage(ordinal) => {
                    let Some(stage) = self.registry.get(ordinal) else {
                        continue;
                    };
                    trace!("stage {} ({}) at {}ms", ordinal, stage.id, fired.due_ms);
                    self.session.current_ordinal = Some(ordinal);
                    observer.on_stage_change(stage, &mut control);
                }
                TimelineTask::Complete => {
                    trace!("run complete at {}ms", fired.due_ms);
                    self.session.state = RunState::Completed;
                    observer.on_complete(&mut control);
                }
            }
            delivered += 1;

            if control.deactivate_requested() {
                self.deactivate();
            }
        }

        delivered
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}
