// Real-time playback of an autonomous simulation

use crate::models::Stage;
use crate::timeline::observer::{FlowControl, FlowObserver};
use crate::timeline::simulation::{FlowFrame, FlowSimulation};
use log::debug;
use std::time::{Duration, Instant};

/// Source of elapsed time for the player
pub trait Clock {
    fn now_ms(&self) -> u64;
    fn sleep_ms(&mut self, ms: u64);
}

/// Wall clock measured from creation
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Clock that only moves when slept on; for tests and `simulate`
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.now_ms = self.now_ms.saturating_add(ms);
    }
}

#[derive(Debug, Clone)]
pub struct PlayOptions {
    /// Emit a frame at least this often; 0 means only on timer deadlines
    pub frame_ms: u64,
    /// Give up after this long on the flow clock
    pub until_ms: Option<u64>,
    /// Leave the finished run on screen instead of deactivating it
    pub keep_active: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            frame_ms: 0,
            until_ms: None,
            keep_active: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The completion timer fired
    Completed { at_ms: u64 },
    /// An observer deactivated the run before it completed
    Stopped { at_ms: u64 },
    /// `until_ms` passed first; the run was deactivated
    TimeLimit { at_ms: u64 },
    /// The simulation was already running and could not be started
    AlreadyRunning,
}

/// Forwards to the caller's observer and notes whether completion fired
struct Watch<'a> {
    inner: &'a mut dyn FlowObserver,
    completed: bool,
}

impl FlowObserver for Watch<'_> {
    fn on_stage_change(&mut self, stage: &Stage, control: &mut FlowControl) {
        self.inner.on_stage_change(stage, control);
    }

    fn on_complete(&mut self, control: &mut FlowControl) {
        self.completed = true;
        self.inner.on_complete(control);
    }
}

/// Activate `sim` and advance it against `clock` until the run ends.
///
/// `on_frame` sees a frame after every wake-up. The clock is read relative to
/// its value at the moment of activation.
pub fn play<C: Clock>(
    sim: &mut FlowSimulation,
    clock: &mut C,
    options: &PlayOptions,
    observer: &mut dyn FlowObserver,
    mut on_frame: impl FnMut(&FlowFrame),
) -> PlayOutcome {
    if !sim.activate() {
        return PlayOutcome::AlreadyRunning;
    }
    let origin = clock.now_ms().saturating_sub(sim.now_ms());
    let mut watch = Watch { inner: observer, completed: false };

    loop {
        let now = clock.now_ms().saturating_sub(origin);
        let now = match options.until_ms {
            Some(limit) => now.min(limit),
            None => now,
        };
        sim.advance_to(now, &mut watch);
        on_frame(&sim.frame());

        if watch.completed {
            if !options.keep_active {
                sim.deactivate();
            }
            debug!("playback completed at {}ms", now);
            return PlayOutcome::Completed { at_ms: now };
        }
        if !sim.session().is_active() {
            return PlayOutcome::Stopped { at_ms: now };
        }
        if options.until_ms.is_some_and(|limit| now >= limit) {
            sim.deactivate();
            return PlayOutcome::TimeLimit { at_ms: now };
        }

        let mut wake = sim.next_deadline().unwrap_or(u64::MAX);
        if options.frame_ms > 0 {
            wake = wake.min(now.saturating_add(options.frame_ms));
        }
        if let Some(limit) = options.until_ms {
            wake = wake.min(limit);
        }
        if wake == u64::MAX {
            // Nothing left to wait for; only reachable with a broken clock
            sim.deactivate();
            return PlayOutcome::Stopped { at_ms: now };
        }
        clock.sleep_ms(wake.saturating_sub(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Layout;
    use crate::timeline::observer::EventLog;
    use crate::timeline::scheduler::TimelineScheduler;

    fn sim() -> FlowSimulation {
        let scheduler = TimelineScheduler::serverless_order_flow();
        let layout = Layout::serverless_order_flow(scheduler.registry()).unwrap();
        FlowSimulation::autonomous(scheduler, &layout, 1500)
    }

    #[test]
    fn test_plays_to_completion() {
        let mut sim = sim();
        let mut clock = ManualClock::new();
        let mut log = EventLog::new();
        let mut frames = 0;
        let outcome = play(&mut sim, &mut clock, &PlayOptions::default(), &mut log, |_| frames += 1);

        assert_eq!(outcome, PlayOutcome::Completed { at_ms: 9000 });
        assert_eq!(log.ordinals(), vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(log.completions(), 1);
        assert!(frames > 0);
        assert!(!sim.session().is_active());
        assert_eq!(sim.pending_timers(), 0);
    }

    #[test]
    fn test_keep_active_leaves_completed_run() {
        let mut sim = sim();
        let options = PlayOptions { keep_active: true, ..PlayOptions::default() };
        let outcome = play(&mut sim, &mut ManualClock::new(), &options, &mut (), |_| {});
        assert_eq!(outcome, PlayOutcome::Completed { at_ms: 9000 });
        assert!(sim.session().is_completed());
        assert_eq!(sim.frame().percent, 100);
    }

    #[test]
    fn test_time_limit() {
        let mut sim = sim();
        let mut log = EventLog::new();
        let options = PlayOptions { until_ms: Some(3600), ..PlayOptions::default() };
        let outcome = play(&mut sim, &mut ManualClock::new(), &options, &mut log, |_| {});
        assert_eq!(outcome, PlayOutcome::TimeLimit { at_ms: 3600 });
        assert_eq!(log.ordinals(), vec![0, 1, 2, 3]);
        assert_eq!(log.completions(), 0);
        assert_eq!(sim.pending_timers(), 0);
    }

    #[test]
    fn test_frame_ticks() {
        let mut sim = sim();
        let options = PlayOptions { frame_ms: 100, ..PlayOptions::default() };
        let mut times = Vec::new();
        play(&mut sim, &mut ManualClock::new(), &options, &mut (), |f| times.push(f.at_ms));
        assert!(times.windows(2).all(|w| w[1] > w[0] && w[1] - w[0] <= 100));
        assert_eq!(times.last(), Some(&9000));
    }

    #[test]
    fn test_refuses_overlapping_play() {
        let mut sim = sim();
        sim.activate();
        let outcome = play(&mut sim, &mut ManualClock::new(), &PlayOptions::default(), &mut (), |_| {});
        assert_eq!(outcome, PlayOutcome::AlreadyRunning);
    }

    #[test]
    fn test_huge_frame_interval() {
        let mut sim = sim();
        let options = PlayOptions { frame_ms: u64::MAX, ..PlayOptions::default() };
        let outcome = play(&mut sim, &mut ManualClock::new(), &options, &mut (), |_| {});
        assert_eq!(outcome, PlayOutcome::Completed { at_ms: 9000 });
    }
}
