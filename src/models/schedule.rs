use serde::Serialize;
use thiserror::Error;

/// A stage-change timer: fire `target_ordinal` `delay_ms` after activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub delay_ms: u64,
    pub target_ordinal: usize,
}

impl ScheduleEntry {
    pub fn new(delay_ms: u64, target_ordinal: usize) -> Self {
        Self { delay_ms, target_ordinal }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("schedule must contain at least one entry")]
    Empty,
    #[error("schedule entry {index} targets ordinal {found}, expected {index}")]
    OrdinalOutOfOrder { index: usize, found: usize },
    #[error("first schedule entry must have delay 0, got {0}ms")]
    NonZeroStart(u64),
    #[error("delay for ordinal {ordinal} ({delay_ms}ms) is earlier than the previous entry ({previous_ms}ms)")]
    DelayDecreases { ordinal: usize, delay_ms: u64, previous_ms: u64 },
    #[error("completion delay {complete_ms}ms is earlier than the last stage delay {last_ms}ms")]
    CompletionTooEarly { complete_ms: u64, last_ms: u64 },
    #[error("schedule has {entries} entries but the registry has {stages} stages")]
    LengthMismatch { entries: usize, stages: usize },
    #[error("speed must be a positive number, got {0}")]
    InvalidSpeed(f64),
}

/// Ordered stage timers plus the terminal completion delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
    complete_ms: u64,
}

impl Schedule {
    /// Validate and build a schedule
    ///
    /// Entries must target ordinals 0..N-1 in order, start at delay 0 and never
    /// move backwards in time; completion must not precede the last entry.
    pub fn new(entries: Vec<ScheduleEntry>, complete_ms: u64) -> Result<Self, ScheduleError> {
        let first = entries.first().ok_or(ScheduleError::Empty)?;
        if first.delay_ms != 0 {
            return Err(ScheduleError::NonZeroStart(first.delay_ms));
        }

        let mut previous_ms = 0;
        for (index, entry) in entries.iter().enumerate() {
            if entry.target_ordinal != index {
                return Err(ScheduleError::OrdinalOutOfOrder {
                    index,
                    found: entry.target_ordinal,
                });
            }
            if entry.delay_ms < previous_ms {
                return Err(ScheduleError::DelayDecreases {
                    ordinal: index,
                    delay_ms: entry.delay_ms,
                    previous_ms,
                });
            }
            previous_ms = entry.delay_ms;
        }

        if complete_ms < previous_ms {
            return Err(ScheduleError::CompletionTooEarly {
                complete_ms,
                last_ms: previous_ms,
            });
        }

        Ok(Self { entries, complete_ms })
    }

    /// Build a schedule from bare delays, one per ordinal
    pub fn from_delays(delays: &[u64], complete_ms: u64) -> Result<Self, ScheduleError> {
        let entries = delays
            .iter()
            .enumerate()
            .map(|(ordinal, &delay)| ScheduleEntry::new(delay, ordinal))
            .collect();
        Self::new(entries, complete_ms)
    }

    /// Timing of the serverless order flow animation
    pub fn serverless_order_flow() -> Self {
        Self {
            entries: [0, 800, 2000, 3500, 5500, 6500, 7500]
                .iter()
                .enumerate()
                .map(|(ordinal, &delay)| ScheduleEntry::new(delay, ordinal))
                .collect(),
            complete_ms: 9000,
        }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn complete_ms(&self) -> u64 {
        self.complete_ms
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn delay_of(&self, ordinal: usize) -> Option<u64> {
        self.entries.get(ordinal).map(|e| e.delay_ms)
    }

    /// Check that this schedule has exactly one entry per stage
    pub fn check_stage_count(&self, stages: usize) -> Result<(), ScheduleError> {
        if self.entries.len() != stages {
            return Err(ScheduleError::LengthMismatch {
                entries: self.entries.len(),
                stages,
            });
        }
        Ok(())
    }

    /// Compress (speed > 1) or stretch (speed < 1) every delay
    pub fn scaled(&self, speed: f64) -> Result<Self, ScheduleError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ScheduleError::InvalidSpeed(speed));
        }
        let scale = |ms: u64| (ms as f64 / speed).round() as u64;
        let entries = self
            .entries
            .iter()
            .map(|e| ScheduleEntry::new(scale(e.delay_ms), e.target_ordinal))
            .collect();
        Self::new(entries, scale(self.complete_ms))
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::serverless_order_flow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_validates() {
        let default = Schedule::serverless_order_flow();
        let rebuilt = Schedule::new(default.entries().to_vec(), default.complete_ms()).unwrap();
        assert_eq!(rebuilt, default);
        assert_eq!(default.len(), 7);
        assert_eq!(default.delay_of(3), Some(3500));
        assert_eq!(default.complete_ms(), 9000);
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(Schedule::new(vec![], 0).unwrap_err(), ScheduleError::Empty);
    }

    #[test]
    fn test_rejects_nonzero_start() {
        let err = Schedule::from_delays(&[100, 200], 300).unwrap_err();
        assert_eq!(err, ScheduleError::NonZeroStart(100));
    }

    #[test]
    fn test_rejects_decreasing_delay() {
        let err = Schedule::from_delays(&[0, 500, 400], 1000).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::DelayDecreases { ordinal: 2, delay_ms: 400, previous_ms: 500 }
        );
    }

    #[test]
    fn test_equal_delays_allowed() {
        assert!(Schedule::from_delays(&[0, 0, 500, 500], 500).is_ok());
    }

    #[test]
    fn test_rejects_out_of_order_ordinals() {
        let entries = vec![ScheduleEntry::new(0, 0), ScheduleEntry::new(10, 2)];
        let err = Schedule::new(entries, 20).unwrap_err();
        assert_eq!(err, ScheduleError::OrdinalOutOfOrder { index: 1, found: 2 });
    }

    #[test]
    fn test_rejects_early_completion() {
        let err = Schedule::from_delays(&[0, 800], 700).unwrap_err();
        assert_eq!(err, ScheduleError::CompletionTooEarly { complete_ms: 700, last_ms: 800 });
    }

    #[test]
    fn test_stage_count_check() {
        let schedule = Schedule::serverless_order_flow();
        assert!(schedule.check_stage_count(7).is_ok());
        assert_eq!(
            schedule.check_stage_count(6).unwrap_err(),
            ScheduleError::LengthMismatch { entries: 7, stages: 6 }
        );
    }

    #[test]
    fn test_scaled() {
        let fast = Schedule::serverless_order_flow().scaled(2.0).unwrap();
        assert_eq!(fast.delay_of(1), Some(400));
        assert_eq!(fast.delay_of(6), Some(3750));
        assert_eq!(fast.complete_ms(), 4500);

        assert!(matches!(
            Schedule::serverless_order_flow().scaled(0.0),
            Err(ScheduleError::InvalidSpeed(_))
        ));
        assert!(Schedule::serverless_order_flow().scaled(f64::NAN).is_err());
    }
}
