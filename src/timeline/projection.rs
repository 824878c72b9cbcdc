// Per-stage phase and overall progress, derived from the current ordinal

use crate::models::{Stage, StageRegistry};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StagePhase {
    Completed,
    Active,
    Pending,
}

impl StagePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            StagePhase::Completed => "completed",
            StagePhase::Active => "active",
            StagePhase::Pending => "pending",
        }
    }
}

/// Snapshot of where a run stands. Cheap to build; recompute it every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub current: Option<usize>,
    pub stage_count: usize,
    pub percent: u8,
}

pub fn project(current: Option<usize>, stage_count: usize) -> Projection {
    Projection {
        current,
        stage_count,
        percent: percent(current, stage_count),
    }
}

/// round((current + 1) / count * 100), halves rounded up, never above 100
pub fn percent(current: Option<usize>, stage_count: usize) -> u8 {
    match current {
        None => 0,
        Some(_) if stage_count == 0 => 0,
        Some(ordinal) => {
            // Integer form of round-half-up avoids float drift on the last stage
            let reached = (ordinal as u64 + 1) * 100;
            let count = stage_count as u64;
            let rounded = (2 * reached + count) / (2 * count);
            rounded.min(100) as u8
        }
    }
}

impl Projection {
    pub fn is_active(&self, ordinal: usize) -> bool {
        self.current == Some(ordinal)
    }

    pub fn is_completed(&self, ordinal: usize) -> bool {
        matches!(self.current, Some(current) if ordinal < current)
    }

    pub fn phase(&self, ordinal: usize) -> StagePhase {
        if self.is_active(ordinal) {
            StagePhase::Active
        } else if self.is_completed(ordinal) {
            StagePhase::Completed
        } else {
            StagePhase::Pending
        }
    }

    pub fn phases(&self) -> Vec<StagePhase> {
        (0..self.stage_count).map(|ordinal| self.phase(ordinal)).collect()
    }

    /// Node caption: the stage's status text, once the request has moved past it
    pub fn status_text<'a>(&self, stage: &'a Stage) -> Option<&'a str> {
        if self.is_completed(stage.ordinal) {
            Some(stage.status.as_str())
        } else {
            None
        }
    }

    /// Step panel heading and description for the current stage
    pub fn headline<'a>(&self, registry: &'a StageRegistry) -> Headline<'a> {
        match self.current.and_then(|ordinal| registry.get(ordinal)) {
            Some(stage) => Headline {
                title: stage.title.as_str(),
                description: Some(stage.description.as_str()),
            },
            None => Headline {
                title: "Ready",
                description: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Headline<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
}
