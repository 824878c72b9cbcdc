// Links between consecutive stages: anchor geometry and the travelling packet

use crate::models::{Layout, NodeBox, Point, Schedule, Session, StageRegistry};
use crate::timeline::timers::{TimerHandle, TimerQueue};
use log::trace;
use serde::Serialize;

/// Gap between the source node border and where the link starts
pub const SOURCE_CLEARANCE: f64 = 10.0;
/// Gap between where the link ends and the destination node border
pub const DEST_CLEARANCE: f64 = 20.0;
pub const DEFAULT_PACKET_TRAVEL_MS: u64 = 1500;

/// Directed link between two consecutive stages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub from_ordinal: usize,
    pub to_ordinal: usize,
    pub activation_delay_ms: u64,
    pub caption: Option<String>,
    pub start: Point,
    pub end: Point,
}

/// Where a link between two node centres should start and end.
///
/// Axis-aligned links anchor on the midpoint of the facing box edge; anything
/// else runs along the centre-to-centre direction from the box border.
pub fn anchors(from: Point, to: Point, node: NodeBox) -> (Point, Point) {
    let dx = to.x - from.x;
    let dy = to.y - from.y;

    if dx.abs() < 1.0 && dy.abs() < 1.0 {
        return (from, to);
    }

    if dx.abs() < 1.0 {
        let dir = dy.signum();
        return (
            Point::new(from.x, from.y + dir * (node.half_height + SOURCE_CLEARANCE)),
            Point::new(to.x, to.y - dir * (node.half_height + DEST_CLEARANCE)),
        );
    }

    if dy.abs() < 1.0 {
        let dir = dx.signum();
        return (
            Point::new(from.x + dir * (node.half_width + SOURCE_CLEARANCE), from.y),
            Point::new(to.x - dir * (node.half_width + DEST_CLEARANCE), to.y),
        );
    }

    let length = (dx * dx + dy * dy).sqrt();
    let (ux, uy) = (dx / length, dy / length);
    // Distance from the centre to the box border along (ux, uy)
    let border = (node.half_width / ux.abs()).min(node.half_height / uy.abs());
    let start = border + SOURCE_CLEARANCE;
    let end = border + DEST_CLEARANCE;
    (
        Point::new(from.x + ux * start, from.y + uy * start),
        Point::new(to.x - ux * end, to.y - uy * end),
    )
}

/// One edge per adjacent stage pair, delayed by the source stage's schedule slot
pub fn derive_edges(registry: &StageRegistry, schedule: &Schedule, layout: &Layout) -> Vec<Edge> {
    registry
        .stages()
        .windows(2)
        .filter_map(|pair| {
            let (from, to) = (&pair[0], &pair[1]);
            let (start, end) = anchors(
                layout.center(from.ordinal)?,
                layout.center(to.ordinal)?,
                layout.node_box(),
            );
            Some(Edge {
                from_ordinal: from.ordinal,
                to_ordinal: to.ordinal,
                activation_delay_ms: schedule.delay_of(from.ordinal).unwrap_or(0),
                caption: layout.caption(&from.id, &to.id).map(str::to_string),
                start,
                end,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Packet {
    Hidden,
    Armed(TimerHandle),
    Travelling { since_ms: u64 },
}

/// Packet animation for every edge of a diagram.
///
/// Each edge has its own activation flag. Raising it arms a show-timer for
/// the edge's delay; lowering it hides the packet and cancels that timer.
#[derive(Debug)]
pub struct EdgeLayer {
    edges: Vec<Edge>,
    active: Vec<bool>,
    packets: Vec<Packet>,
    timers: TimerQueue<usize>,
    travel_ms: u64,
}

impl EdgeLayer {
    pub fn new(edges: Vec<Edge>, travel_ms: u64) -> Self {
        let count = edges.len();
        Self {
            edges,
            active: vec![false; count],
            packets: vec![Packet::Hidden; count],
            timers: TimerQueue::new(),
            travel_ms: travel_ms.max(1),
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active.get(index).copied().unwrap_or(false)
    }

    /// Raise or lower one edge's flag. Setting the same value again does nothing.
    pub fn set_active(&mut self, index: usize, active: bool, now_ms: u64) {
        let Some(flag) = self.active.get_mut(index) else {
            return;
        };
        if *flag == active {
            return;
        }
        *flag = active;

        if let Packet::Armed(handle) = self.packets[index] {
            self.timers.cancel(handle);
        }
        self.packets[index] = if active {
            let delay = self.edges[index].activation_delay_ms;
            Packet::Armed(self.timers.schedule(now_ms.saturating_add(delay), 0, index))
        } else {
            Packet::Hidden
        };
    }

    /// Follow the session: edge k is live while the run is active and has reached its target
    pub fn sync(&mut self, session: &Session, now_ms: u64) {
        for index in 0..self.edges.len() {
            let reached = matches!(
                session.current_ordinal,
                Some(current) if current >= self.edges[index].to_ordinal
            );
            self.set_active(index, session.is_active() && reached, now_ms);
        }
    }

    /// Fire show-timers due by `now_ms`
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some(fired) = self.timers.pop_due(now_ms) {
            let index = fired.payload;
            if self.packets.get(index) == Some(&Packet::Armed(fired.handle)) {
                trace!("packet shown on edge {} at {}ms", index, fired.due_ms);
                self.packets[index] = Packet::Travelling { since_ms: fired.due_ms };
            }
        }
    }

    pub fn packet_visible(&self, index: usize) -> bool {
        matches!(self.packets.get(index), Some(Packet::Travelling { .. }))
    }

    /// Packet location along the edge; loops from start to end while shown
    pub fn packet_position(&self, index: usize, now_ms: u64) -> Option<Point> {
        let Packet::Travelling { since_ms } = *self.packets.get(index)? else {
            return None;
        };
        let edge = &self.edges[index];
        let elapsed = now_ms.saturating_sub(since_ms) % self.travel_ms;
        let t = ease_in_out(elapsed as f64 / self.travel_ms as f64);
        Some(Point::new(
            edge.start.x + (edge.end.x - edge.start.x) * t,
            edge.start.y + (edge.end.y - edge.start.y) * t,
        ))
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Lower every flag and drop every pending show-timer
    pub fn teardown(&mut self) {
        self.timers.clear();
        self.active.iter_mut().for_each(|flag| *flag = false);
        self.packets.iter_mut().for_each(|p| *p = Packet::Hidden);
    }
}

fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
