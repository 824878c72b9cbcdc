// Output formatting utilities

use crate::models::{Schedule, StageRegistry};
use crate::timeline::{Edge, FlowFrame, Projection, StagePhase};
use crate::utils::format_ms;
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";
const ANSI_FG_GREEN: &str = "\x1b[32m";
const ANSI_FG_YELLOW: &str = "\x1b[33m";
const ANSI_FG_BLUE: &str = "\x1b[34m";
const ANSI_FG_RED: &str = "\x1b[31m";
const ANSI_FG_BRIGHT_BLACK: &str = "\x1b[90m";

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    100
}

fn paint(text: &str, color: &str, enabled: bool) -> String {
    if enabled {
        format!("{}{}{}", color, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

fn phase_color(phase: StagePhase) -> &'static str {
    match phase {
        StagePhase::Active => ANSI_FG_BLUE,
        StagePhase::Completed => ANSI_FG_GREEN,
        StagePhase::Pending => ANSI_FG_BRIGHT_BLACK,
    }
}

fn phase_marker(phase: StagePhase) -> &'static str {
    match phase {
        StagePhase::Active => ">",
        StagePhase::Completed => "x",
        StagePhase::Pending => " ",
    }
}

/// Text progress bar, e.g. `[#######.......]  43%`
pub fn format_progress_bar(percent: u8, width: usize) -> String {
    let width = width.max(4);
    let filled = (percent as usize * width + 50) / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled.min(width)),
        ".".repeat(width - filled.min(width)),
        percent
    )
}

/// One line per stage change during `run` and `drive`
pub fn format_stage_change(
    at_ms: u64,
    ordinal: usize,
    stage_count: usize,
    name: &str,
    description: &str,
    percent: u8,
    color: bool,
) -> String {
    let step = format!("Step {}/{}", ordinal + 1, stage_count);
    let heading = paint(name, ANSI_BOLD, color);
    format!(
        "[{:>6}] {} {} ({}%)\n         {}",
        format_ms(at_ms),
        paint(&step, ANSI_FG_BLUE, color),
        heading,
        percent,
        description
    )
}

pub fn format_completion(at_ms: u64, color: bool) -> String {
    format!(
        "[{:>6}] {}",
        format_ms(at_ms),
        paint("Product added successfully!", ANSI_FG_GREEN, color)
    )
}

pub fn format_failure(message: &str, color: bool) -> String {
    format!("{} {}", paint("Flow failed:", ANSI_FG_RED, color), message)
}

/// Full diagram state for `simulate`
pub fn format_frame(frame: &FlowFrame, color: bool, width: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "At {} - {} (generation {})\n",
        format_ms(frame.at_ms),
        frame.state.as_str(),
        frame.generation
    ));
    out.push_str(&format!("{}\n", paint(&frame.title, ANSI_BOLD, color)));
    if let Some(description) = &frame.description {
        out.push_str(&format!("{}\n", description));
    }
    out.push('\n');

    for stage in &frame.stages {
        let line = format!(
            "[{}] {:>2}. {:<18} {:<10}",
            phase_marker(stage.phase),
            stage.ordinal + 1,
            stage.label,
            stage.phase.as_str()
        );
        out.push_str(&paint(&line, phase_color(stage.phase), color));
        if let Some(status) = &stage.status {
            out.push_str(&format!(" {}", status));
        }
        out.push('\n');
    }

    out.push('\n');
    for edge in &frame.edges {
        let caption = edge.caption.as_deref().unwrap_or("");
        let state = match (edge.active, edge.packet) {
            (true, Some(p)) => format!("packet at ({:.0}, {:.0})", p.x, p.y),
            (true, None) => "active".to_string(),
            (false, _) => "idle".to_string(),
        };
        let line = format!("  {} -> {}  {:<20} {}", edge.from + 1, edge.to + 1, caption, state);
        let tint = if edge.active { ANSI_FG_YELLOW } else { ANSI_FG_BRIGHT_BLACK };
        out.push_str(&paint(&line, tint, color));
        out.push('\n');
    }

    let bar_width = width.saturating_sub(20).clamp(10, 50);
    out.push_str(&format!("\nOverall Progress {}\n", format_progress_bar(frame.percent, bar_width)));
    out
}

/// Step list and progress for `progress`
pub fn format_projection(
    registry: &StageRegistry,
    projection: &Projection,
    color: bool,
    width: usize,
) -> String {
    let headline = projection.headline(registry);
    let mut out = format!("{}\n", paint(headline.title, ANSI_BOLD, color));
    if let Some(description) = headline.description {
        out.push_str(&format!("{}\n", description));
    }
    out.push('\n');

    for stage in registry.stages() {
        let phase = projection.phase(stage.ordinal);
        let line = format!(
            "[{}] {:>2}. {:<18} {:<10}",
            phase_marker(phase),
            stage.ordinal + 1,
            stage.label,
            phase.as_str()
        );
        out.push_str(&paint(&line, phase_color(phase), color));
        if let Some(status) = projection.status_text(stage) {
            out.push_str(&format!(" {}", status));
        }
        out.push('\n');
    }

    let bar_width = width.saturating_sub(20).clamp(10, 50);
    out.push_str(&format!(
        "\nOverall Progress {}\n",
        format_progress_bar(projection.percent, bar_width)
    ));
    out
}

pub fn format_stages_table(registry: &StageRegistry) -> String {
    let mut out = format!("{:<4} {:<12} {:<18} {:<30} {}\n", "#", "Id", "Label", "Title", "Status");
    out.push_str(&format!("{}\n", "-".repeat(96)));
    for stage in registry.stages() {
        out.push_str(&format!(
            "{:<4} {:<12} {:<18} {:<30} {}\n",
            stage.ordinal, stage.id, stage.label, stage.title, stage.status
        ));
    }
    out
}

pub fn format_schedule_table(registry: &StageRegistry, schedule: &Schedule) -> String {
    let mut out = format!("{:<8} {:<4} {}\n", "At", "#", "Stage");
    out.push_str(&format!("{}\n", "-".repeat(44)));
    for entry in schedule.entries() {
        let title = registry
            .get(entry.target_ordinal)
            .map(|s| s.title.as_str())
            .unwrap_or("?");
        out.push_str(&format!(
            "{:<8} {:<4} {}\n",
            format_ms(entry.delay_ms),
            entry.target_ordinal,
            title
        ));
    }
    out.push_str(&format!("{:<8} {:<4} {}\n", format_ms(schedule.complete_ms()), "-", "Complete"));
    out
}

pub fn format_edges_table(registry: &StageRegistry, edges: &[Edge]) -> String {
    let mut out = format!(
        "{:<24} {:<20} {:<8} {:<18} {}\n",
        "Edge", "Caption", "Delay", "Start", "End"
    );
    out.push_str(&format!("{}\n", "-".repeat(90)));
    for edge in edges {
        let id = |ordinal: usize| registry.get(ordinal).map(|s| s.id.as_str()).unwrap_or("?");
        let name = format!("{} -> {}", id(edge.from_ordinal), id(edge.to_ordinal));
        out.push_str(&format!(
            "{:<24} {:<20} {:<8} {:<18} {}\n",
            name,
            edge.caption.as_deref().unwrap_or(""),
            format_ms(edge.activation_delay_ms),
            format!("({:.1}, {:.1})", edge.start.x, edge.start.y),
            format!("({:.1}, {:.1})", edge.end.x, edge.end.y),
        ));
    }
    out
}
