// `drive`: stages reported line by line on stdin

use crate::cli::commands::ConsoleObserver;
use crate::cli::output::format_failure;
use crate::config::Config;
use crate::models::{Layout, Schedule, StageRegistry};
use crate::timeline::{Clock, ExternalTracker, FlowSimulation, SkipPolicy, SystemClock};
use anyhow::{Context, Result};
use std::io::{self, BufRead};

/// One parsed stdin line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveCommand {
    Report(usize),
    Complete,
    Fail(String),
    Reset,
    Start,
}

/// Parse a single line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_drive_line(line: &str) -> Result<Option<DriveCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "complete" | "done" => DriveCommand::Complete,
        "fail" => {
            let message = if rest.is_empty() { "unknown error" } else { rest };
            DriveCommand::Fail(message.to_string())
        }
        "reset" => DriveCommand::Reset,
        "start" => DriveCommand::Start,
        _ => match word.parse::<usize>() {
            Ok(ordinal) if rest.is_empty() => DriveCommand::Report(ordinal),
            _ => {
                return Err(format!(
                    "Unrecognized line '{}'. Expected a stage number, complete, fail <message>, reset or start.",
                    line
                ))
            }
        },
    };
    Ok(Some(command))
}

pub fn handle_drive(skip: bool, color: bool, json: bool, config: &Config) -> Result<()> {
    let registry = StageRegistry::serverless_order_flow();
    let layout = Layout::serverless_order_flow(&registry)
        .context("Failed to build diagram layout")?;
    let policy = if skip { SkipPolicy::Skip } else { SkipPolicy::Visit };
    let tracker = ExternalTracker::new(registry.clone(), policy);
    let mut sim = FlowSimulation::external(
        tracker,
        &Schedule::serverless_order_flow(),
        &layout,
        config.packet_travel_ms,
    );
    let mut observer = ConsoleObserver::new(registry.len(), color, json);
    let clock = SystemClock::new();

    sim.activate();
    let mut invalid = 0usize;

    let stdin = io::stdin();
    for (index, line) in stdin.lock().lines().enumerate() {
        let line = line.context("Failed to read stdin")?;
        let line_no = index + 1;
        sim.advance_to(clock.now_ms(), &mut observer);

        let command = match parse_drive_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("Error: line {}: {}", line_no, e);
                invalid += 1;
                continue;
            }
        };
        log::debug!("drive line {}: {:?}", line_no, command);

        match command {
            DriveCommand::Report(ordinal) => {
                if let Err(e) = sim.report(ordinal, &mut observer) {
                    eprintln!("Error: line {}: {}", line_no, e);
                    invalid += 1;
                }
            }
            DriveCommand::Complete => match sim.complete(&mut observer) {
                Ok(true) => {
                    if !config.keep_active {
                        sim.deactivate();
                    }
                }
                Ok(false) => {
                    eprintln!("Error: line {}: flow is not running", line_no);
                    invalid += 1;
                }
                Err(e) => {
                    eprintln!("Error: line {}: {}", line_no, e);
                    invalid += 1;
                }
            },
            DriveCommand::Fail(message) => {
                let message = sim.fail(&message)?;
                if json {
                    println!(
                        "{}",
                        serde_json::json!({ "event": "failed", "at_ms": sim.now_ms(), "message": message })
                    );
                } else {
                    eprintln!("{}", format_failure(&message, color));
                }
            }
            DriveCommand::Reset => sim.deactivate(),
            DriveCommand::Start => {
                if !sim.activate() {
                    eprintln!("Error: line {}: flow is already running", line_no);
                    invalid += 1;
                }
            }
        }
    }

    log::info!("drive finished in state {}", sim.session().state.as_str());
    if invalid > 0 {
        anyhow::bail!("{} invalid line(s) on stdin", invalid);
    }
    Ok(())
}
