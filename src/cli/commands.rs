use clap::{Parser, Subcommand};
use crate::config::Config;
use crate::models::{Layout, Schedule, Stage, StageRegistry};
use crate::timeline::{
    derive_edges, play, project, FlowControl, FlowEvent, FlowObserver, FlowSimulation,
    ManualClock, PlayOptions, PlayOutcome, SystemClock, TimelineScheduler,
};
use crate::cli::drive::handle_drive;
use crate::cli::error::{user_error, validate_ordinal, validate_speed};
use crate::cli::output::{
    format_completion, format_edges_table, format_frame, format_progress_bar, format_projection,
    format_schedule_table, format_stage_change, format_stages_table, get_terminal_width, is_tty,
};
use crate::utils::{format_ms, parse_duration_ms};
use anyhow::{Context, Result};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "flowsim")]
#[command(about = "Serverless Order Flow Simulator - animates a request through a chain of cloud services")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play the scripted flow in real time
    Run {
        /// Playback speed factor (2 plays twice as fast)
        #[arg(long)]
        speed: Option<f64>,
        /// Stop after this much flow time (e.g. "3.6s", "3600")
        #[arg(long)]
        until: Option<String>,
        /// Emit a progress frame at least this often (e.g. "250ms")
        #[arg(long)]
        frame: Option<String>,
        /// Leave the finished flow active instead of resetting it
        #[arg(long)]
        keep_active: bool,
        /// One JSON object per event
        #[arg(long)]
        json: bool,
    },
    /// Show the diagram at a point in the flow without waiting
    Simulate {
        /// Flow time to jump to (e.g. "3.6s", "3600")
        #[arg(long)]
        at: String,
        /// Playback speed factor applied to the schedule
        #[arg(long)]
        speed: Option<f64>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// List the stages of the flow
    Stages {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show when each stage fires
    Schedule {
        /// Playback speed factor applied to the schedule
        #[arg(long)]
        speed: Option<f64>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show stage phases and overall progress for a current stage
    Progress {
        /// Current stage ordinal (omit for "nothing started")
        ordinal: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show link geometry between stages
    Edges {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Track stages reported on stdin (one per line: N, complete, fail <msg>, reset, start)
    Drive {
        /// Only announce reported stages, not the ones skipped over
        #[arg(long)]
        skip: bool,
        /// One JSON object per event
        #[arg(long)]
        json: bool,
    },
}

/// Prints each stage change and the completion as they happen
pub struct ConsoleObserver {
    stage_count: usize,
    color: bool,
    json: bool,
}

impl ConsoleObserver {
    pub fn new(stage_count: usize, color: bool, json: bool) -> Self {
        Self { stage_count, color, json }
    }

    fn print_json(&self, event: &FlowEvent, percent: u8) {
        if let Ok(mut value) = serde_json::to_value(event) {
            value["percent"] = serde_json::json!(percent);
            value["wall"] = serde_json::json!(chrono::Utc::now().to_rfc3339());
            println!("{}", value);
        }
    }
}

impl FlowObserver for ConsoleObserver {
    fn on_stage_change(&mut self, stage: &Stage, control: &mut FlowControl) {
        let percent = project(Some(stage.ordinal), self.stage_count).percent;
        if self.json {
            let event = FlowEvent::StageChanged {
                at_ms: control.now_ms(),
                ordinal: stage.ordinal,
                id: stage.id.clone(),
                name: stage.title.clone(),
                description: stage.description.clone(),
            };
            self.print_json(&event, percent);
        } else {
            println!(
                "{}",
                format_stage_change(
                    control.now_ms(),
                    stage.ordinal,
                    self.stage_count,
                    &stage.title,
                    &stage.description,
                    percent,
                    self.color
                )
            );
        }
    }

    fn on_complete(&mut self, control: &mut FlowControl) {
        if self.json {
            self.print_json(&FlowEvent::Completed { at_ms: control.now_ms() }, 100);
        } else {
            println!("{}", format_completion(control.now_ms(), self.color));
        }
    }
}

/// Resolve the speed from the flag or the config, rejecting nonsense
fn resolve_speed(flag: Option<f64>, config: &Config) -> f64 {
    match validate_speed(flag.unwrap_or(config.speed)) {
        Ok(speed) => speed,
        Err(e) => user_error(&e),
    }
}

fn parse_time_arg(value: &str, what: &str) -> u64 {
    match parse_duration_ms(value) {
        Ok(ms) => ms,
        Err(e) => user_error(&format!("Invalid {} '{}': {}", what, value, e)),
    }
}

/// Build the default serverless flow with its schedule scaled by `speed`
pub fn build_simulation(speed: f64, config: &Config) -> Result<FlowSimulation> {
    let registry = StageRegistry::serverless_order_flow();
    let schedule = Schedule::serverless_order_flow()
        .scaled(speed)
        .context("Failed to scale schedule")?;
    let scheduler = TimelineScheduler::new(registry.clone(), schedule)
        .context("Failed to build timeline scheduler")?;
    let layout = Layout::serverless_order_flow(&registry)
        .context("Failed to build diagram layout")?;
    Ok(FlowSimulation::autonomous(scheduler, &layout, config.packet_travel_ms))
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;
    let color = config.color.enabled(is_tty());

    match cli.command {
        Commands::Run { speed, until, frame, keep_active, json } => {
            let speed = resolve_speed(speed, &config);
            let options = PlayOptions {
                frame_ms: frame
                    .map(|f| parse_time_arg(&f, "frame interval"))
                    .unwrap_or(config.frame_ms),
                until_ms: until.map(|u| parse_time_arg(&u, "time limit")),
                keep_active: keep_active || config.keep_active,
            };
            handle_run(speed, &options, color, json, &config)
        }
        Commands::Simulate { at, speed, json } => {
            let speed = resolve_speed(speed, &config);
            let at_ms = parse_time_arg(&at, "time");
            handle_simulate(at_ms, speed, color, json, &config)
        }
        Commands::Stages { json } => handle_stages(json),
        Commands::Schedule { speed, json } => {
            let speed = resolve_speed(speed, &config);
            handle_schedule(speed, json)
        }
        Commands::Progress { ordinal, json } => handle_progress(ordinal, color, json),
        Commands::Edges { json } => handle_edges(json),
        Commands::Drive { skip, json } => handle_drive(skip, color, json, &config),
    }
}

fn handle_run(speed: f64, options: &PlayOptions, color: bool, json: bool, config: &Config) -> Result<()> {
    let mut sim = build_simulation(speed, config)?;
    let mut observer = ConsoleObserver::new(sim.registry().len(), color, json);
    let mut run_id: Option<Uuid> = None;
    let frame_ticks = options.frame_ms > 0;
    let width = get_terminal_width();

    let outcome = play(&mut sim, &mut SystemClock::new(), options, &mut observer, |frame| {
        run_id = run_id.or(frame.run_id);
        if frame_ticks && !json {
            let bar_width = width.saturating_sub(30).clamp(10, 50);
            println!(
                "[{:>6}] {}",
                format_ms(frame.at_ms),
                format_progress_bar(frame.percent, bar_width)
            );
        }
    });

    let run = run_id.map(|id| id.to_string()).unwrap_or_default();
    match outcome {
        PlayOutcome::Completed { at_ms } => {
            log::info!("run {} completed at {}ms", run, at_ms);
        }
        PlayOutcome::TimeLimit { at_ms } => {
            if json {
                println!("{}", serde_json::json!({ "event": "stopped", "at_ms": at_ms, "run_id": run }));
            } else {
                println!("[{:>6}] Stopped before completion", format_ms(at_ms));
            }
        }
        PlayOutcome::Stopped { at_ms } => {
            log::info!("run {} stopped at {}ms", run, at_ms);
        }
        PlayOutcome::AlreadyRunning => {
            anyhow::bail!("Flow is already running");
        }
    }
    Ok(())
}

fn handle_simulate(at_ms: u64, speed: f64, color: bool, json: bool, config: &Config) -> Result<()> {
    let mut sim = build_simulation(speed, config)?;
    let options = PlayOptions {
        frame_ms: 0,
        until_ms: Some(at_ms),
        keep_active: true,
    };
    let mut clock = ManualClock::new();
    let mut last = None;
    // Play against a clock that jumps straight to each deadline
    let outcome = play(&mut sim, &mut clock, &options, &mut (), |frame| last = Some(frame.clone()));

    let frame = match outcome {
        // Completion stops playback early; the finished run stays on screen up to `at_ms`
        PlayOutcome::Completed { .. } => {
            sim.advance_to(at_ms, &mut ());
            sim.frame()
        }
        _ => last.ok_or_else(|| anyhow::anyhow!("Simulation produced no frame"))?,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&frame)?);
    } else {
        print!("{}", format_frame(&frame, color, get_terminal_width()));
    }
    Ok(())
}

fn handle_stages(json: bool) -> Result<()> {
    let registry = StageRegistry::serverless_order_flow();
    if json {
        println!("{}", serde_json::to_string_pretty(registry.stages())?);
    } else {
        print!("{}", format_stages_table(&registry));
    }
    Ok(())
}

fn handle_schedule(speed: f64, json: bool) -> Result<()> {
    let registry = StageRegistry::serverless_order_flow();
    let schedule = Schedule::serverless_order_flow()
        .scaled(speed)
        .context("Failed to scale schedule")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        print!("{}", format_schedule_table(&registry, &schedule));
    }
    Ok(())
}

fn handle_progress(ordinal: Option<String>, color: bool, json: bool) -> Result<()> {
    let registry = StageRegistry::serverless_order_flow();
    let current = match ordinal {
        Some(value) => match validate_ordinal(&value, registry.len()) {
            Ok(ordinal) => Some(ordinal),
            Err(e) => user_error(&e),
        },
        None => None,
    };

    let projection = project(current, registry.len());
    let headline = projection.headline(&registry);

    if json {
        let stages: Vec<_> = registry
            .stages()
            .iter()
            .map(|stage| {
                serde_json::json!({
                    "ordinal": stage.ordinal,
                    "id": stage.id,
                    "phase": projection.phase(stage.ordinal),
                    "status": projection.status_text(stage),
                })
            })
            .collect();
        let out = serde_json::json!({
            "current": current,
            "percent": projection.percent,
            "title": headline.title,
            "description": headline.description,
            "stages": stages,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print!("{}", format_projection(&registry, &projection, color, get_terminal_width()));
    Ok(())
}

fn handle_edges(json: bool) -> Result<()> {
    let registry = StageRegistry::serverless_order_flow();
    let layout = Layout::serverless_order_flow(&registry)
        .context("Failed to build diagram layout")?;
    let edges = derive_edges(&registry, &Schedule::serverless_order_flow(), &layout);
    if json {
        println!("{}", serde_json::to_string_pretty(&edges)?);
    } else {
        print!("{}", format_edges_table(&registry, &edges));
    }
    Ok(())
}
