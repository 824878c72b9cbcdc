// Step-timeline state machine and everything that animates alongside it

pub mod timers;
pub mod observer;
pub mod scheduler;
pub mod external;
pub mod projection;
pub mod edge;
pub mod simulation;
pub mod player;

pub use timers::{Fired, TimerHandle, TimerQueue};
pub use observer::{EventLog, FlowControl, FlowEvent, FlowObserver};
pub use scheduler::TimelineScheduler;
pub use external::{ExternalTracker, ReportError, SkipPolicy};
pub use projection::{percent, project, Headline, Projection, StagePhase};
pub use edge::{anchors, derive_edges, Edge, EdgeLayer, DEFAULT_PACKET_TRAVEL_MS};
pub use simulation::{EdgeFrame, FlowFrame, FlowSimulation, SimulationError, StageFrame};
pub use player::{play, Clock, ManualClock, PlayOptions, PlayOutcome, SystemClock};
