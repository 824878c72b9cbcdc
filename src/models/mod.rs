// Core data models for flowsim
// Stages, schedules, sessions and the node layout they are drawn on

pub mod stage;
pub mod schedule;
pub mod session;
pub mod layout;

pub use stage::*;
pub use schedule::*;
pub use session::*;
pub use layout::*;
