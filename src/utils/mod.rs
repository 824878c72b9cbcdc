pub mod duration;

pub use duration::{format_ms, parse_duration_ms};
