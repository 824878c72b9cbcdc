// Error handling utilities for consistent error messages and exit codes

use std::process;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input: bad arguments, bad reports, bad config values.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Exit with an internal error (exit code >1)
/// Internal errors are for broken built-in tables and unexpected I/O failures.
pub fn internal_error(message: &str) -> ! {
    eprintln!("Internal error: {}", message);
    process::exit(2);
}

/// Validate a stage ordinal given on the command line against the stage count
pub fn validate_ordinal(ordinal_str: &str, stage_count: usize) -> Result<usize, String> {
    ordinal_str
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("Invalid stage: '{}'. Stage must be a number.", ordinal_str.trim()))
        .and_then(|ordinal| {
            if ordinal < stage_count {
                Ok(ordinal)
            } else {
                Err(format!(
                    "Invalid stage: {}. Stages run from 0 to {}.",
                    ordinal,
                    stage_count.saturating_sub(1)
                ))
            }
        })
}

/// Validate a playback speed factor
pub fn validate_speed(speed: f64) -> Result<f64, String> {
    if speed.is_finite() && speed > 0.0 {
        Ok(speed)
    } else {
        Err(format!("Invalid speed: {}. Speed must be a positive number.", speed))
    }
}
