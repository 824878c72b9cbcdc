use flowsim::cli::{internal_error, run, user_error};
use flowsim::models::{LayoutError, RegistryError, ScheduleError};

/// Broken built-in tables and I/O failures are internal; everything else is the user's input
fn is_internal(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| {
        cause.is::<RegistryError>()
            || cause.is::<ScheduleError>()
            || cause.is::<LayoutError>()
            || cause.is::<std::io::Error>()
    })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    #[cfg(windows)]
    let _ = enable_ansi_support::enable_ansi_support();

    if let Err(e) = run() {
        if is_internal(&e) {
            // Show error chain if available
            let mut message = e.to_string();
            let mut source = e.source();
            if source.is_some() {
                message.push_str("\n\nCaused by:");
                let mut indent = 1;
                while let Some(err) = source {
                    message.push_str(&format!("\n{:indent$}  {}", "", err));
                    source = err.source();
                    indent += 1;
                }
            }
            internal_error(&message);
        } else {
            user_error(&format!("{:#}", e));
        }
    }
}
