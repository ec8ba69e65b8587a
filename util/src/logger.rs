//! Generic logger utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::{self, info};
use fern;
use colored::{ColoredString, Colorize};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Expected a log level of at least `INFO` for `{0}`, found `{1}`")]
    InvalidTargetLogLevel(&'static str, log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// Records are written both to stdout and to the session's log file, each
/// prefixed with the number of seconds since the session epoch.
///
/// `targets` overrides the level of individual modules, for example to trace
/// every control tick without tracing everything else.
///
/// # Notes
///
/// - `min_level` and every override must be at least `log::Level::Info`, so
///   that mode transitions and faults always reach the log.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: self::LevelFilter,
    targets: &[(&'static str, self::LevelFilter)],
    session: &session::Session
) -> Result<(), LoggerInitError> {

    check_levels(min_level, targets)?;

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {

            // If debug or trace include the target, otherwise don't include it
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}: {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            }
            else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    message
                ))
            }

        })
        .level(min_level);

    for (target, level) in targets.iter() {
        dispatch = dispatch.level_for(*target, *level);
    }

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    for (target, level) in targets.iter() {
        info!("    Log level for {}: {:?}", target, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_levels(
    min_level: log::LevelFilter,
    targets: &[(&'static str, log::LevelFilter)]
) -> Result<(), LoggerInitError> {
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    match targets.iter().find(|(_, level)| *level < log::Level::Info) {
        Some((target, level)) => Err(LoggerInitError::InvalidTargetLogLevel(*target, *level)),
        None => Ok(())
    }
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_check_levels() {
        let tick = "ctrl_lib::ctrl_loop";

        assert!(check_levels(LevelFilter::Info, &[]).is_ok());
        assert!(check_levels(LevelFilter::Debug, &[(tick, LevelFilter::Trace)]).is_ok());

        match check_levels(LevelFilter::Warn, &[]) {
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn)) => (),
            other => panic!("Expected invalid min level, got {:?}", other)
        }

        match check_levels(LevelFilter::Debug, &[(tick, LevelFilter::Off)]) {
            Err(LoggerInitError::InvalidTargetLogLevel(t, LevelFilter::Off)) => assert_eq!(t, tick),
            other => panic!("Expected invalid target level, got {:?}", other)
        }
    }
}
