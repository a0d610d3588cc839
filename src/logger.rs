//! `log` backend writing to the Playdate console.

use core::ffi::c_char;
use core::fmt::Write;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use ::playdate_sys as sys;
use sys::playdate_sys;

use crate::api::system_table;
use crate::ffi::CStrBuf;

/// Longest log line; longer ones are cut.
pub const LINE_CAPACITY: usize = 256;

const FORMAT: &[u8] = b"%s\0";

/// Sends each record to `logToConsole`, or to `error` for
/// [`Level::Error`]. Lines are formatted into a fixed buffer on the stack.
pub struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Install the logger. Called by the entry point on `Init`.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

/// Format a record the way it appears on the console.
pub fn format_line(record: &Record<'_>, line: &mut CStrBuf<LINE_CAPACITY>) {
    line.clear();
    let _ = match record.level() {
        Level::Error | Level::Warn | Level::Info => {
            write!(line, "[{}] {}", record.level(), record.args())
        }
        _ => write!(line, "[{}] {}: {}", record.level(), record.target(), record.args()),
    };
}

/// Write `line` to the console, or raise it as an error.
pub(crate) fn emit(system: &playdate_sys, line: &mut CStrBuf<LINE_CAPACITY>, error: bool) {
    let entry = if error { system.error } else { system.logToConsole };
    // No `invoke!` here: its missing-entry warning would log again.
    if let Some(f) = entry {
        let fmt: *const c_char = FORMAT.as_ptr().cast();
        // SAFETY: "%s" consumes exactly the one string argument.
        unsafe { f(fmt, line.as_ptr()) };
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        system_table().is_some()
    }

    fn log(&self, record: &Record<'_>) {
        let Some(system) = system_table() else {
            return;
        };
        let mut line = CStrBuf::default();
        format_line(record, &mut line);
        emit(system, &mut line, record.level() == Level::Error);
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn test_format_line() {
        let mut line = CStrBuf::default();
        format_line(
            &Record::builder()
                .level(Level::Warn)
                .target("game::save")
                .args(format_args!("slot {} full", 2))
                .build(),
            &mut line,
        );
        assert_eq!(line.as_str(), "[WARN] slot 2 full");

        format_line(
            &Record::builder()
                .level(Level::Debug)
                .target("game::save")
                .args(format_args!("wrote {} bytes", 14))
                .build(),
            &mut line,
        );
        assert_eq!(line.as_str(), "[DEBUG] game::save: wrote 14 bytes");
    }

    #[test]
    fn test_long_lines_are_cut() {
        let mut line = CStrBuf::default();
        let long = "x".repeat(LINE_CAPACITY * 2);
        format_line(
            &Record::builder()
                .level(Level::Info)
                .args(format_args!("{}", long))
                .build(),
            &mut line,
        );
        assert_eq!(line.as_str().len(), LINE_CAPACITY - 1);
    }
}
