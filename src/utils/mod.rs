//! Utilities: leveled stderr logging with a dynamic global level.
//!
//! Key items:
//!   init_logging / derive_level
//!   log_debug! macro
//!
//! Logs go to stderr so stdout stays reserved for tool output.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};

/// Logging helpers.
pub mod logging {
    use super::*;

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
    pub enum LogLevel {
        Error = 0,
        Info = 1,
        Debug = 2,
    }

    impl LogLevel {
        pub fn as_str(&self) -> &'static str {
            match self {
                LogLevel::Error => "ERROR",
                LogLevel::Info => "INFO",
                LogLevel::Debug => "DEBUG",
            }
        }
    }

    static GLOBAL_LEVEL: OnceLock<AtomicU8> = OnceLock::new();

    fn inner_cell() -> &'static AtomicU8 {
        GLOBAL_LEVEL.get_or_init(|| AtomicU8::new(LogLevel::Info as u8))
    }

    pub fn init_logging(level: LogLevel) {
        set_log_level(level);
    }

    pub fn set_log_level(level: LogLevel) {
        inner_cell().store(level as u8, Ordering::Relaxed);
    }

    pub fn current_log_level() -> LogLevel {
        match inner_cell().load(Ordering::Relaxed) {
            0 => LogLevel::Error,
            1 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    pub fn derive_level(verbose: bool) -> LogLevel {
        if verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }

    fn should_emit(level: LogLevel) -> bool {
        level <= current_log_level()
    }

    pub fn log(level: LogLevel, msg: impl AsRef<str>) {
        if should_emit(level) {
            eprintln!("[{}] {}", level.as_str(), msg.as_ref());
        }
    }

    pub fn debug(msg: impl AsRef<str>) {
        log(LogLevel::Debug, msg);
    }

    #[macro_export]
    macro_rules! log_debug {
        ($($t:tt)*) => { $crate::utils::logging::debug(format!($($t)*)) };
    }
}

pub use logging::{derive_level, init_logging};

#[cfg(test)]
mod tests {
    use super::logging::*;

    #[test]
    fn verbose_raises_level() {
        assert_eq!(derive_level(false), LogLevel::Info);
        assert_eq!(derive_level(true), LogLevel::Debug);
    }

    #[test]
    fn level_ordering() {
        assert!(LogLevel::Error < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
    }
}
