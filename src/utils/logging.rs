//! Conditional logging macros gated by a module-level `ENABLE_LOGS` flag and
//! routed to a module-level `LOG_TARGET`.
//!
//! Usage:
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TARGET: &str = "stylesync::tryon";
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("countdown started at {}", 8);
//! ```
//!
//! Filter per target with `RUST_LOG`, e.g. `RUST_LOG=stylesync::outfit=debug`.

/// Debug-level log routed to the calling module's `LOG_TARGET`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!(target: LOG_TARGET, $($arg)*);
        }
    };
}

/// Info-level log routed to the calling module's `LOG_TARGET`.
///
/// The calling module must define both `ENABLE_LOGS: bool` and `LOG_TARGET: &str`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: LOG_TARGET, $($arg)*);
        }
    };
}

/// Warn-level log routed to the calling module's `LOG_TARGET`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: LOG_TARGET, $($arg)*);
        }
    };
}

/// Error-level log routed to the calling module's `LOG_TARGET`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!(target: LOG_TARGET, $($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static EVALUATED: AtomicUsize = AtomicUsize::new(0);

    fn counted() -> &'static str {
        EVALUATED.fetch_add(1, Ordering::SeqCst);
        "detail"
    }

    mod silenced {
        const ENABLE_LOGS: bool = false;
        const LOG_TARGET: &str = "stylesync::silenced";

        pub fn emit() {
            crate::log_error!("failed: {}", super::counted());
            crate::log_warn!("warned: {}", super::counted());
        }
    }

    mod enabled {
        const ENABLE_LOGS: bool = true;
        const LOG_TARGET: &str = "stylesync::enabled";

        pub fn emit() {
            crate::log_error!("failed: {}", super::counted());
        }
    }

    #[test]
    fn disabled_modules_skip_every_level() {
        log::set_max_level(log::LevelFilter::Trace);

        silenced::emit();
        assert_eq!(EVALUATED.load(Ordering::SeqCst), 0);

        enabled::emit();
        assert_eq!(EVALUATED.load(Ordering::SeqCst), 1);
    }
}
