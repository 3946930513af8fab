//! Verbosity-gated logging
//!
//! Every cache carries its own [`LogLevel`](crate::config::LogLevel). The
//! `cache_log!` macro drops events below that level before they reach `tracing`,
//! so subscriber filters still apply on top.

/// Emits a `tracing` event if `$verbosity` enables `$level`.
///
/// `$level` is one of `Debug`, `Info`, `Warn`, `Error`.
macro_rules! cache_log {
    ($verbosity:expr, Debug, $($arg:tt)+) => {
        if $verbosity.enables($crate::config::LogLevel::Debug) {
            ::tracing::debug!($($arg)+);
        }
    };
    ($verbosity:expr, Info, $($arg:tt)+) => {
        if $verbosity.enables($crate::config::LogLevel::Info) {
            ::tracing::info!($($arg)+);
        }
    };
    ($verbosity:expr, Warn, $($arg:tt)+) => {
        if $verbosity.enables($crate::config::LogLevel::Warn) {
            ::tracing::warn!($($arg)+);
        }
    };
    ($verbosity:expr, Error, $($arg:tt)+) => {
        if $verbosity.enables($crate::config::LogLevel::Error) {
            ::tracing::error!($($arg)+);
        }
    };
}
