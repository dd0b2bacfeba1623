//! Shared models for dangling-delegation scanning.
//!
//! Everything in here is plain data: hostnames and their normalization,
//! the provider-pattern registry, the cosmetic provider table, scan
//! results and the runtime [`config::Config`].

pub mod config;
pub mod domain;
pub mod pattern;
pub mod provider;
pub mod scan;

#[doc(hidden)]
pub use tracing as __tracing;

/// Target used by [`success!`] so terminal formatters can style it apart from plain info.
pub const SUCCESS_TARGET: &str = "dangle::success";

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::__tracing::info!($($arg)*)
    };
}

#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::__tracing::info!(target: "dangle::success", $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::__tracing::warn!($($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::__tracing::error!($($arg)*)
    };
}
