#![allow(dead_code)]
#![macro_use]

macro_rules! debug {
    (target: $target:expr, $($arg:tt)+) => (
        #[cfg(feature = "logging")]
        log::debug!(target: $target, $($arg)+);
    );
    ($($arg:tt)+) => (
        #[cfg(feature = "logging")]
        log::debug!($($arg)+);
    )
}

macro_rules! trace {
    (target: $target:expr, $($arg:tt)+) => (
        #[cfg(feature = "logging")]
        log::trace!(target: $target, $($arg)+);
    );
    ($($arg:tt)+) => (
        #[cfg(feature = "logging")]
        log::trace!($($arg)+);
    )
}

/// Last words before the process goes down. Never compiled out: the line always
/// goes to stderr, since a logger may not be installed (or may never flush)
/// before the abort. With `logging` it is also logged at error level.
macro_rules! fatal {
    ($($arg:tt)+) => (
        #[cfg(feature = "logging")]
        log::error!(target: "ehvec", $($arg)+);
        eprintln!("ehvec: {}", format_args!($($arg)+));
    )
}
