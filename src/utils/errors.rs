use std::fmt;

use derive_more::Display;
use log::Level;
use tracerr::{Trace, Traced};

/// Error which can be reported by its name.
pub trait Named {
    /// Returns name of this error.
    fn name(&self) -> &'static str;

    /// Returns [`Level`] this error is logged with once reported.
    #[inline]
    fn level(&self) -> Level {
        Level::Error
    }
}

/// Report of an error nobody awaits, so it can only be logged.
///
/// Errors returned by background watchers are converted into it and printed.
#[derive(Clone, Debug, Display)]
#[display(fmt = "{}: {}\n{}", name, message, trace)]
pub struct ErrorReport {
    level: Level,
    name: &'static str,
    message: String,
    trace: Trace,
}

impl ErrorReport {
    /// Logs this [`ErrorReport`] with its [`Level`].
    pub fn print(&self) {
        log::log!(self.level, "{}", self);
    }

    /// Returns [`Level`] this [`ErrorReport`] is logged with.
    #[inline]
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    /// Returns name of the reported error.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns message of the reported error.
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns trace information of the reported error.
    #[inline]
    #[must_use]
    pub fn trace(&self) -> &Trace {
        &self.trace
    }
}

impl<E: Named + fmt::Display> From<(E, Trace)> for ErrorReport {
    fn from((err, trace): (E, Trace)) -> Self {
        Self {
            level: err.level(),
            name: err.name(),
            message: err.to_string(),
            trace,
        }
    }
}

impl<E: Named + fmt::Display> From<Traced<E>> for ErrorReport {
    #[inline]
    fn from(traced: Traced<E>) -> Self {
        Self::from(traced.into_parts())
    }
}
