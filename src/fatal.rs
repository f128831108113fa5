//! The unrecoverable end of the lifecycle: an element that fails to be destroyed.
//!
//! Destruction is not allowed to fail. When it does anyway there is no state
//! to go back to, so the process is terminated after one line of report.

use std::fmt::{self, Debug, Display};

/// Why a teardown was running when an element refused to be destroyed.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Teardown<'a> {
    /// `destroy_array` called on a fully built array.
    Primary,
    /// Rolling back after `construct_one` returned this failure.
    Rollback { pending: &'a dyn Debug },
    /// Rolling back while a panic raised by `construct_one` unwinds.
    Unwinding,
}

#[derive(Debug)]
pub(crate) struct Fatal<'a> {
    index: usize,
    teardown: Teardown<'a>,
    // `None` when `destroy_one` panicked instead of returning a failure
    failure: Option<&'a dyn Debug>,
}

impl<'a> Fatal<'a> {
    pub fn failed(index: usize, teardown: Teardown<'a>, failure: &'a dyn Debug) -> Fatal<'a> {
        Fatal { index, teardown, failure: Some(failure) }
    }

    pub fn panicked(index: usize, teardown: Teardown<'a>) -> Fatal<'a> {
        Fatal { index, teardown, failure: None }
    }

    /// A second failure raised while the first one was still propagating.
    pub fn is_double_failure(&self) -> bool {
        !matches!(self.teardown, Teardown::Primary)
    }
}

impl Display for Fatal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_double_failure() {
            f.write_str("double failure: ")?;
        }
        match self.failure {
            Some(failure) => write!(f, "element {} failed to destroy ({:?})", self.index, failure)?,
            None => write!(f, "element {} panicked while being destroyed", self.index)?,
        }
        match self.teardown {
            Teardown::Primary => Ok(()),
            Teardown::Rollback { pending } => write!(f, " while rolling back construction failure {:?}", pending),
            Teardown::Unwinding => f.write_str(" while unwinding from a construction panic"),
        }
    }
}

impl std::error::Error for Fatal<'_> {}

/// Reports `fatal` and aborts the process. Nothing is unwound past this point.
#[cold]
#[inline(never)]
pub(crate) fn terminate(fatal: Fatal<'_>) -> ! {
    fatal!("{}", fatal);
    std::process::abort()
}

/// Armed around a single `destroy_one` call. If the call unwinds instead of
/// returning, the bomb's drop terminates the process on the way out.
pub(crate) struct AbortOnUnwind<'a> {
    index: usize,
    teardown: Teardown<'a>,
}

impl<'a> AbortOnUnwind<'a> {
    #[inline(always)]
    pub fn arm(index: usize, teardown: Teardown<'a>) -> AbortOnUnwind<'a> {
        AbortOnUnwind { index, teardown }
    }

    #[inline(always)]
    pub fn disarm(self) {
        std::mem::forget(self);
    }
}

impl Drop for AbortOnUnwind<'_> {
    fn drop(&mut self) {
        terminate(Fatal::panicked(self.index, self.teardown))
    }
}
