// vim: tw=80
//! Framework error kinds.
//!
//! Every failure the core can produce is one variant of [`Error`].  The
//! `try_`-prefixed verification methods return these; everything else
//! surfaces them by panicking with the `Display` rendering, so tests can
//! assert on them with `#[should_panic(expected = "...")]`.

use thiserror::Error;

/// All the ways a mock can fail the running test.
///
/// Stubbed panics programmed with
/// [`panics`](crate::ExpectationGuard::panics) are not represented here;
/// they propagate the caller-supplied payload unchanged.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A call reached a mock with no matching, non-exhausted expectation,
    /// and neither auto-stubbing nor partial delegation applied.
    #[error("unexpected invocation on {mock}: {call}{details}")]
    UnexpectedInvocation {
        /// Display name of the mock that received the call.
        mock: String,
        /// Rendering of the offending call, method name and arguments.
        call: String,
        /// Registered expectations and near-miss matcher reports.
        details: String,
    },

    /// A call reached proxy glue whose backing interception was torn down
    /// or never registered.  Always a lifecycle bug, never a user error.
    #[error("zombie call on {target}: {call} reached proxy machinery with \
             no live interception")]
    ZombieMethod {
        /// Mock name, or the declaring type name for static dispatch.
        target: String,
        /// Rendering of the call that hit the dead interception.
        call: String,
    },

    /// Strict-ordering violation found at verification time.
    #[error("calls out of order on {mock} in group {group:?}: expected \
             {expected_first} before {actual_first}")]
    OutOfOrder {
        /// Display name of the mock being verified.
        mock: String,
        /// Ordering group in which the inversion was found.
        group: String,
        /// Rendering of the call that should have come first.
        expected_first: String,
        /// Rendering of the call that actually came first.
        actual_first: String,
    },

    /// An expectation or check that could never be satisfied as written:
    /// unknown method, matcher arity mismatch, unreachable cardinality,
    /// more one-shot behaviors than the cardinality admits, or a matcher
    /// applied to an argument of the wrong concrete type.
    #[error("malformed expectation on {target}: {reason}")]
    MalformedExpectation {
        /// `MockName.method` the expectation was registered against.
        target: String,
        /// What made it unsatisfiable.
        reason: String,
    },

    /// One or more expectations did not reach their minimum call count.
    #[error("verification failed for {mock}:{details}")]
    FailedVerification {
        /// Display name of the mock being verified.
        mock: String,
        /// One line per unsatisfied expectation.
        details: String,
    },

    /// A post-hoc check counted a different number of matching calls than
    /// its cardinality allows.
    #[error("check failed for {mock}: {details}")]
    FailedCheck {
        /// Display name of the checked mock.
        mock: String,
        /// The check's pattern, expected range, and observed count.
        details: String,
    },

    /// `check_nothing_else_happened` found recorded calls claimed by no
    /// expectation and no check.
    #[error("unaccounted invocations on {mocks}:{details}")]
    UncheckedInvocations {
        /// Names of the offending mocks.
        mocks: String,
        /// One line per unclaimed call.
        details: String,
    },
}
