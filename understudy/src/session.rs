// vim: tw=80
//! Sessions: mock creation, the shared ledger, and verification,
//! including the automatic pass when the session is dropped.

use std::{
    backtrace::Backtrace,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    thread,
};

use tracing::debug;

use crate::{
    call::{CallKind, TypeDescriptor},
    dispatch::{Mock, MockCore, MockKind},
    error::Error,
    expectation::{Cardinality, ExpectationGuard},
    intercepts,
    ledger::{InvocationView, Ledger, MockId},
    verify::{self, Check, VerifyScope},
};

/// Per-mock behavior switches.
///
/// An explicit record with named boolean fields; build one with the
/// chainable setters or fill it in directly.
///
/// ```
/// use understudy::MockOptions;
///
/// let options = MockOptions::new().strictly_ordered().auto_stubbing();
/// assert!(options.strictly_ordered);
/// assert!(!options.partial);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct MockOptions {
    /// Verification additionally audits that calls arrived in the
    /// registration order of their expectations.
    pub strictly_ordered: bool,
    /// Unmatched calls produce the method's default return value instead
    /// of failing.
    pub auto_stubbing: bool,
    /// Unmatched calls delegate to the real implementation.  Set
    /// implicitly by [`Session::spy`]; meaningless without glue that
    /// supplies one.
    pub partial: bool,
    /// Capture a backtrace at mock creation and render it into zombie
    /// and verification failures.
    pub tracing: bool,
}

impl MockOptions {
    pub fn new() -> MockOptions {
        MockOptions::default()
    }

    /// Enable strict-order verification.
    pub fn strictly_ordered(mut self) -> MockOptions {
        self.strictly_ordered = true;
        self
    }

    /// Enable auto-stubbing of unmatched calls.
    pub fn auto_stubbing(mut self) -> MockOptions {
        self.auto_stubbing = true;
        self
    }

    /// Enable partial delegation of unmatched calls.
    pub fn partial(mut self) -> MockOptions {
        self.partial = true;
        self
    }

    /// Enable creation backtraces.
    pub fn tracing(mut self) -> MockOptions {
        self.tracing = true;
        self
    }
}

/// Shared state behind a [`Session`] and all of its mocks.
pub(crate) struct SessionCore {
    pub(crate) ledger: Ledger,
    pub(crate) mocks: Mutex<Vec<Arc<MockCore>>>,
    pub(crate) next_mock_id: AtomicU64,
    pub(crate) next_check_ordinal: AtomicU64,
}

/// One test's mocking context.
///
/// A session creates mocks, owns the invocation ledger they share, and
/// verifies them.  Dropping the session verifies every mock that is
/// still active and was never verified explicitly, so a test that
/// forgets to call [`verify`](Session::verify) still fails when an
/// expectation went unmet.  Mocks outlive their session only as zombies:
/// any later call through their glue fails loudly.
pub struct Session {
    core: Arc<SessionCore>,
}

impl Default for Session {
    fn default() -> Session {
        Session::new()
    }
}

impl Session {
    pub fn new() -> Session {
        Session {
            core: Arc::new(SessionCore {
                ledger: Ledger::new(),
                mocks: Mutex::new(Vec::new()),
                next_mock_id: AtomicU64::new(0),
                next_check_ordinal: AtomicU64::new(0),
            }),
        }
    }

    fn create(
        &self,
        name: Option<String>,
        descriptor: &'static TypeDescriptor,
        options: MockOptions,
        kind: MockKind,
    ) -> Mock {
        let id = self.core.next_mock_id.fetch_add(1, Ordering::Relaxed);
        let name =
            name.unwrap_or_else(|| format!("{}#{id}", descriptor.type_name));
        let created_at = options.tracing.then(Backtrace::force_capture);
        let core = Arc::new(MockCore {
            id: MockId(id),
            name,
            descriptor,
            options,
            kind,
            active: AtomicBool::new(true),
            auto_verify: AtomicBool::new(true),
            registry: Mutex::new(Vec::new()),
            session: Arc::downgrade(&self.core),
            created_at,
        });
        self.core.mocks.lock().unwrap().push(Arc::clone(&core));
        debug!(
            target: "understudy::session",
            mock = %core.name,
            r#type = core.descriptor.type_name,
            "mock created"
        );
        Mock { core }
    }

    /// Create an instance mock with an auto-generated name,
    /// `TypeName#k`.
    pub fn mock(
        &self,
        descriptor: &'static TypeDescriptor,
        options: MockOptions,
    ) -> Mock {
        self.create(None, descriptor, options, MockKind::Instance)
    }

    /// Create an instance mock with an explicit display name.
    pub fn named_mock(
        &self,
        name: impl Into<String>,
        descriptor: &'static TypeDescriptor,
        options: MockOptions,
    ) -> Mock {
        self.create(Some(name.into()), descriptor, options,
                    MockKind::Instance)
    }

    /// Create a spy: an instance mock whose unmatched calls delegate to
    /// the real implementation held by its glue.
    pub fn spy(
        &self,
        descriptor: &'static TypeDescriptor,
        options: MockOptions,
    ) -> Mock {
        self.create(None, descriptor, options.partial(),
                    MockKind::Instance)
    }

    /// Create a spy with an explicit display name.
    pub fn named_spy(
        &self,
        name: impl Into<String>,
        descriptor: &'static TypeDescriptor,
        options: MockOptions,
    ) -> Mock {
        self.create(Some(name.into()), descriptor, options.partial(),
                    MockKind::Instance)
    }

    /// Create a class mock intercepting constructors and associated
    /// functions of `K`, and install it in the process-wide intercept
    /// table.
    ///
    /// Panics if another live class mock already intercepts `K`.
    pub fn class_mock<K: 'static>(
        &self,
        descriptor: &'static TypeDescriptor,
        options: MockOptions,
    ) -> Mock {
        let mock = self.create(None, descriptor, options, MockKind::Class);
        intercepts::register::<K>(&mock.core);
        mock
    }

    /// Create a class mock with an explicit display name.
    pub fn named_class_mock<K: 'static>(
        &self,
        name: impl Into<String>,
        descriptor: &'static TypeDescriptor,
        options: MockOptions,
    ) -> Mock {
        let mock =
            self.create(Some(name.into()), descriptor, options,
                        MockKind::Class);
        intercepts::register::<K>(&mock.core);
        mock
    }

    /// Register an expectation on `method`, required exactly once by
    /// default.
    ///
    /// Returns a guard for refining the match template, the cardinality,
    /// and the behavior sequence.  Later registrations take precedence
    /// over earlier ones when both match a call.
    ///
    /// Panics with a
    /// [`MalformedExpectation`](crate::Error::MalformedExpectation) if
    /// `method` is not in the mock's descriptor or belongs to the wrong
    /// kind of mock.
    pub fn expect(&self, mock: &Mock, method: &str) -> ExpectationGuard {
        self.register(mock, method, Cardinality::ONCE)
    }

    /// Register a stub on `method`: an expectation with cardinality
    /// `[0, unbounded)`, for calls the test allows but does not require.
    pub fn stub(&self, mock: &Mock, method: &str) -> ExpectationGuard {
        self.register(mock, method, Cardinality::ANY)
    }

    fn assert_owned(&self, mock: &Mock) {
        if !mock.core.session.ptr_eq(&Arc::downgrade(&self.core)) {
            let err = Error::MalformedExpectation {
                target: mock.core.name.clone(),
                reason: "mock belongs to a different session".to_owned(),
            };
            panic!("{err}")
        }
    }

    fn register(
        &self,
        mock: &Mock,
        method: &str,
        cardinality: Cardinality,
    ) -> ExpectationGuard {
        self.assert_owned(mock);
        let core = &mock.core;
        let target = format!("{}.{}", core.name, method);
        let sig = match core.descriptor.method(method) {
            Some(sig) => sig,
            None => {
                let err = Error::MalformedExpectation {
                    target,
                    reason: format!(
                        "`{method}` is not a method of {}; known \
                         methods: {}",
                        core.descriptor.type_name,
                        core.descriptor.known_names(),
                    ),
                };
                panic!("{err}")
            },
        };
        let compatible = match sig.kind {
            CallKind::Method => core.kind == MockKind::Instance,
            CallKind::Constructor | CallKind::Static => {
                core.kind == MockKind::Class
            },
        };
        if !compatible {
            let needed = match sig.kind {
                CallKind::Method => "an instance mock",
                CallKind::Constructor | CallKind::Static => "a class mock",
            };
            let err = Error::MalformedExpectation {
                target,
                reason: format!(
                    "`{method}` is a {} and must be registered on \
                     {needed}",
                    sig.kind,
                ),
            };
            panic!("{err}")
        }
        if !core.active.load(Ordering::Relaxed) {
            let err = Error::MalformedExpectation {
                target,
                reason: "mock is deactivated".to_owned(),
            };
            panic!("{err}")
        }
        ExpectationGuard::new(core.register(sig, cardinality))
    }

    /// Start a post-hoc assertion on the calls `mock` has received.
    pub fn check(&self, mock: &Mock) -> Check {
        self.assert_owned(mock);
        Check::new(Arc::clone(&self.core), Arc::clone(&mock.core))
    }

    /// Verify that every expectation on `mock` reached its minimum call
    /// count and, for strictly ordered mocks, that calls arrived in
    /// registration order.  Panics on failure.
    ///
    /// Explicit verification, successful or not, excuses the mock from
    /// the automatic pass at session drop.
    pub fn verify(&self, mock: &Mock) {
        if let Err(err) = self.try_verify(mock) {
            panic_with_origin(&mock.core, err);
        }
    }

    /// Like [`verify`](Session::verify), but returns the failure instead
    /// of panicking.
    pub fn try_verify(&self, mock: &Mock) -> Result<(), Error> {
        self.assert_owned(mock);
        mock.core.auto_verify.store(false, Ordering::Relaxed);
        let result = verify::verify_mock(
            &mock.core,
            &self.core.ledger,
            VerifyScope::Full,
        );
        debug!(
            target: "understudy::session",
            mock = %mock.core.name,
            ok = result.is_ok(),
            "verified"
        );
        result
    }

    /// Mid-test verification: audit ordering without requiring open
    /// expectations to have reached their minimum yet.  Panics on
    /// failure; does not excuse the mock from the drop-time pass.
    pub fn verify_so_far(&self, mock: &Mock) {
        if let Err(err) = self.try_verify_so_far(mock) {
            panic_with_origin(&mock.core, err);
        }
    }

    /// Like [`verify_so_far`](Session::verify_so_far), but returns the
    /// failure instead of panicking.
    pub fn try_verify_so_far(&self, mock: &Mock) -> Result<(), Error> {
        self.assert_owned(mock);
        verify::verify_mock(
            &mock.core,
            &self.core.ledger,
            VerifyScope::SoFar,
        )
    }

    /// Verify every active mock in the session.  Panics on the first
    /// failure.
    pub fn verify_all(&self) {
        let mocks = self.core.mocks.lock().unwrap().clone();
        for core in &mocks {
            core.auto_verify.store(false, Ordering::Relaxed);
        }
        for core in &mocks {
            if !core.active.load(Ordering::Relaxed) {
                continue;
            }
            if let Err(err) = verify::verify_mock(
                core,
                &self.core.ledger,
                VerifyScope::Full,
            ) {
                panic_with_origin(core, err);
            }
        }
    }

    /// Like [`verify_all`](Session::verify_all), but returns the first
    /// failure instead of panicking.
    pub fn try_verify_all(&self) -> Result<(), Error> {
        let mocks = self.core.mocks.lock().unwrap().clone();
        for core in &mocks {
            core.auto_verify.store(false, Ordering::Relaxed);
        }
        for core in &mocks {
            if !core.active.load(Ordering::Relaxed) {
                continue;
            }
            verify::verify_mock(
                core,
                &self.core.ledger,
                VerifyScope::Full,
            )?;
        }
        Ok(())
    }

    /// Verify `mock`, then clear its expectations and its ledger
    /// entries, leaving it active for reprogramming.
    pub fn verify_and_reset(&self, mock: &Mock) {
        self.verify(mock);
        self.reset(mock);
    }

    /// Like [`verify_and_reset`](Session::verify_and_reset), but returns
    /// the failure instead of panicking.  Resets only on success.
    pub fn try_verify_and_reset(&self, mock: &Mock) -> Result<(), Error> {
        self.try_verify(mock)?;
        self.reset(mock);
        Ok(())
    }

    /// Discard `mock`'s expectations and ledger entries without
    /// verifying anything.  Other mocks' entries are untouched and the
    /// mock stays active.
    pub fn reset(&self, mock: &Mock) {
        self.assert_owned(mock);
        mock.core.clear_expectations();
        self.core.ledger.reset_mock(mock.core.id);
        mock.core.auto_verify.store(true, Ordering::Relaxed);
        debug!(
            target: "understudy::session",
            mock = %mock.core.name,
            "mock reset"
        );
    }

    /// Retire `mock`: tear down its interception so any later call
    /// through its glue fails as a zombie, and exclude it from drop-time
    /// verification.
    pub fn deactivate(&self, mock: &Mock) {
        self.assert_owned(mock);
        mock.core.active.store(false, Ordering::Relaxed);
        mock.core.auto_verify.store(false, Ordering::Relaxed);
        debug!(
            target: "understudy::session",
            mock = %mock.core.name,
            "mock deactivated"
        );
    }

    /// Assert that every call recorded for the given mocks was claimed
    /// by an expectation or a check.  Panics on failure, listing the
    /// unaccounted calls.
    pub fn check_nothing_else_happened(&self, mocks: &[&Mock]) {
        if let Err(err) = self.try_check_nothing_else_happened(mocks) {
            panic!("{err}")
        }
    }

    /// Like
    /// [`check_nothing_else_happened`](Session::check_nothing_else_happened),
    /// but returns the failure instead of panicking.
    pub fn try_check_nothing_else_happened(
        &self,
        mocks: &[&Mock],
    ) -> Result<(), Error> {
        let cores: Vec<Arc<MockCore>> = mocks
            .iter()
            .map(|m| {
                self.assert_owned(m);
                Arc::clone(&m.core)
            })
            .collect();
        verify::nothing_else_happened(&cores, &self.core.ledger)
    }

    /// Every ledger entry for `mock`, in arrival order.
    pub fn invocations(&self, mock: &Mock) -> Vec<InvocationView> {
        self.assert_owned(mock);
        self.core.ledger.views_for(mock.core.id)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Never turn one failure into two; an unwinding test already has
        // its diagnosis.
        if thread::panicking() {
            return;
        }
        let mocks = self.core.mocks.lock().unwrap().clone();
        for core in mocks {
            if !core.active.load(Ordering::Relaxed) {
                continue;
            }
            if !core.auto_verify.load(Ordering::Relaxed) {
                continue;
            }
            if let Err(err) = verify::verify_mock(
                &core,
                &self.core.ledger,
                VerifyScope::Full,
            ) {
                panic_with_origin(&core, err);
            }
        }
    }
}

fn panic_with_origin(core: &MockCore, err: Error) -> ! {
    match &core.created_at {
        Some(backtrace) => panic!("{err}\nmock created at:\n{backtrace}"),
        None => panic!("{err}"),
    }
}
