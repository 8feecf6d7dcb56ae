// vim: tw=80
//! The decision engine.
//!
//! Every intercepted call funnels into [`Mock::dispatch`], which records
//! the call in the session ledger, resolves it against the mock's
//! registered expectations, claims the winner, and executes its next
//! behavior.  Resolution prefers the most recently registered matching
//! expectation; a matching expectation whose cardinality is already
//! saturated is skipped so an earlier registration can pick the call up.

use std::{
    backtrace::Backtrace,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, Weak,
    },
};

use tracing::{debug, trace};

use crate::{
    call::{
        render_call, Args, Call, CallKind, Fallback, MethodSig, RealThunk,
        ReturnValue, TypeDescriptor,
    },
    error::Error,
    expectation::{BehaviorKind, Cardinality, Expectation},
    ledger::{CallOutcome, Claimant, MockId},
    matcher::{MatchReport, PatternMatch},
    session::{MockOptions, SessionCore},
};

/// Whether a mock stands in for instances or for the type itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MockKind {
    /// Intercepts instance methods through a handle held by proxy glue.
    Instance,
    /// Intercepts constructors and associated functions through the
    /// process-wide intercept table.
    Class,
}

impl MockKind {
    fn phrase(&self) -> &'static str {
        match self {
            MockKind::Instance => "an instance mock",
            MockKind::Class => "a class mock",
        }
    }
}

/// Shared state of one mock.  `Mock` handles, the owning session, and
/// the static intercept table all hold references to the same core.
pub(crate) struct MockCore {
    pub(crate) id: MockId,
    pub(crate) name: String,
    pub(crate) descriptor: &'static TypeDescriptor,
    pub(crate) options: MockOptions,
    pub(crate) kind: MockKind,
    /// Cleared by deactivation; a call on an inactive mock is a zombie.
    pub(crate) active: AtomicBool,
    /// Cleared once the user verifies or deactivates explicitly, so
    /// session teardown does not second-guess them.
    pub(crate) auto_verify: AtomicBool,
    pub(crate) registry: Mutex<Vec<Arc<Expectation>>>,
    pub(crate) session: Weak<SessionCore>,
    pub(crate) created_at: Option<Backtrace>,
}

impl MockCore {
    /// Append a fresh expectation for `sig` and hand it back for the
    /// guard to configure.
    pub(crate) fn register(
        &self,
        sig: &'static MethodSig,
        cardinality: Cardinality,
    ) -> Arc<Expectation> {
        let mut registry = self.registry.lock().unwrap();
        let index = registry.len();
        let label = format!("{}.{}", self.name, sig.name);
        let expectation =
            Arc::new(Expectation::new(index, sig, label, cardinality));
        registry.push(Arc::clone(&expectation));
        expectation
    }

    pub(crate) fn expectations(&self) -> Vec<Arc<Expectation>> {
        self.registry.lock().unwrap().clone()
    }

    pub(crate) fn clear_expectations(&self) {
        self.registry.lock().unwrap().clear();
    }

    fn owner_label(&self, kind: CallKind) -> String {
        match kind {
            CallKind::Method => self.name.clone(),
            CallKind::Constructor | CallKind::Static => {
                self.descriptor.type_name.to_owned()
            },
        }
    }

    fn malformed(&self, target: String, reason: String) -> ! {
        let err = Error::MalformedExpectation { target, reason };
        panic!("{err}")
    }

    fn zombie(&self, call: String) -> ! {
        let err = Error::ZombieMethod {
            target: self.name.clone(),
            call,
        };
        match &self.created_at {
            Some(backtrace) => {
                panic!("{err}\nmock created at:\n{backtrace}")
            },
            None => panic!("{err}"),
        }
    }

    pub(crate) fn dispatch(
        &self,
        call: Call,
        fallback: Fallback,
        real: Option<RealThunk<'_>>,
    ) -> ReturnValue {
        let Call { name, kind, args } = call;
        let args = Args::new(args);

        let sig = match self.descriptor.method(name) {
            Some(sig) => sig,
            None => self.malformed(
                self.name.clone(),
                format!(
                    "`{name}` is not a method of {}; known methods: {}",
                    self.descriptor.type_name,
                    self.descriptor.known_names(),
                ),
            ),
        };
        if sig.kind != kind {
            self.malformed(
                self.name.clone(),
                format!(
                    "`{name}` was dispatched as a {kind}, but is \
                     declared as a {}",
                    sig.kind,
                ),
            );
        }
        let compatible = match sig.kind {
            CallKind::Method => self.kind == MockKind::Instance,
            CallKind::Constructor | CallKind::Static => {
                self.kind == MockKind::Class
            },
        };
        if !compatible {
            self.malformed(
                self.name.clone(),
                format!(
                    "`{name}` is a {}, which cannot be dispatched \
                     through {}",
                    sig.kind,
                    self.kind.phrase(),
                ),
            );
        }
        if args.len() != sig.arity() {
            self.malformed(
                self.name.clone(),
                format!(
                    "`{name}` takes {} arguments, but the call supplied \
                     {}",
                    sig.arity(),
                    args.len(),
                ),
            );
        }

        let owner = self.owner_label(sig.kind);
        let rendered = render_call(sig.kind, &owner, sig.name, &args);

        let session = match self.session.upgrade() {
            Some(s) if self.active.load(Ordering::Relaxed) => s,
            _ => self.zombie(rendered),
        };

        let args = Arc::new(args);
        let seq =
            session.ledger.record(self.id, owner, sig, Arc::clone(&args));

        let candidates: Vec<Arc<Expectation>> = {
            let registry = self.registry.lock().unwrap();
            registry
                .iter()
                .filter(|e| e.sig.name == sig.name)
                .map(Arc::clone)
                .collect()
        };

        let mut report = MatchReport::new();
        let mut selected = None;
        for expectation in candidates.iter().rev() {
            let matched = {
                let pattern = expectation.pattern.lock().unwrap();
                pattern.matches(&args)
            };
            match matched {
                PatternMatch::Matched => {
                    if let Some(ordinal) = expectation.try_claim() {
                        selected = Some((Arc::clone(expectation), ordinal));
                        break;
                    }
                    // Saturated; its line in a failure report shows the
                    // exhausted count.
                },
                PatternMatch::Mismatched { explanations } => {
                    let shown = {
                        let pattern = expectation.pattern.lock().unwrap();
                        format!("{}{}", sig.name, pattern)
                    };
                    report.near_miss(&shown, explanations);
                },
                PatternMatch::Misapplied { reason } => {
                    let err = Error::MalformedExpectation {
                        target: expectation.label.clone(),
                        reason,
                    };
                    session.ledger.set_outcome(
                        seq,
                        CallOutcome::Failed { error: err.to_string() },
                    );
                    panic!("{err}")
                },
            }
        }

        if let Some((expectation, ordinal)) = selected {
            session.ledger.claim(
                seq,
                Claimant::Expectation {
                    mock: self.id,
                    index: expectation.index,
                },
            );
            trace!(
                target: "understudy::dispatch",
                mock = %self.name,
                call = %rendered,
                expectation = expectation.index,
                "call matched"
            );
            return self.execute(
                &session,
                seq,
                &expectation,
                ordinal,
                &args,
                &fallback,
                real,
                &rendered,
            );
        }

        // No live match.  Spies fall through to the real implementation
        // and auto-stubbing mocks to the default value; both leave the
        // call unclaimed so check_nothing_else_happened still sees it.
        if self.options.partial {
            if let Some(thunk) = real {
                let value = thunk();
                session.ledger.set_outcome(
                    seq,
                    CallOutcome::Returned {
                        repr: value.repr().to_owned(),
                    },
                );
                debug!(
                    target: "understudy::dispatch",
                    mock = %self.name,
                    call = %rendered,
                    "unmatched call delegated to the real implementation"
                );
                return value;
            }
        }
        if self.options.auto_stubbing {
            if let Some(value) = fallback.produce() {
                session.ledger.set_outcome(
                    seq,
                    CallOutcome::Returned {
                        repr: value.repr().to_owned(),
                    },
                );
                debug!(
                    target: "understudy::dispatch",
                    mock = %self.name,
                    call = %rendered,
                    "call auto-stubbed"
                );
                return value;
            }
        }

        let mut details = String::new();
        if candidates.is_empty() {
            details
                .push_str("\nno expectations are registered for this method");
        } else {
            details.push_str("\nregistered expectations:");
            for expectation in &candidates {
                details.push_str("\n    ");
                details.push_str(&expectation.describe());
            }
        }
        details.push_str(&report.render());
        let err = Error::UnexpectedInvocation {
            mock: self.name.clone(),
            call: rendered,
            details,
        };
        session
            .ledger
            .set_outcome(seq, CallOutcome::Failed { error: err.to_string() });
        panic!("{err}")
    }

    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        session: &SessionCore,
        seq: u64,
        expectation: &Expectation,
        ordinal: usize,
        args: &Args,
        fallback: &Fallback,
        real: Option<RealThunk<'_>>,
        rendered: &str,
    ) -> ReturnValue {
        let step = {
            let mut behaviors = expectation.behaviors.lock().unwrap();
            if behaviors.is_empty() {
                // Implicit behavior: spies delegate, mocks produce the
                // default value.
                if self.options.partial && real.is_some() {
                    Step::Real
                } else {
                    Step::Default
                }
            } else {
                // The last behavior repeats once the sequence runs out.
                let index = ordinal.min(behaviors.len() - 1);
                match &mut behaviors[index].kind {
                    BehaviorKind::Answer(f) => Step::Value(f(args)),
                    BehaviorKind::AnswerOnce(slot) => match slot.take() {
                        Some(f) => Step::Value(f(args)),
                        None => Step::Spent(format!(
                            "behavior for `{}` returns by move and was \
                             already consumed",
                            expectation.sig.name,
                        )),
                    },
                    BehaviorKind::Panic(f) => Step::Panic(f(args)),
                    BehaviorKind::CallReal => Step::Real,
                    BehaviorKind::DefaultValue => Step::Default,
                }
            }
        };

        match step {
            Step::Value(value) => self.finish(session, seq, value),
            Step::Default => match fallback.produce() {
                Some(value) => self.finish(session, seq, value),
                None => {
                    let err = Error::MalformedExpectation {
                        target: expectation.label.clone(),
                        reason: format!(
                            "`{}` has no default value for its return \
                             type {}",
                            expectation.sig.name, expectation.sig.ret,
                        ),
                    };
                    session.ledger.set_outcome(
                        seq,
                        CallOutcome::Failed { error: err.to_string() },
                    );
                    panic!("{err}")
                },
            },
            Step::Real => match real {
                Some(thunk) => {
                    let value = thunk();
                    debug!(
                        target: "understudy::dispatch",
                        mock = %self.name,
                        call = %rendered,
                        "call delegated to the real implementation"
                    );
                    self.finish(session, seq, value)
                },
                None => {
                    let err = Error::MalformedExpectation {
                        target: expectation.label.clone(),
                        reason: "delegation to the real implementation \
                                 was requested, but this is not a spy"
                            .to_owned(),
                    };
                    session.ledger.set_outcome(
                        seq,
                        CallOutcome::Failed { error: err.to_string() },
                    );
                    panic!("{err}")
                },
            },
            Step::Panic(message) => {
                session.ledger.set_outcome(
                    seq,
                    CallOutcome::Panicked { message: message.clone() },
                );
                debug!(
                    target: "understudy::dispatch",
                    mock = %self.name,
                    call = %rendered,
                    "call panicking as programmed"
                );
                panic!("{message}")
            },
            Step::Spent(message) => {
                session.ledger.set_outcome(
                    seq,
                    CallOutcome::Panicked { message: message.clone() },
                );
                panic!("{message}")
            },
        }
    }

    fn finish(
        &self,
        session: &SessionCore,
        seq: u64,
        value: ReturnValue,
    ) -> ReturnValue {
        session.ledger.set_outcome(
            seq,
            CallOutcome::Returned { repr: value.repr().to_owned() },
        );
        value
    }
}

/// What the selected behavior asked dispatch to do.  Computed under the
/// behaviors lock, acted on after it is released, so programmed panics
/// and real-implementation calls never run with a lock held.
enum Step {
    Value(ReturnValue),
    Default,
    Real,
    Panic(String),
    Spent(String),
}

/// Handle to one mock.
///
/// Cloneable and sendable; proxy glue holds one and routes every
/// intercepted call through [`Mock::dispatch`].  All bookkeeping lives in
/// the session, so dropping a handle has no effect on verification.
#[derive(Clone)]
pub struct Mock {
    pub(crate) core: Arc<MockCore>,
}

impl Mock {
    /// The mock's display name, as it appears in errors and ledger
    /// listings.
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Name of the mocked trait or type.
    pub fn type_name(&self) -> &'static str {
        self.core.descriptor.type_name
    }

    /// Route one intercepted call through the decision engine.
    ///
    /// `fallback` produces the method's default return value and feeds
    /// auto-stubbing, [`returns_default`], and [`noop`]; glue passes
    /// [`Fallback::none`] for return types without a default.  `real`
    /// invokes the real implementation and is `Some` only in spy glue.
    ///
    /// Panics with the appropriate [`Error`](crate::Error) rendering on
    /// an unexpected invocation, a zombie call, or a malformed
    /// expectation surfaced at call time.
    ///
    /// [`returns_default`]: crate::ExpectationGuard::returns_default
    /// [`noop`]: crate::ExpectationGuard::noop
    pub fn dispatch(
        &self,
        call: Call,
        fallback: Fallback,
        real: Option<RealThunk<'_>>,
    ) -> ReturnValue {
        self.core.dispatch(call, fallback, real)
    }
}

impl std::fmt::Debug for Mock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mock")
            .field("name", &self.core.name)
            .field("type", &self.core.descriptor.type_name)
            .finish()
    }
}
