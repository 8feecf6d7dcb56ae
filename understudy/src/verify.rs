// vim: tw=80
//! Post-hoc verification over the ledger: cardinality audits,
//! strict-order audits, the check builder, and the accounting sweep
//! behind `check_nothing_else_happened`.

use std::{
    collections::HashMap,
    sync::{atomic::Ordering, Arc},
};

use crate::{
    dispatch::MockCore,
    error::Error,
    expectation::{times_phrase_or_zero, Cardinality},
    ledger::{Claimant, Ledger},
    matcher::{ArgMatcher, CallPattern, PatternMatch},
    session::SessionCore,
};

/// How much of a mock's contract a verification pass enforces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum VerifyScope {
    /// End-of-test: every expectation must have reached its minimum.
    Full,
    /// Mid-test: only ordering is audited.  Minimums are not yet due,
    /// and maximums are already enforced at claim time.
    SoFar,
}

pub(crate) fn verify_mock(
    core: &MockCore,
    ledger: &Ledger,
    scope: VerifyScope,
) -> Result<(), Error> {
    check_order(core, ledger)?;
    if scope == VerifyScope::Full {
        check_cardinalities(core)?;
    }
    Ok(())
}

/// Strict-mode audit: within each ordering group, the registration
/// indices of claimed calls must be non-decreasing in ledger order.
fn check_order(core: &MockCore, ledger: &Ledger) -> Result<(), Error> {
    if !core.options.strictly_ordered {
        return Ok(());
    }
    let expectations = core.expectations();
    // Per group: highest registration index seen so far, and the
    // rendering of the call that set it.
    let mut leaders: HashMap<String, (usize, String)> = HashMap::new();
    ledger.with_records(|records| {
        for record in records {
            if record.mock != core.id {
                continue;
            }
            let index = match &record.claimed_by {
                Some(Claimant::Expectation { index, .. }) => *index,
                _ => continue,
            };
            let Some(expectation) = expectations.get(index) else {
                continue;
            };
            let tag = expectation.ordering_tag();
            if tag.any_time {
                continue;
            }
            match leaders.get_mut(&tag.group) {
                Some((leader_index, leader_call)) => {
                    if index < *leader_index {
                        return Err(Error::OutOfOrder {
                            mock: core.name.clone(),
                            group: tag.group,
                            expected_first: record.render(),
                            actual_first: leader_call.clone(),
                        });
                    }
                    if index > *leader_index {
                        *leader_index = index;
                        *leader_call = record.render();
                    }
                },
                None => {
                    leaders.insert(tag.group, (index, record.render()));
                },
            }
        }
        Ok(())
    })
}

fn check_cardinalities(core: &MockCore) -> Result<(), Error> {
    let mut details = String::new();
    for expectation in core.expectations() {
        let cardinality = *expectation.cardinality.lock().unwrap();
        if !cardinality.is_satisfied(expectation.satisfied_count()) {
            details.push_str("\n    ");
            details.push_str(&expectation.describe());
        }
    }
    if details.is_empty() {
        Ok(())
    } else {
        Err(Error::FailedVerification {
            mock: core.name.clone(),
            details,
        })
    }
}

/// Accounting sweep: every recorded call on the given mocks must have
/// been claimed by an expectation at dispatch time or by a check
/// afterwards.
pub(crate) fn nothing_else_happened(
    cores: &[Arc<MockCore>],
    ledger: &Ledger,
) -> Result<(), Error> {
    let mut offenders: Vec<String> = Vec::new();
    let mut details = String::new();
    ledger.with_records(|records| {
        for record in records {
            if record.claimed_by.is_some() {
                continue;
            }
            let Some(core) = cores.iter().find(|c| c.id == record.mock)
            else {
                continue;
            };
            if !offenders.iter().any(|name| name == &core.name) {
                offenders.push(core.name.clone());
            }
            details.push_str(&format!(
                "\n    #{} {} on thread {}",
                record.seq,
                record.render(),
                record.thread,
            ));
        }
    });
    if offenders.is_empty() {
        Ok(())
    } else {
        Err(Error::UncheckedInvocations {
            mocks: offenders.join(", "),
            details,
        })
    }
}

/// Post-hoc call-count assertion, built by
/// [`Session::check`](crate::Session::check).
///
/// A check scans the ledger for calls on one mock matching a method and
/// an argument template, asserts how many it found, and claims the
/// matched calls so the accounting sweep treats them as accounted for.
/// Calls a previous check already claimed are invisible to later checks,
/// which is what makes consecutive identical checks consume distinct
/// calls.
///
/// ```no_run
/// # use understudy::{matcher, MockOptions, Session};
/// # use understudy::{CallKind, MethodSig, TypeDescriptor};
/// # static DESC: TypeDescriptor = TypeDescriptor {
/// #     type_name: "Greeter",
/// #     methods: &[MethodSig {
/// #         name: "greet", params: &["String"], ret: "String",
/// #         kind: CallKind::Method,
/// #     }],
/// # };
/// # let session = Session::new();
/// # let mock = session.mock(&DESC, MockOptions::new().auto_stubbing());
/// session.check(&mock)
///     .times(2)
///     .on("greet", [matcher::eq("bob".to_owned())]);
/// ```
pub struct Check {
    session: Arc<SessionCore>,
    core: Arc<MockCore>,
    cardinality: Cardinality,
    unexpectedly: bool,
}

impl Check {
    pub(crate) fn new(
        session: Arc<SessionCore>,
        core: Arc<MockCore>,
    ) -> Check {
        Check {
            session,
            core,
            // A bare check asserts the call happened at all.
            cardinality: Cardinality::at_least(1),
            unexpectedly: false,
        }
    }

    fn set_cardinality(mut self, cardinality: Cardinality) -> Check {
        if cardinality.is_unreachable() {
            let err = Error::MalformedExpectation {
                target: self.core.name.clone(),
                reason: format!(
                    "minimum call count {} exceeds maximum {}",
                    cardinality.min,
                    cardinality.max.unwrap_or(0),
                ),
            };
            panic!("{err}")
        }
        self.cardinality = cardinality;
        self
    }

    /// Expect exactly `n` matching calls.
    pub fn times(self, n: usize) -> Check {
        self.set_cardinality(Cardinality::exactly(n))
    }

    /// Expect exactly one matching call.
    pub fn once(self) -> Check {
        self.set_cardinality(Cardinality::ONCE)
    }

    /// Expect at least `n` matching calls.
    pub fn at_least(self, n: usize) -> Check {
        self.set_cardinality(Cardinality::at_least(n))
    }

    /// Expect at most `n` matching calls.
    pub fn at_most(self, n: usize) -> Check {
        self.set_cardinality(Cardinality::at_most(n))
    }

    /// Expect between `min` and `max` matching calls, inclusive.
    pub fn between(self, min: usize, max: usize) -> Check {
        self.set_cardinality(Cardinality::between(min, max))
    }

    /// Expect no matching call at all.
    pub fn never(self) -> Check {
        self.set_cardinality(Cardinality::exactly(0))
    }

    /// Count only calls no expectation claimed, the ones auto-stubbing
    /// or partial delegation absorbed.
    pub fn unexpectedly(mut self) -> Check {
        self.unexpectedly = true;
        self
    }

    /// Run the check against calls of `method` matching `matchers`.
    ///
    /// Panics with the [`Error`](crate::Error) rendering on failure.
    pub fn on(
        self,
        method: &str,
        matchers: impl IntoIterator<Item = ArgMatcher>,
    ) {
        if let Err(err) = self.try_on(method, matchers) {
            panic!("{err}")
        }
    }

    /// Like [`on`](Check::on), but returns the failure instead of
    /// panicking.
    pub fn try_on(
        self,
        method: &str,
        matchers: impl IntoIterator<Item = ArgMatcher>,
    ) -> Result<(), Error> {
        let matchers: Vec<ArgMatcher> = matchers.into_iter().collect();
        self.run(method, Some(matchers))
    }

    /// Run the check against calls of `method` with any arguments.
    pub fn on_any(self, method: &str) {
        if let Err(err) = self.try_on_any(method) {
            panic!("{err}")
        }
    }

    /// Like [`on_any`](Check::on_any), but returns the failure instead
    /// of panicking.
    pub fn try_on_any(self, method: &str) -> Result<(), Error> {
        self.run(method, None)
    }

    fn run(
        self,
        method: &str,
        matchers: Option<Vec<ArgMatcher>>,
    ) -> Result<(), Error> {
        let core = &self.core;
        let target = format!("{}.{}", core.name, method);
        let sig = core.descriptor.method(method).ok_or_else(|| {
            Error::MalformedExpectation {
                target: target.clone(),
                reason: format!(
                    "`{method}` is not a method of {}; known methods: {}",
                    core.descriptor.type_name,
                    core.descriptor.known_names(),
                ),
            }
        })?;
        let pattern = match matchers {
            Some(matchers) => {
                if matchers.len() != sig.arity() {
                    return Err(Error::MalformedExpectation {
                        target,
                        reason: format!(
                            "matcher template has arity {}, but \
                             `{method}` has arity {}",
                            matchers.len(),
                            sig.arity(),
                        ),
                    });
                }
                CallPattern::new(matchers)
            },
            None => CallPattern::wildcard(sig.arity()),
        };

        let ordinal =
            self.session.next_check_ordinal.fetch_add(1, Ordering::Relaxed);
        self.session.ledger.with_records_mut(|records| {
            let mut matched: Vec<usize> = Vec::new();
            for (i, record) in records.iter().enumerate() {
                if record.mock != core.id || record.sig.name != sig.name {
                    continue;
                }
                let eligible = match &record.claimed_by {
                    None => true,
                    Some(Claimant::Expectation { .. }) => !self.unexpectedly,
                    Some(Claimant::Check { .. }) => false,
                };
                if !eligible {
                    continue;
                }
                match pattern.matches(&record.args) {
                    PatternMatch::Matched => matched.push(i),
                    PatternMatch::Mismatched { .. } => {},
                    PatternMatch::Misapplied { reason } => {
                        return Err(Error::MalformedExpectation {
                            target: target.clone(),
                            reason,
                        });
                    },
                }
            }
            let count = matched.len();
            if !self.cardinality.contains(count) {
                let scope = if self.unexpectedly {
                    " among calls no expectation claimed"
                } else {
                    ""
                };
                return Err(Error::FailedCheck {
                    mock: core.name.clone(),
                    details: format!(
                        "{}{pattern}: expected {}{scope}, observed {}",
                        sig.name,
                        self.cardinality,
                        times_phrase_or_zero(count),
                    ),
                });
            }
            for i in matched {
                if records[i].claimed_by.is_none() {
                    records[i].claimed_by =
                        Some(Claimant::Check { ordinal });
                }
            }
            Ok(())
        })
    }
}
