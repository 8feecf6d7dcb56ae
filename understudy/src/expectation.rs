// vim: tw=80
//! Programmed expectations: cardinality ranges, behavior sequences, and
//! the fluent guard used to build them.

use fragile::Fragile;
use std::{
    any,
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use crate::{
    call::{Args, MethodSig, ReturnValue},
    error::Error,
    matcher::{ArgMatcher, CallPattern},
};

/// Inclusive invocation-count range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cardinality {
    pub(crate) min: usize,
    pub(crate) max: Option<usize>,
}

pub(crate) fn times_phrase(n: usize) -> String {
    match n {
        1 => "once".to_owned(),
        2 => "twice".to_owned(),
        n => format!("{n} times"),
    }
}

impl Cardinality {
    pub(crate) const ONCE: Cardinality =
        Cardinality { min: 1, max: Some(1) };
    pub(crate) const ANY: Cardinality = Cardinality { min: 0, max: None };

    pub(crate) fn exactly(n: usize) -> Cardinality {
        Cardinality { min: n, max: Some(n) }
    }

    pub(crate) fn at_least(n: usize) -> Cardinality {
        Cardinality { min: n, max: None }
    }

    pub(crate) fn at_most(n: usize) -> Cardinality {
        Cardinality { min: 0, max: Some(n) }
    }

    pub(crate) fn between(min: usize, max: usize) -> Cardinality {
        Cardinality { min, max: Some(max) }
    }

    pub(crate) fn is_unreachable(&self) -> bool {
        self.max.is_some_and(|max| max < self.min)
    }

    pub(crate) fn admits_more(&self, count: usize) -> bool {
        self.max.map_or(true, |max| count < max)
    }

    pub(crate) fn is_satisfied(&self, count: usize) -> bool {
        count >= self.min
    }

    pub(crate) fn contains(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (0, Some(0)) => write!(f, "never"),
            (0, None) => write!(f, "any number of times"),
            (min, None) => write!(f, "at least {}", times_phrase(min)),
            (0, Some(max)) => write!(f, "at most {}", times_phrase(max)),
            (min, Some(max)) if min == max => {
                write!(f, "exactly {}", times_phrase(min))
            },
            (min, Some(max)) => {
                write!(f, "between {min} and {max} times")
            },
        }
    }
}

/// What to do on one matching call.
pub(crate) enum BehaviorKind {
    /// Produce a value, possibly computed from the arguments.
    Answer(Box<dyn FnMut(&Args) -> ReturnValue + Send>),
    /// Produce a value at most once; repeating it is an error.
    AnswerOnce(Option<Box<dyn FnOnce(&Args) -> ReturnValue + Send>>),
    /// Panic with the produced message, the stubbed-throw feature.
    Panic(Box<dyn Fn(&Args) -> String + Send>),
    /// Delegate to the real implementation supplied by spy glue.
    CallReal,
    /// Produce the method's default value via the glue's fallback thunk.
    DefaultValue,
}

pub(crate) struct Behavior {
    pub(crate) label: String,
    pub(crate) kind: BehaviorKind,
}

impl Behavior {
    fn is_one_shot(&self) -> bool {
        matches!(self.kind, BehaviorKind::AnswerOnce(_))
    }
}

/// Strict-ordering attributes of one expectation.
#[derive(Clone)]
pub(crate) struct OrderingTag {
    /// Ordering group; expectations are only ordered against others in
    /// the same group.  Empty string is the mock's default group.
    pub(crate) group: String,
    /// Exempt from ordering checks entirely.
    pub(crate) any_time: bool,
}

/// One programmed expectation.  Selection bookkeeping is atomic and the
/// builder-mutable fields sit behind their own locks, so registration,
/// concurrent dispatch, and verification can all share the record.
pub(crate) struct Expectation {
    /// Position in the owning registry; the ordering key for strict mode
    /// and the precedence key for resolution.
    pub(crate) index: usize,
    pub(crate) sig: &'static MethodSig,
    /// `MockName.method`, for error rendering.
    pub(crate) label: String,
    pub(crate) pattern: Mutex<CallPattern>,
    pub(crate) cardinality: Mutex<Cardinality>,
    pub(crate) behaviors: Mutex<Vec<Behavior>>,
    pub(crate) ordering: Mutex<OrderingTag>,
    pub(crate) count: AtomicUsize,
}

impl Expectation {
    pub(crate) fn new(
        index: usize,
        sig: &'static MethodSig,
        label: String,
        cardinality: Cardinality,
    ) -> Expectation {
        Expectation {
            index,
            sig,
            label,
            pattern: Mutex::new(CallPattern::wildcard(sig.arity())),
            cardinality: Mutex::new(cardinality),
            behaviors: Mutex::new(Vec::new()),
            ordering: Mutex::new(OrderingTag {
                group: String::new(),
                any_time: false,
            }),
            count: AtomicUsize::new(0),
        }
    }

    /// Atomically claim one more call if the cardinality allows it,
    /// returning the claim ordinal (0 for the first matching call).
    pub(crate) fn try_claim(&self) -> Option<usize> {
        let cardinality = *self.cardinality.lock().unwrap();
        self.count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| {
                if cardinality.admits_more(count) {
                    Some(count + 1)
                } else {
                    None
                }
            })
            .ok()
    }

    pub(crate) fn satisfied_count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub(crate) fn ordering_tag(&self) -> OrderingTag {
        self.ordering.lock().unwrap().clone()
    }

    /// `greet(var == "bob"): expected exactly once, called once`
    pub(crate) fn describe(&self) -> String {
        let pattern = self.pattern.lock().unwrap();
        let cardinality = self.cardinality.lock().unwrap();
        format!(
            "{}{}: expected {}, called {}",
            self.sig.name,
            pattern,
            cardinality,
            times_phrase_or_zero(self.satisfied_count()),
        )
    }
}

pub(crate) fn times_phrase_or_zero(n: usize) -> String {
    if n == 0 {
        "0 times".to_owned()
    } else {
        times_phrase(n)
    }
}

/// Fluent builder for one registered expectation.
///
/// Returned by [`Session::expect`](crate::Session::expect) and
/// [`Session::stub`](crate::Session::stub).  Every method validates
/// eagerly and panics with a
/// [`MalformedExpectation`](crate::Error::MalformedExpectation) on an
/// expectation that could never be satisfied as written.
pub struct ExpectationGuard {
    inner: Arc<Expectation>,
}

impl ExpectationGuard {
    pub(crate) fn new(inner: Arc<Expectation>) -> ExpectationGuard {
        ExpectationGuard { inner }
    }

    fn malformed(&self, reason: String) -> ! {
        let err = Error::MalformedExpectation {
            target: self.inner.label.clone(),
            reason,
        };
        panic!("{err}")
    }

    fn set_cardinality(&mut self, cardinality: Cardinality)
        -> &mut ExpectationGuard
    {
        if cardinality.is_unreachable() {
            self.malformed(format!(
                "minimum call count {} exceeds maximum {}",
                cardinality.min,
                cardinality.max.unwrap_or(0),
            ));
        }
        *self.inner.cardinality.lock().unwrap() = cardinality;
        self.validate_one_shots();
        self
    }

    fn validate_one_shots(&self) {
        let cardinality = *self.inner.cardinality.lock().unwrap();
        let behaviors = self.inner.behaviors.lock().unwrap();
        let one_shots = behaviors.iter().filter(|b| b.is_one_shot()).count();
        if let Some(max) = cardinality.max {
            if one_shots > max {
                drop(behaviors);
                self.malformed(format!(
                    "programs {one_shots} one-shot behaviors but admits \
                     at most {max} calls",
                ));
            }
        }
    }

    fn push_behavior(&mut self, behavior: Behavior) -> &mut ExpectationGuard {
        self.inner.behaviors.lock().unwrap().push(behavior);
        self.validate_one_shots();
        self
    }

    /// Replace the wildcard template with explicit per-position matchers.
    ///
    /// ```should_panic
    /// use understudy::{matcher, MockOptions, Session};
    /// # use understudy::{CallKind, MethodSig, TypeDescriptor};
    /// # static DESC: TypeDescriptor = TypeDescriptor {
    /// #     type_name: "Greeter",
    /// #     methods: &[MethodSig {
    /// #         name: "greet", params: &["String"], ret: "String",
    /// #         kind: CallKind::Method,
    /// #     }],
    /// # };
    ///
    /// let session = Session::new();
    /// let mock = session.mock(&DESC, MockOptions::new());
    /// // Wrong arity: `greet` takes one argument.
    /// session.expect(&mock, "greet")
    ///     .with([matcher::eq("a".to_owned()), matcher::any()]);
    /// ```
    pub fn with(
        &mut self,
        matchers: impl IntoIterator<Item = ArgMatcher>,
    ) -> &mut ExpectationGuard {
        let matchers: Vec<ArgMatcher> = matchers.into_iter().collect();
        if matchers.len() != self.inner.sig.arity() {
            self.malformed(format!(
                "matcher template has arity {}, but `{}` has arity {}",
                matchers.len(),
                self.inner.sig.name,
                self.inner.sig.arity(),
            ));
        }
        *self.inner.pattern.lock().unwrap() = CallPattern::new(matchers);
        self
    }

    /// Require exactly `n` matching calls.
    pub fn times(&mut self, n: usize) -> &mut ExpectationGuard {
        self.set_cardinality(Cardinality::exactly(n))
    }

    /// Require exactly one matching call.  This is the default for
    /// expectations registered through `expect`.
    pub fn once(&mut self) -> &mut ExpectationGuard {
        self.set_cardinality(Cardinality::ONCE)
    }

    /// Require at least `n` matching calls, with no upper bound.
    pub fn at_least(&mut self, n: usize) -> &mut ExpectationGuard {
        self.set_cardinality(Cardinality::at_least(n))
    }

    /// Allow at most `n` matching calls.
    pub fn at_most(&mut self, n: usize) -> &mut ExpectationGuard {
        self.set_cardinality(Cardinality::at_most(n))
    }

    /// Require between `min` and `max` matching calls, inclusive.
    pub fn between(&mut self, min: usize, max: usize)
        -> &mut ExpectationGuard
    {
        self.set_cardinality(Cardinality::between(min, max))
    }

    /// Allow any number of matching calls, including none.  This is the
    /// default for expectations registered through `stub`.
    pub fn any_times(&mut self) -> &mut ExpectationGuard {
        self.set_cardinality(Cardinality::ANY)
    }

    /// Forbid matching calls outright.
    pub fn never(&mut self) -> &mut ExpectationGuard {
        self.set_cardinality(Cardinality::exactly(0))
    }

    /// Append a behavior returning a clone of `value`.
    pub fn returns<T>(&mut self, value: T) -> &mut ExpectationGuard
        where T: any::Any + Clone + Send + fmt::Debug
    {
        let label = format!("returns {value:?}");
        self.push_behavior(Behavior {
            label,
            kind: BehaviorKind::Answer(Box::new(move |_| {
                ReturnValue::of(value.clone())
            })),
        })
    }

    /// Append a one-shot behavior returning `value`, for types that are
    /// not `Clone`.  Executing it twice is an error, so the cardinality
    /// must bound the calls that can reach it.
    pub fn returns_once<T>(&mut self, value: T) -> &mut ExpectationGuard
        where T: any::Any + Send + fmt::Debug
    {
        let label = format!("returns {value:?} once");
        self.push_behavior(Behavior {
            label,
            kind: BehaviorKind::AnswerOnce(Some(Box::new(move |_| {
                ReturnValue::of(value)
            }))),
        })
    }

    /// Append one fixed-value behavior per element, consumed by
    /// successive matching calls; the last one repeats.
    pub fn returns_consecutively<T>(
        &mut self,
        values: impl IntoIterator<Item = T>,
    ) -> &mut ExpectationGuard
        where T: any::Any + Clone + Send + fmt::Debug
    {
        for value in values {
            self.returns(value);
        }
        self
    }

    /// Append a behavior producing the method's default return value
    /// through the glue's fallback thunk.
    pub fn returns_default(&mut self) -> &mut ExpectationGuard {
        self.push_behavior(Behavior {
            label: "returns the default value".to_owned(),
            kind: BehaviorKind::DefaultValue,
        })
    }

    /// Append a do-nothing behavior.  Equivalent to [`returns_default`]
    /// and reads better on methods returning `()`.
    ///
    /// [`returns_default`]: ExpectationGuard::returns_default
    pub fn noop(&mut self) -> &mut ExpectationGuard {
        self.push_behavior(Behavior {
            label: "no-op".to_owned(),
            kind: BehaviorKind::DefaultValue,
        })
    }

    /// Append a behavior computing the return value from the call's
    /// arguments.
    pub fn answers<O, F>(&mut self, mut f: F) -> &mut ExpectationGuard
        where O: any::Any + Send + fmt::Debug,
              F: FnMut(&Args) -> O + Send + 'static
    {
        self.push_behavior(Behavior {
            label: "answers <function>".to_owned(),
            kind: BehaviorKind::Answer(Box::new(move |args| {
                ReturnValue::of(f(args))
            })),
        })
    }

    /// Like [`answers`](ExpectationGuard::answers), but for closures that
    /// aren't `Send`.  The behavior panics if a call reaches it from a
    /// thread other than the one that programmed it.
    pub fn answers_st<O, F>(&mut self, f: F) -> &mut ExpectationGuard
        where O: any::Any + Send + fmt::Debug,
              F: FnMut(&Args) -> O + 'static
    {
        let mut fragile = Fragile::new(f);
        self.push_behavior(Behavior {
            label: "answers <function>".to_owned(),
            kind: BehaviorKind::Answer(Box::new(move |args| {
                ReturnValue::of((fragile.get_mut())(args))
            })),
        })
    }

    /// Append a behavior producing an already-erased [`ReturnValue`], the
    /// escape hatch for return types without `Debug`.
    pub fn answers_with<F>(&mut self, f: F) -> &mut ExpectationGuard
        where F: FnMut(&Args) -> ReturnValue + Send + 'static
    {
        self.push_behavior(Behavior {
            label: "answers <function>".to_owned(),
            kind: BehaviorKind::Answer(Box::new(f)),
        })
    }

    /// Append a behavior that panics with `message`, the stubbed-throw
    /// feature.  The payload propagates to the caller unchanged.
    pub fn panics(&mut self, message: impl Into<String>)
        -> &mut ExpectationGuard
    {
        let message = message.into();
        let label = format!("panics {message:?}");
        self.push_behavior(Behavior {
            label,
            kind: BehaviorKind::Panic(Box::new(move |_| message.clone())),
        })
    }

    /// Append a behavior that panics with a message computed from the
    /// call's arguments.
    pub fn panics_with<F>(&mut self, f: F) -> &mut ExpectationGuard
        where F: Fn(&Args) -> String + Send + 'static
    {
        self.push_behavior(Behavior {
            label: "panics <function>".to_owned(),
            kind: BehaviorKind::Panic(Box::new(f)),
        })
    }

    /// Append a behavior delegating to the real implementation.  Only
    /// meaningful on spies, whose glue supplies a real-call thunk; on a
    /// plain mock the call fails when it reaches this behavior.
    pub fn calls_real(&mut self) -> &mut ExpectationGuard {
        self.push_behavior(Behavior {
            label: "delegates to the real implementation".to_owned(),
            kind: BehaviorKind::CallReal,
        })
    }

    /// Move this expectation into a named ordering group.  Strict
    /// ordering is only enforced between expectations in the same group.
    pub fn in_group(&mut self, name: impl Into<String>)
        -> &mut ExpectationGuard
    {
        self.inner.ordering.lock().unwrap().group = name.into();
        self
    }

    /// Exempt this expectation from strict-ordering checks.
    pub fn at_any_time(&mut self) -> &mut ExpectationGuard {
        self.inner.ordering.lock().unwrap().any_time = true;
        self
    }
}
