// vim: tw=80
//! Per-argument matchers and the call patterns built from them.
//!
//! A matcher compares one expectation template position against one
//! recorded argument.  The default is structural equality on the concrete
//! type; [`pred`] accepts anything implementing
//! [`Predicate`](predicates::Predicate), and mismatches captured from a
//! predicate are rendered as case trees in unexpected-invocation reports.

use predicates::Predicate;
use predicates_tree::CaseTreeExt;
use std::{
    any,
    fmt,
};

use crate::call::{Args, Value};

/// Outcome of applying one matcher to one argument.
pub(crate) enum MatchOutcome {
    Matched,
    /// Did not match; optionally a case-tree explanation.
    Mismatched(Option<String>),
    /// Could not be applied at all: the template element's concrete type
    /// differs from the argument's.  Carries the expected type name.
    Misapplied(&'static str),
}

/// A matcher for a single argument position.
///
/// Build them with [`any`], [`eq`], [`func`], or [`pred`], and pass them
/// to [`ExpectationGuard::with`](crate::ExpectationGuard::with) or
/// [`Check::on`](crate::Check::on) in declaration order.
pub struct ArgMatcher {
    label: String,
    test: Box<dyn Fn(&dyn Value) -> MatchOutcome + Send>,
}

impl ArgMatcher {
    pub(crate) fn apply(&self, value: &dyn Value) -> MatchOutcome {
        (self.test)(value)
    }
}

impl fmt::Display for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl fmt::Debug for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArgMatcher").field(&self.label).finish()
    }
}

/// Matches any value, including one of an unexpected concrete type.
pub fn any() -> ArgMatcher {
    ArgMatcher {
        label: "_".to_owned(),
        test: Box::new(|_| MatchOutcome::Matched),
    }
}

/// Matches a value equal to `expected`.
pub fn eq<T>(expected: T) -> ArgMatcher
    where T: any::Any + PartialEq + fmt::Debug + Send
{
    pred(predicates::ord::eq(expected))
}

/// Matches when `f` returns true for the argument.
pub fn func<T, F>(f: F) -> ArgMatcher
    where T: any::Any,
          F: Fn(&T) -> bool + Send + 'static
{
    ArgMatcher {
        label: "<function>".to_owned(),
        test: Box::new(move |v| match v.downcast_ref::<T>() {
            Ok(actual) => if f(actual) {
                MatchOutcome::Matched
            } else {
                MatchOutcome::Mismatched(None)
            },
            Err(_) => MatchOutcome::Misapplied(any::type_name::<T>()),
        }),
    }
}

/// Matches when the predicate accepts the argument.
///
/// ```
/// use predicates::prelude::*;
/// use understudy::matcher;
///
/// let m = matcher::pred(predicate::ge(10u32));
/// ```
pub fn pred<T, P>(p: P) -> ArgMatcher
    where T: any::Any,
          P: Predicate<T> + Send + 'static
{
    let label = p.to_string();
    ArgMatcher {
        label,
        test: Box::new(move |v| match v.downcast_ref::<T>() {
            Ok(actual) => match p.find_case(false, actual) {
                Some(case) => {
                    MatchOutcome::Mismatched(Some(case.tree().to_string()))
                },
                None => MatchOutcome::Matched,
            },
            Err(_) => MatchOutcome::Misapplied(any::type_name::<T>()),
        }),
    }
}

/// Matches a `String` argument against a predicate over `str`.
///
/// The predicates crate's string combinators are `Predicate<str>`, which
/// cannot be applied to an erased argument directly; this adapter
/// recovers the `String` and hands the predicate a borrowed slice.
///
/// ```
/// use predicates::prelude::*;
/// use understudy::matcher;
///
/// let m = matcher::str_pred(predicate::str::starts_with("b"));
/// ```
pub fn str_pred<P>(p: P) -> ArgMatcher
    where P: Predicate<str> + Send + 'static
{
    let label = p.to_string();
    ArgMatcher {
        label,
        test: Box::new(move |v| match v.downcast_ref::<String>() {
            Ok(actual) => match p.find_case(false, actual.as_str()) {
                Some(case) => {
                    MatchOutcome::Mismatched(Some(case.tree().to_string()))
                },
                None => MatchOutcome::Matched,
            },
            Err(_) => {
                MatchOutcome::Misapplied(any::type_name::<String>())
            },
        }),
    }
}

/// Result of matching a whole template against a call's arguments.
pub(crate) enum PatternMatch {
    Matched,
    Mismatched {
        /// Positional explanations, possibly empty.
        explanations: Vec<String>,
    },
    /// Configuration error; fatal rather than silently false.
    Misapplied {
        reason: String,
    },
}

/// An ordered template of per-position matchers.
pub(crate) struct CallPattern {
    matchers: Vec<ArgMatcher>,
}

impl CallPattern {
    /// A template matching any arguments of the given arity.
    pub(crate) fn wildcard(arity: usize) -> CallPattern {
        CallPattern {
            matchers: (0..arity).map(|_| any()).collect(),
        }
    }

    /// Arity is validated by the caller against the method signature.
    pub(crate) fn new(matchers: Vec<ArgMatcher>) -> CallPattern {
        CallPattern { matchers }
    }

    pub(crate) fn arity(&self) -> usize {
        self.matchers.len()
    }

    pub(crate) fn matches(&self, args: &Args) -> PatternMatch {
        if args.len() != self.matchers.len() {
            return PatternMatch::Mismatched { explanations: Vec::new() };
        }
        let mut matched = true;
        let mut explanations = Vec::new();
        for (i, m) in self.matchers.iter().enumerate() {
            let value = match args.erased(i) {
                Some(v) => v,
                None => {
                    return PatternMatch::Mismatched {
                        explanations: Vec::new(),
                    };
                },
            };
            match m.apply(value) {
                MatchOutcome::Matched => {},
                MatchOutcome::Mismatched(explanation) => {
                    matched = false;
                    if let Some(text) = explanation {
                        explanations.push(format!("argument {i}: {text}"));
                    }
                },
                MatchOutcome::Misapplied(expected) => {
                    return PatternMatch::Misapplied {
                        reason: format!(
                            "matcher for argument {i} expects {expected}, \
                             but the call supplied a value of type {}",
                            args.type_name(i),
                        ),
                    };
                },
            }
        }
        if matched {
            PatternMatch::Matched
        } else {
            PatternMatch::Mismatched { explanations }
        }
    }
}

impl fmt::Display for CallPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, m) in self.matchers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{m}")?;
        }
        write!(f, ")")
    }
}

/// Matcher diagnostics collected over one resolution or check pass.
///
/// Scoped to the pass, not process-wide; dispatch creates one, fills it
/// while scanning candidates, and folds it into the failure report.
pub(crate) struct MatchReport {
    entries: Vec<String>,
}

impl MatchReport {
    pub(crate) fn new() -> MatchReport {
        MatchReport { entries: Vec::new() }
    }

    pub(crate) fn near_miss(
        &mut self,
        expectation: &str,
        explanations: Vec<String>,
    ) {
        if explanations.is_empty() {
            self.entries.push(format!("{expectation}: arguments did not \
                                       match"));
        } else {
            for e in explanations {
                self.entries.push(format!("{expectation}: {e}"));
            }
        }
    }

    pub(crate) fn render(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut out = String::from("\nclosest mismatches:");
        for entry in &self.entries {
            out.push_str("\n    ");
            out.push_str(entry);
        }
        out
    }
}
