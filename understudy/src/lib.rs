// vim: tw=80
//! A mock object library built around an interception core.
//!
//! Understudy stands in for collaborators in unit tests.  Every call on a
//! stand-in is intercepted, recorded in a session-wide ledger, resolved
//! against programmed expectations, and answered by the expectation's
//! next behavior.  Verification happens after the fact, against the
//! ledger, so a test can assert call counts, argument values, and strict
//! ordering without arranging any of it up front.
//!
//! # Usage
//!
//! The basic idea:
//! * Create a [`Session`] in your test, and mocks from it.  A mock is
//!   described by a [`TypeDescriptor`], which the [`double!`] macro
//!   generates for owned-argument trait shapes along with the proxy glue
//!   that routes calls into the mock.
//! * Program expectations with [`Session::expect`] (required calls) or
//!   [`Session::stub`] (allowed calls).  Each expectation carries
//!   argument matchers, a call-count range, and a sequence of behaviors.
//! * Hand the double to the code under test.  Matching calls execute
//!   their programmed behaviors; anything contrary to the expectations
//!   panics with a full report.
//! * Verify.  Explicitly with [`Session::verify`] and the
//!   [`Session::check`] builder, or implicitly: dropping the session
//!   verifies every mock that was never verified by hand.
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Call counts`](#call-counts)
//! * [`Behaviors`](#behaviors)
//! * [`Spies`](#spies)
//! * [`Auto-stubbing`](#auto-stubbing)
//! * [`Strict ordering`](#strict-ordering)
//! * [`Post-hoc checks`](#post-hoc-checks)
//! * [`Class mocks and statics`](#class-mocks-and-statics)
//! * [`The ledger`](#the-ledger)
//! * [`Errors`](#errors)
//! * [`Multithreading`](#multithreading)
//!
//! ## Getting started
//! ```
//! use understudy::{double, matcher, MockOptions, Session};
//!
//! trait Greeter {
//!     fn greet(&self, name: String) -> String;
//! }
//!
//! double! {
//!     struct GreeterDouble: Greeter as GREETER_DESC {
//!         fn greet(&self, name: String) -> String;
//!     }
//! }
//!
//! fn welcome(greeter: &dyn Greeter) -> String {
//!     greeter.greet("bob".to_owned())
//! }
//!
//! let session = Session::new();
//! let mock = session.mock(&GREETER_DESC, MockOptions::new());
//! session.expect(&mock, "greet")
//!     .with([matcher::eq("bob".to_owned())])
//!     .returns("hello, bob".to_owned());
//!
//! let greeter = GreeterDouble::new(mock.clone());
//! assert_eq!(welcome(&greeter), "hello, bob");
//! session.verify(&mock);
//! ```
//!
//! ## Matching arguments
//!
//! An expectation matches any arguments until [`with`] narrows it.
//! Matchers come from the [`matcher`] module: [`matcher::eq`] for
//! structural equality, [`matcher::any`] as an explicit wildcard,
//! [`matcher::func`] for ad hoc tests, and [`matcher::pred`] for
//! anything implementing [`Predicate`].  String arguments recorded as
//! `String` take predicates over `str` through [`matcher::str_pred`].
//!
//! ```
//! use predicates::prelude::*;
//! use understudy::{double, matcher, MockOptions, Session};
//!
//! trait Greeter {
//!     fn greet(&self, name: String) -> String;
//! }
//!
//! double! {
//!     struct GreeterDouble: Greeter as GREETER_DESC {
//!         fn greet(&self, name: String) -> String;
//!     }
//! }
//!
//! let session = Session::new();
//! let mock = session.mock(&GREETER_DESC, MockOptions::new());
//! session.stub(&mock, "greet")
//!     .with([matcher::str_pred(predicate::str::starts_with("b"))])
//!     .returns("hi".to_owned());
//!
//! let greeter = GreeterDouble::new(mock.clone());
//! assert_eq!(greeter.greet("bob".to_owned()), "hi");
//! ```
//!
//! When several expectations match the same call, the most recently
//! registered one wins.  That makes overriding natural: register a broad
//! stub early, then shadow it for specific arguments later in the test.
//!
//! ## Call counts
//!
//! [`Session::expect`] requires exactly one matching call unless the
//! guard says otherwise; [`Session::stub`] allows any number, including
//! none.  The guard refines the range with [`times`], [`at_least`],
//! [`at_most`], [`between`], and [`never`].  Maximums are enforced as
//! calls arrive: once an expectation is saturated it stops matching, and
//! a call nothing else accepts fails immediately.  Minimums are checked
//! at verification.
//!
//! ## Behaviors
//!
//! Each matching call consumes the expectation's next behavior; the last
//! behavior repeats once the sequence runs out.  [`returns`] clones a
//! fixed value, [`returns_once`] moves a non-`Clone` value,
//! [`returns_consecutively`] programs a value per call, [`answers`]
//! computes the result from the [`Args`], [`panics`] raises the
//! programmed payload, and [`noop`] does nothing beyond producing the
//! default return value.
//!
//! ```
//! use understudy::{double, MockOptions, Session};
//!
//! trait Counter {
//!     fn next(&self) -> u32;
//! }
//!
//! double! {
//!     struct CounterDouble: Counter as COUNTER_DESC {
//!         fn next(&self) -> u32;
//!     }
//! }
//!
//! let session = Session::new();
//! let mock = session.mock(&COUNTER_DESC, MockOptions::new());
//! session.stub(&mock, "next").returns_consecutively([1u32, 2, 3]);
//!
//! let counter = CounterDouble::new(mock.clone());
//! assert_eq!(counter.next(), 1);
//! assert_eq!(counter.next(), 2);
//! assert_eq!(counter.next(), 3);
//! assert_eq!(counter.next(), 3);
//! ```
//!
//! ## Spies
//!
//! A spy wraps a real implementation.  Matched calls behave like mock
//! calls; unmatched calls delegate to the real object, and their real
//! return values are recorded in the ledger like any other outcome.  The
//! `wrapping` form of [`double!`] generates the glue, and
//! [`Session::spy`] creates the mock with partial delegation switched
//! on.  A [`calls_real`] behavior delegates explicitly from inside a
//! matched expectation.
//!
//! ```
//! use understudy::{double, matcher, MockOptions, Session};
//!
//! trait Adder {
//!     fn add(&self, a: i64, b: i64) -> i64;
//! }
//!
//! struct RealAdder;
//! impl Adder for RealAdder {
//!     fn add(&self, a: i64, b: i64) -> i64 {
//!         a + b
//!     }
//! }
//!
//! double! {
//!     struct AdderSpy: Adder as ADDER_DESC wrapping RealAdder {
//!         fn add(&self, a: i64, b: i64) -> i64;
//!     }
//! }
//!
//! let session = Session::new();
//! let mock = session.spy(&ADDER_DESC, MockOptions::new());
//! session.stub(&mock, "add")
//!     .with([matcher::eq(0i64), matcher::any()])
//!     .returns(100i64);
//!
//! let spy = AdderSpy::new(mock.clone(), RealAdder);
//! assert_eq!(spy.add(2, 2), 4);
//! assert_eq!(spy.add(0, 7), 100);
//! ```
//!
//! ## Auto-stubbing
//!
//! With [`MockOptions::auto_stubbing`], a call no expectation matches
//! returns the method's default value instead of failing: zero for
//! integers, `false` for `bool`, empty for collections, `None` for
//! options.  Auto-stubbed calls stay unclaimed in the ledger, so
//! [`Session::check_nothing_else_happened`] still surfaces them.
//!
//! ## Strict ordering
//!
//! A mock created with [`MockOptions::strictly_ordered`] is additionally
//! verified against registration order: calls claimed by its
//! expectations must arrive in the order the expectations were
//! registered.  [`in_group`] scopes the ordering to a named group, and
//! [`at_any_time`] exempts one expectation entirely.
//!
//! ```
//! use understudy::{double, MockOptions, Session};
//!
//! trait Store {
//!     fn open(&self);
//!     fn close(&self);
//! }
//!
//! double! {
//!     struct StoreDouble: Store as STORE_DESC {
//!         fn open(&self);
//!         fn close(&self);
//!     }
//! }
//!
//! let session = Session::new();
//! let mock =
//!     session.mock(&STORE_DESC, MockOptions::new().strictly_ordered());
//! session.expect(&mock, "open").noop();
//! session.expect(&mock, "close").noop();
//!
//! let store = StoreDouble::new(mock.clone());
//! store.open();
//! store.close();
//! session.verify(&mock);
//! ```
//!
//! ## Post-hoc checks
//!
//! The [`Session::check`] builder asserts call counts after the fact,
//! without any expectation having been registered up front.  Checks
//! claim the calls they match, and
//! [`Session::check_nothing_else_happened`] then asserts the ledger
//! holds nothing unclaimed.
//!
//! ```
//! use understudy::{double, matcher, MockOptions, Session};
//!
//! trait Adder {
//!     fn add(&self, a: i64, b: i64) -> i64;
//! }
//!
//! double! {
//!     struct AdderDouble: Adder as ADDER_DESC {
//!         fn add(&self, a: i64, b: i64) -> i64;
//!     }
//! }
//!
//! let session = Session::new();
//! let mock =
//!     session.mock(&ADDER_DESC, MockOptions::new().auto_stubbing());
//! let adder = AdderDouble::new(mock.clone());
//! adder.add(2, 2);
//! adder.add(2, 2);
//!
//! session.check(&mock)
//!     .times(2)
//!     .on("add", [matcher::eq(2i64), matcher::eq(2i64)]);
//! session.check_nothing_else_happened(&[&mock]);
//! ```
//!
//! ## Class mocks and statics
//!
//! Constructors and associated functions have no receiver to dispatch
//! through, so their glue goes through a process-wide intercept table
//! instead: [`Session::class_mock`] installs the interception for a
//! type, and hand-written glue routes calls with [`dispatch_static`].
//! Dropping the session tears the interception down; a later call
//! through the glue fails as a zombie.
//!
//! ```
//! use understudy::{
//!     dispatch_static, Call, CallKind, Fallback, MethodSig,
//!     MockOptions, Session, TypeDescriptor,
//! };
//!
//! struct KeyGen;
//!
//! static KEYGEN_DESC: TypeDescriptor = TypeDescriptor {
//!     type_name: "KeyGen",
//!     methods: &[MethodSig {
//!         name: "generate",
//!         params: &[],
//!         ret: "u64",
//!         kind: CallKind::Static,
//!     }],
//! };
//!
//! fn generate() -> u64 {
//!     dispatch_static::<KeyGen>(
//!         Call::static_fn("generate"),
//!         Fallback::of_type::<u64>(),
//!     )
//!     .take("generate")
//! }
//!
//! let session = Session::new();
//! let mock = session.class_mock::<KeyGen>(&KEYGEN_DESC,
//!                                         MockOptions::new());
//! session.expect(&mock, "generate").returns(42u64);
//! assert_eq!(generate(), 42);
//! session.verify(&mock);
//! ```
//!
//! ## The ledger
//!
//! Every dispatched call lands in the session's ledger with a gapless
//! sequence number, the thread it arrived on, what claimed it, and how
//! it ended.  [`Session::invocations`] exposes the entries as
//! [`InvocationView`] rows for debugging or custom assertions, and the
//! crate emits `tracing` events under the `understudy::*` targets as
//! calls are recorded and resolved.
//!
//! ## Errors
//!
//! Everything that can fail a test is a variant of [`Error`], and every
//! failure panics with the error's `Display` rendering, so tests assert
//! on failures with `#[should_panic(expected = "...")]`.  The
//! verification entry points also come in `try_` forms returning
//! `Result<(), Error>` for programmatic use.  Panics programmed with
//! [`panics`] are not framework errors; the payload propagates to the
//! caller unchanged.
//!
//! ```should_panic
//! use understudy::{double, MockOptions, Session};
//!
//! trait Greeter {
//!     fn greet(&self, name: String) -> String;
//! }
//!
//! double! {
//!     struct GreeterDouble: Greeter as GREETER_DESC {
//!         fn greet(&self, name: String) -> String;
//!     }
//! }
//!
//! let session = Session::new();
//! let mock = session.mock(&GREETER_DESC, MockOptions::new());
//! let greeter = GreeterDouble::new(mock.clone());
//! // No expectation matches: unexpected invocation.
//! greeter.greet("bob".to_owned());
//! ```
//!
//! ## Multithreading
//!
//! Mocks may be called from any thread; claiming is atomic, so a
//! saturated expectation never over-matches even under contention.
//! Matchers and behaviors must be `Send` because they execute on the
//! calling thread.  For closures that are not `Send`, use the
//! single-threaded escape hatch [`answers_st`], which panics if a call
//! reaches it from a thread other than the one that programmed it.
//!
//! [`with`]: ExpectationGuard::with
//! [`times`]: ExpectationGuard::times
//! [`at_least`]: ExpectationGuard::at_least
//! [`at_most`]: ExpectationGuard::at_most
//! [`between`]: ExpectationGuard::between
//! [`never`]: ExpectationGuard::never
//! [`returns`]: ExpectationGuard::returns
//! [`returns_once`]: ExpectationGuard::returns_once
//! [`returns_consecutively`]: ExpectationGuard::returns_consecutively
//! [`answers`]: ExpectationGuard::answers
//! [`answers_st`]: ExpectationGuard::answers_st
//! [`panics`]: ExpectationGuard::panics
//! [`noop`]: ExpectationGuard::noop
//! [`calls_real`]: ExpectationGuard::calls_real
//! [`in_group`]: ExpectationGuard::in_group
//! [`at_any_time`]: ExpectationGuard::at_any_time

mod call;
mod dispatch;
mod error;
mod expectation;
mod intercepts;
mod ledger;
mod macros;
pub mod matcher;
mod session;
mod verify;

pub use call::{
    Args, Call, CallKind, Fallback, MethodSig, RealThunk, ReturnValue,
    TypeDescriptor, Value,
};
pub use dispatch::Mock;
pub use error::Error;
pub use expectation::ExpectationGuard;
pub use intercepts::dispatch_static;
pub use ledger::InvocationView;
pub use session::{MockOptions, Session};
pub use verify::Check;

pub use predicates::prelude::{predicate, Predicate};
