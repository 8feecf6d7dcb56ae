// vim: tw=80
//! Resetting mocks: expectations and ledger entries go, identity and
//! activity stay.

use understudy::*;

trait Counter {
    fn next(&self) -> u32;
}

double! {
    struct CounterDouble: Counter as COUNTER_DESC {
        fn next(&self) -> u32;
    }
}

#[test]
fn clears_expectations_and_ledger_entries() {
    let session = Session::new();
    let mock = session.mock(&COUNTER_DESC, MockOptions::new());
    session.stub(&mock, "next").returns(1u32);

    let counter = CounterDouble::new(mock.clone());
    assert_eq!(counter.next(), 1);

    session.reset(&mock);
    assert!(session.invocations(&mock).is_empty());

    session.expect(&mock, "next").returns(2u32);
    assert_eq!(counter.next(), 2);
    session.verify(&mock);
}

#[test]
fn other_mocks_are_untouched() {
    let session = Session::new();
    let first = session.mock(&COUNTER_DESC, MockOptions::new());
    let second = session.mock(&COUNTER_DESC, MockOptions::new());
    session.stub(&first, "next").returns(1u32);
    session.stub(&second, "next").returns(2u32);

    let a = CounterDouble::new(first.clone());
    let b = CounterDouble::new(second.clone());
    a.next();
    b.next();

    session.reset(&first);
    assert!(session.invocations(&first).is_empty());
    assert_eq!(session.invocations(&second).len(), 1);
}

#[test]
fn verify_and_reset_allows_reprogramming() {
    let session = Session::new();
    let mock = session.mock(&COUNTER_DESC, MockOptions::new());
    session.expect(&mock, "next").returns(1u32);

    let counter = CounterDouble::new(mock.clone());
    assert_eq!(counter.next(), 1);
    session.verify_and_reset(&mock);
    assert!(session.invocations(&mock).is_empty());

    session.stub(&mock, "next").returns(9u32);
    assert_eq!(counter.next(), 9);
}

#[test]
#[should_panic(expected = "verification failed for")]
fn verify_and_reset_fails_before_resetting() {
    let session = Session::new();
    let mock = session.mock(&COUNTER_DESC, MockOptions::new());
    session.expect(&mock, "next").returns(1u32);
    session.verify_and_reset(&mock);
}

#[test]
fn try_form_keeps_state_on_failure() {
    let session = Session::new();
    let mock = session.mock(&COUNTER_DESC, MockOptions::new());
    session.expect(&mock, "next").returns(4u32);

    assert!(session.try_verify_and_reset(&mock).is_err());

    // The failed pass left the expectation in place.
    let counter = CounterDouble::new(mock.clone());
    assert_eq!(counter.next(), 4);
}
