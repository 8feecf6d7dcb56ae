// vim: tw=80
//! Call-count ranges: maximums enforced at dispatch, minimums at
//! verification.

use understudy::*;

trait Pinger {
    fn ping(&self) -> u32;
}

double! {
    struct PingerDouble: Pinger as PINGER_DESC {
        fn ping(&self) -> u32;
    }
}

#[test]
fn exact_count_satisfied() {
    let session = Session::new();
    let mock = session.mock(&PINGER_DESC, MockOptions::new());
    session.expect(&mock, "ping").times(3).returns(1u32);

    let pinger = PingerDouble::new(mock.clone());
    pinger.ping();
    pinger.ping();
    pinger.ping();
    session.verify(&mock);
}

#[test]
#[should_panic(expected = "unexpected invocation on")]
fn calls_beyond_the_maximum_fail() {
    let session = Session::new();
    let mock = session.mock(&PINGER_DESC, MockOptions::new());
    session.expect(&mock, "ping").times(2).returns(1u32);

    let pinger = PingerDouble::new(mock.clone());
    pinger.ping();
    pinger.ping();
    pinger.ping();
}

#[test]
fn at_most_allows_fewer() {
    let session = Session::new();
    let mock = session.mock(&PINGER_DESC, MockOptions::new());
    session.expect(&mock, "ping").at_most(5).returns(1u32);

    let pinger = PingerDouble::new(mock.clone());
    pinger.ping();
    session.verify(&mock);
}

#[test]
fn at_least_counts_up_without_bound() {
    let session = Session::new();
    let mock = session.mock(&PINGER_DESC, MockOptions::new());
    session.expect(&mock, "ping").at_least(2).returns(1u32);

    let pinger = PingerDouble::new(mock.clone());
    for _ in 0..10 {
        pinger.ping();
    }
    session.verify(&mock);
}

#[test]
fn between_accepts_the_whole_range() {
    let session = Session::new();
    let mock = session.mock(&PINGER_DESC, MockOptions::new());
    session.expect(&mock, "ping").between(1, 3).returns(1u32);

    let pinger = PingerDouble::new(mock.clone());
    pinger.ping();
    pinger.ping();
    session.verify(&mock);
}

#[test]
#[should_panic(expected = "verification failed for")]
fn verification_reports_unmet_minimums() {
    let session = Session::new();
    let mock = session.mock(&PINGER_DESC, MockOptions::new());
    session.expect(&mock, "ping").times(2).returns(1u32);

    let pinger = PingerDouble::new(mock.clone());
    pinger.ping();
    session.verify(&mock);
}

#[test]
#[should_panic(expected = "expected exactly twice, called once")]
fn verification_failure_names_the_shortfall() {
    let session = Session::new();
    let mock = session.mock(&PINGER_DESC, MockOptions::new());
    session.expect(&mock, "ping").times(2).returns(1u32);

    let pinger = PingerDouble::new(mock.clone());
    pinger.ping();
    session.verify(&mock);
}

#[test]
#[should_panic(expected = "unexpected invocation on")]
fn never_rejects_any_call() {
    let session = Session::new();
    let mock = session.mock(&PINGER_DESC, MockOptions::new());
    session.expect(&mock, "ping").never();

    let pinger = PingerDouble::new(mock.clone());
    pinger.ping();
}

#[test]
fn never_is_satisfied_by_silence() {
    let session = Session::new();
    let mock = session.mock(&PINGER_DESC, MockOptions::new());
    session.expect(&mock, "ping").never();
    session.verify(&mock);
}
