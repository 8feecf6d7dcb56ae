// vim: tw=80
//! Zombie calls: proxies whose interception is gone fail loudly instead
//! of answering from stale state.

use understudy::*;

trait Greeter {
    fn greet(&self, name: String) -> String;
}

double! {
    struct GreeterDouble: Greeter as GREETER_DESC {
        fn greet(&self, name: String) -> String;
    }
}

#[test]
#[should_panic(expected = "zombie call on")]
fn deactivated_mocks_reject_calls() {
    let session = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    session.deactivate(&mock);

    let greeter = GreeterDouble::new(mock.clone());
    greeter.greet("bob".to_owned());
}

#[test]
#[should_panic(expected = "zombie call on")]
fn proxies_outliving_the_session_reject_calls() {
    let session = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    let greeter = GreeterDouble::new(mock.clone());
    drop(session);

    greeter.greet("bob".to_owned());
}

#[test]
#[should_panic(expected = "no live interception")]
fn the_failure_explains_itself() {
    let session = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    session.deactivate(&mock);

    let greeter = GreeterDouble::new(mock.clone());
    greeter.greet("bob".to_owned());
}

#[test]
#[should_panic(expected = "mock created at:")]
fn tracing_mocks_report_their_creation_site() {
    let session = Session::new();
    let mock =
        session.mock(&GREETER_DESC, MockOptions::new().tracing());
    session.deactivate(&mock);

    let greeter = GreeterDouble::new(mock.clone());
    greeter.greet("bob".to_owned());
}

#[test]
#[should_panic(expected = "mock is deactivated")]
fn programming_a_deactivated_mock_is_malformed() {
    let session = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    session.deactivate(&mock);
    session.expect(&mock, "greet");
}

#[test]
fn deactivation_excuses_unmet_expectations() {
    let session = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    session.expect(&mock, "greet").returns("hi".to_owned());

    // Never called; retiring the mock waives the drop-time pass.
    session.deactivate(&mock);
}

#[test]
#[should_panic(expected = "belongs to a different session")]
fn mocks_cannot_cross_sessions() {
    let session = Session::new();
    let other = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    other.expect(&mock, "greet");
}
