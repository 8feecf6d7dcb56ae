// vim: tw=80
//! Inspecting the ledger: rendered calls, claims, outcomes, and threads.

use pretty_assertions::assert_eq;
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
fn entries_carry_claims_and_outcomes() {
    let session = Session::new();
    let options = MockOptions::new().auto_stubbing();
    let mock = session.mock(&GREETER_DESC, options);
    session
        .expect(&mock, "greet")
        .with([matcher::eq("bob".to_owned())])
        .returns("hi".to_owned());

    let greeter = GreeterDouble::new(mock.clone());
    greeter.greet("bob".to_owned());
    greeter.greet("zed".to_owned());

    let views = session.invocations(&mock);
    assert_eq!(views.len(), 2);

    assert_eq!(views[0].call, "Greeter#0.greet(\"bob\")");
    assert!(views[0].claimed);
    assert_eq!(views[0].outcome, "returned \"hi\"");

    assert_eq!(views[1].call, "Greeter#0.greet(\"zed\")");
    assert!(!views[1].claimed);
    assert_eq!(views[1].outcome, "returned \"\"");

    session.verify(&mock);
}

#[test]
fn entries_name_their_thread() {
    let session = Session::new();
    let options = MockOptions::new().auto_stubbing();
    let mock = session.mock(&GREETER_DESC, options);

    let greeter = GreeterDouble::new(mock.clone());
    greeter.greet("bob".to_owned());

    let views = session.invocations(&mock);
    assert!(!views[0].thread.is_empty());
}

#[test]
fn named_mocks_render_under_their_name() {
    let session = Session::new();
    let options = MockOptions::new().auto_stubbing();
    let mock = session.named_mock("primary", &GREETER_DESC, options);
    assert_eq!(mock.name(), "primary");

    let greeter = GreeterDouble::new(mock.clone());
    greeter.greet("bob".to_owned());

    let views = session.invocations(&mock);
    assert_eq!(views[0].call, "primary.greet(\"bob\")");
}

#[test]
fn stubbed_panics_are_recorded_as_outcomes() {
    let session = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    session.stub(&mock, "greet").panics("boom");

    let greeter = GreeterDouble::new(mock.clone());
    let caught = std::panic::catch_unwind(|| {
        greeter.greet("bob".to_owned());
    });
    assert!(caught.is_err());

    let views = session.invocations(&mock);
    assert_eq!(views[0].outcome, "panicked: boom");
}
