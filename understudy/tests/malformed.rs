// vim: tw=80
//! Programming mistakes fail at registration time, before any call can
//! be misresolved.

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
#[should_panic(expected = "is not a method of")]
fn unknown_method_names_are_rejected() {
    let session = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    session.expect(&mock, "shout");
}

#[test]
#[should_panic(expected = "known methods: greet")]
fn the_rejection_lists_known_methods() {
    let session = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    session.expect(&mock, "shout");
}

#[test]
#[should_panic(expected = "matcher template has arity 2")]
fn arity_mismatches_are_rejected() {
    let session = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    session.expect(&mock, "greet").with([
        matcher::eq("a".to_owned()),
        matcher::eq("b".to_owned()),
    ]);
}

#[test]
#[should_panic(expected = "minimum call count 3 exceeds maximum 1")]
fn unreachable_ranges_are_rejected() {
    let session = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    session.expect(&mock, "greet").between(3, 1);
}

#[test]
#[should_panic(expected = "one-shot behaviors but admits at most 1")]
fn surplus_one_shots_are_rejected() {
    let session = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    session
        .expect(&mock, "greet")
        .returns_once("a".to_owned())
        .returns_once("b".to_owned());
}

#[test]
#[should_panic(expected = "one-shot behaviors but admits at most 2")]
fn shrinking_the_range_below_the_one_shots_is_rejected() {
    let session = Session::new();
    let mock = session.mock(&GREETER_DESC, MockOptions::new());
    session
        .expect(&mock, "greet")
        .times(3)
        .returns_once("a".to_owned())
        .returns_once("b".to_owned())
        .returns_once("c".to_owned())
        .times(2);
}
