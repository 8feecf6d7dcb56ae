// vim: tw=80
//! Post-hoc checks: counting and claiming ledger entries after the fact.

use understudy::*;

trait Mailer {
    fn send(&self, to: String) -> bool;
}

double! {
    struct MailerDouble: Mailer as MAILER_DESC {
        fn send(&self, to: String) -> bool;
    }
}

#[test]
fn counts_and_claims_matching_calls() {
    let session = Session::new();
    let mock =
        session.mock(&MAILER_DESC, MockOptions::new().auto_stubbing());

    let mailer = MailerDouble::new(mock.clone());
    mailer.send("a".to_owned());
    mailer.send("a".to_owned());
    mailer.send("b".to_owned());

    session
        .check(&mock)
        .times(2)
        .on("send", [matcher::eq("a".to_owned())]);
    session.check(&mock).once().on("send", [matcher::eq("b".to_owned())]);
    session.check_nothing_else_happened(&[&mock]);
}

#[test]
fn checks_consume_what_they_claim() {
    let session = Session::new();
    let mock =
        session.mock(&MAILER_DESC, MockOptions::new().auto_stubbing());

    let mailer = MailerDouble::new(mock.clone());
    mailer.send("a".to_owned());

    session.check(&mock).once().on_any("send");
    let again = session.check(&mock).once().try_on_any("send");
    assert!(matches!(again, Err(Error::FailedCheck { .. })));
}

#[test]
fn default_cardinality_is_at_least_once() {
    let session = Session::new();
    let mock =
        session.mock(&MAILER_DESC, MockOptions::new().auto_stubbing());

    let mailer = MailerDouble::new(mock.clone());
    mailer.send("a".to_owned());
    mailer.send("a".to_owned());

    // No explicit count: one or more matching calls pass.
    session.check(&mock).on_any("send");
}

#[test]
fn expectation_claims_are_visible_to_checks() {
    let session = Session::new();
    let mock =
        session.mock(&MAILER_DESC, MockOptions::new().auto_stubbing());
    session
        .expect(&mock, "send")
        .with([matcher::eq("a".to_owned())])
        .returns(true);

    let mailer = MailerDouble::new(mock.clone());
    mailer.send("a".to_owned());
    mailer.send("b".to_owned());

    session.check(&mock).times(2).on_any("send");
    session.verify(&mock);
}

#[test]
fn unexpectedly_counts_only_unclaimed_calls() {
    let session = Session::new();
    let mock =
        session.mock(&MAILER_DESC, MockOptions::new().auto_stubbing());
    session
        .expect(&mock, "send")
        .with([matcher::eq("a".to_owned())])
        .returns(true);

    let mailer = MailerDouble::new(mock.clone());
    mailer.send("a".to_owned());
    mailer.send("b".to_owned());

    session.check(&mock).once().unexpectedly().on_any("send");
    session.verify(&mock);
    session.check_nothing_else_happened(&[&mock]);
}

#[test]
#[should_panic(expected = "check failed for")]
fn failing_check_panics() {
    let session = Session::new();
    let mock = session.mock(&MAILER_DESC, MockOptions::new());
    session.check(&mock).once().on_any("send");
}

#[test]
fn never_check_passes_on_silence() {
    let session = Session::new();
    let mock = session.mock(&MAILER_DESC, MockOptions::new());
    session.check(&mock).never().on_any("send");
}

#[test]
fn failed_check_reports_the_observed_count() {
    let session = Session::new();
    let mock =
        session.mock(&MAILER_DESC, MockOptions::new().auto_stubbing());

    let mailer = MailerDouble::new(mock.clone());
    mailer.send("a".to_owned());

    let result = session.check(&mock).times(3).try_on_any("send");
    match result {
        Err(Error::FailedCheck { details, .. }) => {
            assert!(details.contains("expected exactly 3 times"));
            assert!(details.contains("observed once"));
        },
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn try_on_reports_unknown_methods() {
    let session = Session::new();
    let mock = session.mock(&MAILER_DESC, MockOptions::new());
    let result = session.check(&mock).try_on_any("deliver");
    assert!(matches!(
        result,
        Err(Error::MalformedExpectation { .. })
    ));
}
