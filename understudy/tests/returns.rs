// vim: tw=80
//! Programmed return behaviors: fixed values, sequences, one-shot moves,
//! computed answers, and stubbed panics.

use understudy::*;

trait Calculator {
    fn add(&self, a: i64, b: i64) -> i64;
    fn label(&self) -> String;
}

double! {
    struct CalculatorDouble: Calculator as CALCULATOR_DESC {
        fn add(&self, a: i64, b: i64) -> i64;
        fn label(&self) -> String;
    }
}

#[derive(Debug, Default, PartialEq)]
struct Token(u64);

trait Vault {
    fn issue(&self) -> Token;
}

double! {
    struct VaultDouble: Vault as VAULT_DESC {
        fn issue(&self) -> Token;
    }
}

#[test]
fn fixed_value() {
    let session = Session::new();
    let mock = session.mock(&CALCULATOR_DESC, MockOptions::new());
    session.expect(&mock, "add").returns(5i64);

    let calc = CalculatorDouble::new(mock.clone());
    assert_eq!(calc.add(2, 3), 5);
    session.verify(&mock);
}

#[test]
fn consecutive_values_then_last_repeats() {
    let session = Session::new();
    let mock = session.mock(&CALCULATOR_DESC, MockOptions::new());
    session.stub(&mock, "add").returns_consecutively([1i64, 2, 3]);

    let calc = CalculatorDouble::new(mock.clone());
    assert_eq!(calc.add(0, 0), 1);
    assert_eq!(calc.add(0, 0), 2);
    assert_eq!(calc.add(0, 0), 3);
    assert_eq!(calc.add(0, 0), 3);
}

#[test]
fn computed_from_arguments() {
    let session = Session::new();
    let mock = session.mock(&CALCULATOR_DESC, MockOptions::new());
    session.stub(&mock, "add").answers(|args| {
        let a = args.value::<i64>(0).copied().unwrap();
        let b = args.value::<i64>(1).copied().unwrap();
        a + b
    });

    let calc = CalculatorDouble::new(mock.clone());
    assert_eq!(calc.add(19, 23), 42);
    assert_eq!(calc.add(-1, 1), 0);
}

#[test]
fn default_value_behavior() {
    let session = Session::new();
    let mock = session.mock(&CALCULATOR_DESC, MockOptions::new());
    session.expect(&mock, "label").returns_default();

    let calc = CalculatorDouble::new(mock.clone());
    assert_eq!(calc.label(), String::new());
    session.verify(&mock);
}

#[test]
fn one_shot_moves_a_value_out() {
    let session = Session::new();
    let mock = session.mock(&VAULT_DESC, MockOptions::new());
    session.expect(&mock, "issue").returns_once(Token(7));

    let vault = VaultDouble::new(mock.clone());
    assert_eq!(vault.issue(), Token(7));
    session.verify(&mock);
}

#[test]
#[should_panic(expected = "returns by move and was already consumed")]
fn one_shot_cannot_repeat() {
    let session = Session::new();
    let mock = session.mock(&VAULT_DESC, MockOptions::new());
    session.stub(&mock, "issue").returns_once(Token(7));

    let vault = VaultDouble::new(mock.clone());
    vault.issue();
    vault.issue();
}

#[test]
#[should_panic(expected = "wires crossed")]
fn stubbed_panic_propagates() {
    let session = Session::new();
    let mock = session.mock(&CALCULATOR_DESC, MockOptions::new());
    session.expect(&mock, "add").panics("wires crossed");

    let calc = CalculatorDouble::new(mock.clone());
    calc.add(1, 1);
}

#[test]
#[should_panic(expected = "no result for (1, 2)")]
fn stubbed_panic_message_computed_from_arguments() {
    let session = Session::new();
    let mock = session.mock(&CALCULATOR_DESC, MockOptions::new());
    session
        .expect(&mock, "add")
        .panics_with(|args| format!("no result for {args:?}"));

    let calc = CalculatorDouble::new(mock.clone());
    calc.add(1, 2);
}

#[test]
#[should_panic(expected = "produced a value of type")]
fn behavior_with_wrong_return_type() {
    let session = Session::new();
    let mock = session.mock(&CALCULATOR_DESC, MockOptions::new());
    session
        .stub(&mock, "add")
        .answers_with(|_| ReturnValue::of(7u32));

    let calc = CalculatorDouble::new(mock.clone());
    calc.add(1, 1);
}
