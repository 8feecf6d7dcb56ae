// vim: tw=80
//! The single-threaded behavior escape hatch: non-`Send` closures run on
//! the thread that programmed them and refuse to run anywhere else.

use std::{cell::Cell, rc::Rc, thread};

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
fn runs_on_the_programming_thread() {
    let session = Session::new();
    let mock = session.mock(&COUNTER_DESC, MockOptions::new());

    let count = Rc::new(Cell::new(0u32));
    let inner = Rc::clone(&count);
    session.stub(&mock, "next").answers_st(move |_| {
        inner.set(inner.get() + 1);
        inner.get()
    });

    let counter = CounterDouble::new(mock.clone());
    assert_eq!(counter.next(), 1);
    assert_eq!(counter.next(), 2);
    assert_eq!(count.get(), 2);
}

#[test]
fn refuses_to_run_on_another_thread() {
    let session = Session::new();
    let mock = session.mock(&COUNTER_DESC, MockOptions::new());

    let count = Rc::new(Cell::new(0u32));
    session
        .stub(&mock, "next")
        .answers_st(move |_| count.get());

    let remote = mock.clone();
    let result = thread::spawn(move || {
        let counter = CounterDouble::new(remote);
        counter.next();
    })
    .join();
    assert!(result.is_err());
}
