// vim: tw=80
//! Class mocks: constructor and associated-function interception through
//! the process-wide table.
//!
//! Each test uses its own key type.  The intercept table is shared by
//! every test in the binary, and the harness runs them concurrently.

use understudy::*;

static WIDGET_DESC: TypeDescriptor = TypeDescriptor {
    type_name: "Widget",
    methods: &[
        MethodSig {
            name: "new",
            params: &["u32"],
            ret: "u64",
            kind: CallKind::Constructor,
        },
        MethodSig {
            name: "version",
            params: &[],
            ret: "u32",
            kind: CallKind::Static,
        },
        MethodSig {
            name: "render",
            params: &[],
            ret: "()",
            kind: CallKind::Method,
        },
    ],
};

fn construct<K: 'static>(size: u32) -> u64 {
    dispatch_static::<K>(
        Call::constructor("new").arg(size),
        Fallback::of_type::<u64>(),
    )
    .take("new")
}

fn version<K: 'static>() -> u32 {
    dispatch_static::<K>(
        Call::static_fn("version"),
        Fallback::of_type::<u32>(),
    )
    .take("version")
}

#[test]
fn constructor_expectations() {
    struct WidgetA;
    let session = Session::new();
    let mock = session.class_mock::<WidgetA>(&WIDGET_DESC,
                                             MockOptions::new());
    session
        .expect(&mock, "new")
        .with([matcher::eq(640u32)])
        .returns(7u64);

    assert_eq!(construct::<WidgetA>(640), 7);
    session.verify(&mock);
}

#[test]
fn static_function_expectations() {
    struct WidgetB;
    let session = Session::new();
    let mock = session.class_mock::<WidgetB>(&WIDGET_DESC,
                                             MockOptions::new());
    session.expect(&mock, "version").times(2).returns(3u32);

    assert_eq!(version::<WidgetB>(), 3);
    assert_eq!(version::<WidgetB>(), 3);
    session.verify(&mock);
}

#[test]
#[should_panic(expected = "zombie call on")]
fn unregistered_types_are_zombies() {
    struct Orphan;
    version::<Orphan>();
}

#[test]
#[should_panic(expected = "zombie call on")]
fn torn_down_interceptions_are_zombies() {
    struct WidgetC;
    {
        let session = Session::new();
        let mock = session.class_mock::<WidgetC>(&WIDGET_DESC,
                                                 MockOptions::new());
        session.stub(&mock, "version").returns(1u32);
        assert_eq!(version::<WidgetC>(), 1);
    }
    version::<WidgetC>();
}

#[test]
#[should_panic(expected = "already intercepted by")]
fn live_interceptions_do_not_stack() {
    struct WidgetD;
    let session = Session::new();
    let _first = session.class_mock::<WidgetD>(&WIDGET_DESC,
                                               MockOptions::new());
    session.class_mock::<WidgetD>(&WIDGET_DESC, MockOptions::new());
}

#[test]
fn dead_interceptions_are_replaced() {
    struct WidgetE;
    {
        let session = Session::new();
        let mock = session.class_mock::<WidgetE>(&WIDGET_DESC,
                                                 MockOptions::new());
        session.stub(&mock, "version").returns(1u32);
        assert_eq!(version::<WidgetE>(), 1);
    }

    let session = Session::new();
    let mock = session.class_mock::<WidgetE>(&WIDGET_DESC,
                                             MockOptions::new());
    session.stub(&mock, "version").returns(2u32);
    assert_eq!(version::<WidgetE>(), 2);
}

#[test]
fn deactivated_interceptions_are_replaced() {
    struct WidgetF;
    let session = Session::new();
    let retired = session.class_mock::<WidgetF>(&WIDGET_DESC,
                                                MockOptions::new());
    session.deactivate(&retired);

    let mock = session.class_mock::<WidgetF>(&WIDGET_DESC,
                                             MockOptions::new());
    session.stub(&mock, "version").returns(5u32);
    assert_eq!(version::<WidgetF>(), 5);
}

#[test]
#[should_panic(expected = "must be registered on a class mock")]
fn statics_do_not_belong_on_instance_mocks() {
    let session = Session::new();
    let mock = session.mock(&WIDGET_DESC, MockOptions::new());
    session.expect(&mock, "version");
}

#[test]
#[should_panic(expected = "must be registered on an instance mock")]
fn methods_do_not_belong_on_class_mocks() {
    struct WidgetG;
    let session = Session::new();
    let mock = session.class_mock::<WidgetG>(&WIDGET_DESC,
                                             MockOptions::new());
    session.expect(&mock, "render");
}

#[test]
fn constructor_calls_render_with_the_type_name() {
    struct WidgetH;
    let session = Session::new();
    let options = MockOptions::new().auto_stubbing();
    let mock = session.class_mock::<WidgetH>(&WIDGET_DESC, options);

    construct::<WidgetH>(3);

    let views = session.invocations(&mock);
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].call, "new Widget(3)");
}
