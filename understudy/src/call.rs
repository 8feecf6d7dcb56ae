// vim: tw=80
//! Normalized descriptions of intercepted calls, and the type-erased
//! values that flow through them.
//!
//! Proxy glue builds a [`Call`] for every intercepted invocation and hands
//! it to [`Mock::dispatch`](crate::Mock::dispatch) together with a
//! [`Fallback`] thunk for the method's default return value and, for
//! spies, a thunk invoking the real implementation.

use downcast::*;
use std::{
    any,
    fmt,
};

/// Bound for every erased argument and stubbed return value.
///
/// Blanket-implemented, so any `'static` value that is `Send + Sync` and
/// `Debug` qualifies.  `Sync` because recorded arguments live in the
/// session-wide ledger, shared across calling threads; `Debug` because
/// they outlive their concrete types in error reports and ledger
/// listings.
pub trait Value: Any + Send + Sync + fmt::Debug {}
downcast!(dyn Value);

impl<T: any::Any + Send + Sync + fmt::Debug> Value for T {}

/// One erased argument plus the name of the type it was erased from.
pub(crate) struct Arg {
    value: Box<dyn Value>,
    type_name: &'static str,
}

impl Arg {
    pub(crate) fn new<T>(value: T) -> Arg
        where T: any::Any + Send + Sync + fmt::Debug
    {
        Arg {
            value: Box::new(value),
            type_name: any::type_name::<T>(),
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

/// The ordered argument values of one intercepted call.
///
/// Behaviors programmed with
/// [`answers`](crate::ExpectationGuard::answers) receive these and can
/// recover typed views with [`Args::value`].
pub struct Args(Vec<Arg>);

impl Args {
    pub(crate) fn new(args: Vec<Arg>) -> Args {
        Args(args)
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` for nullary calls.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Typed view of the argument at `index`.
    ///
    /// `None` if the index is out of range or the argument is not a `T`.
    pub fn value<T: any::Any>(&self, index: usize) -> Option<&T> {
        self.0.get(index)?.value.downcast_ref::<T>().ok()
    }

    pub(crate) fn erased(&self, index: usize) -> Option<&dyn Value> {
        self.0.get(index).map(|a| &*a.value)
    }

    pub(crate) fn type_name(&self, index: usize) -> &'static str {
        self.0.get(index).map(|a| a.type_name).unwrap_or("<missing>")
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, arg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg:?}")?;
        }
        write!(f, ")")
    }
}

/// What kind of entry point a call came through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// An instance method, dispatched through a [`Mock`](crate::Mock)
    /// handle held by proxy glue.
    Method,
    /// A constructor; the target is the type itself, so these are
    /// registered and matched on a class mock, independently from any
    /// instance expectations.
    Constructor,
    /// An associated function, dispatched through the process-wide
    /// intercept table keyed by declaring type.
    Static,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallKind::Method => "method",
            CallKind::Constructor => "constructor",
            CallKind::Static => "static function",
        };
        f.write_str(s)
    }
}

/// One entry in a [`TypeDescriptor`]'s method table.
///
/// The `params` slice holds type names as written in the mocked trait;
/// they are used for arity validation and error rendering, not for
/// matching (matching downcasts to concrete types at run time).
#[derive(Debug)]
pub struct MethodSig {
    /// Method or function name.
    pub name: &'static str,
    /// Parameter type names, one per position.
    pub params: &'static [&'static str],
    /// Return type name, `"()"` for unit.
    pub ret: &'static str,
    /// Which entry point this signature belongs to.
    pub kind: CallKind,
}

impl MethodSig {
    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}

/// Static method table for one mocked type.
///
/// This is the signature registry consulted in place of runtime
/// reflection: expectation registration resolves method names against it
/// and fails fast on unknown names or arity mismatches.  The
/// [`double!`](crate::double) macro emits one per mocked trait; glue
/// written by hand declares its own.
#[derive(Debug)]
pub struct TypeDescriptor {
    /// Name of the mocked trait or type.
    pub type_name: &'static str,
    /// Every interceptable signature of the type.
    pub methods: &'static [MethodSig],
}

impl TypeDescriptor {
    /// Look up a signature by name.
    pub fn method(&self, name: &str) -> Option<&MethodSig> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub(crate) fn known_names(&self) -> String {
        let names: Vec<&str> = self.methods.iter().map(|m| m.name).collect();
        names.join(", ")
    }
}

/// A raw intercepted call, built by proxy glue.
///
/// ```
/// use understudy::Call;
///
/// let call = Call::method("resize").arg(640u32).arg(480u32);
/// ```
pub struct Call {
    pub(crate) name: &'static str,
    pub(crate) kind: CallKind,
    pub(crate) args: Vec<Arg>,
}

impl Call {
    /// An instance-method call.
    pub fn method(name: &'static str) -> Call {
        Call { name, kind: CallKind::Method, args: Vec::new() }
    }

    /// A constructor call, for dispatch through a class mock.
    pub fn constructor(name: &'static str) -> Call {
        Call { name, kind: CallKind::Constructor, args: Vec::new() }
    }

    /// An associated-function call, for dispatch through the static
    /// intercept table.
    pub fn static_fn(name: &'static str) -> Call {
        Call { name, kind: CallKind::Static, args: Vec::new() }
    }

    /// Append one argument value.
    pub fn arg<T>(mut self, value: T) -> Call
        where T: any::Any + Send + Sync + fmt::Debug
    {
        self.args.push(Arg::new(value));
        self
    }
}

/// Render a call the way it appears in errors and ledger listings.
///
/// `owner` is the mock's display name for instance methods and the
/// declaring type's name for constructors and statics.
pub(crate) fn render_call(
    kind: CallKind,
    owner: &str,
    method: &str,
    args: &Args,
) -> String {
    match kind {
        CallKind::Method => format!("{owner}.{method}{args:?}"),
        CallKind::Constructor => format!("new {owner}{args:?}"),
        CallKind::Static => format!("{owner}::{method}{args:?}"),
    }
}

/// An erased return value produced by a behavior, a fallback, or a real
/// implementation.
///
/// Carries a debug rendering captured at construction time so the ledger
/// can record the outcome after the value itself has moved to the caller.
pub struct ReturnValue {
    value: Box<dyn any::Any + Send>,
    repr: String,
    type_name: &'static str,
}

impl ReturnValue {
    /// Erase a value, capturing its `Debug` rendering.
    pub fn of<T: any::Any + Send + fmt::Debug>(value: T) -> ReturnValue {
        let repr = format!("{value:?}");
        ReturnValue {
            value: Box::new(value),
            repr,
            type_name: any::type_name::<T>(),
        }
    }

    /// Erase a value that has no useful `Debug` rendering.
    pub fn opaque<T: any::Any + Send>(value: T) -> ReturnValue {
        ReturnValue {
            value: Box::new(value),
            repr: format!("<{}>", any::type_name::<T>()),
            type_name: any::type_name::<T>(),
        }
    }

    /// The unit value.
    pub fn unit() -> ReturnValue {
        ReturnValue::of(())
    }

    pub(crate) fn repr(&self) -> &str {
        &self.repr
    }

    /// Recover the concrete value.  `method` names the call site for the
    /// mismatch report.
    ///
    /// Panics if the behavior that produced this value returned a
    /// different type than the mocked method does, which is the erased
    /// analogue of a stub with the wrong return type.
    pub fn take<T: any::Any>(self, method: &str) -> T {
        match self.value.downcast::<T>() {
            Ok(v) => *v,
            Err(_) => panic!(
                "behavior for `{}` produced a value of type {} ({}), but \
                 the caller expects {}",
                method,
                self.type_name,
                self.repr,
                any::type_name::<T>(),
            ),
        }
    }
}

impl fmt::Debug for ReturnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

/// Thunk producing the default value for a method's concrete return type.
///
/// Built by proxy glue, which is the one place the concrete type is still
/// known.  Auto-stubbing and the implicit behavior of expectations with
/// no programmed behavior both draw from it.
pub struct Fallback(Option<Box<dyn Fn() -> ReturnValue + Send>>);

impl Fallback {
    /// Default-value thunk for return type `T`: zero for integers, false
    /// for booleans, empty for collections, `None` for options.
    pub fn of_type<T>() -> Fallback
        where T: Default + Send + fmt::Debug + 'static
    {
        Fallback(Some(Box::new(|| ReturnValue::of(T::default()))))
    }

    /// A custom thunk, for return types without `Default` or `Debug`.
    pub fn from_fn<F>(f: F) -> Fallback
        where F: Fn() -> ReturnValue + Send + 'static
    {
        Fallback(Some(Box::new(f)))
    }

    /// No default is available; auto-stubbing this call will fail.
    pub fn none() -> Fallback {
        Fallback(None)
    }

    pub(crate) fn produce(&self) -> Option<ReturnValue> {
        self.0.as_ref().map(|f| f())
    }
}

/// Thunk invoking the real implementation behind a spy, built fresh by
/// glue for each call.  Borrows are fine; it never outlives the dispatch.
pub type RealThunk<'a> = Box<dyn FnOnce() -> ReturnValue + 'a>;
