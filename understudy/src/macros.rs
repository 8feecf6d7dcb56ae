// vim: tw=80
//! The `double!` glue generator.

/// Generate proxy glue for a trait: a type descriptor plus a struct
/// implementing the trait by routing every call through
/// [`Mock::dispatch`](crate::Mock::dispatch).
///
/// The first form builds a plain double; the `wrapping` form builds a
/// spy double that also holds a real implementation, so partial mocks
/// and [`calls_real`](crate::ExpectationGuard::calls_real) behaviors
/// have something to delegate to.
///
/// The macro handles trait shapes with `&self` receivers, owned
/// arguments satisfying [`Value`](crate::Value) (plus `Clone` for
/// spies), and return types implementing `Default + Send + Debug`.
/// Anything fancier
/// is written by hand against the same public contract: build a
/// [`TypeDescriptor`](crate::TypeDescriptor), erase arguments into a
/// [`Call`](crate::Call), and pass
/// [`Fallback::none`](crate::Fallback::none) for return types without a
/// default.
///
/// ```
/// use understudy::{double, matcher, MockOptions, Session};
///
/// trait Calculator {
///     fn add(&self, a: i64, b: i64) -> i64;
///     fn reset(&self);
/// }
///
/// double! {
///     struct CalculatorDouble: Calculator as CALCULATOR_DESC {
///         fn add(&self, a: i64, b: i64) -> i64;
///         fn reset(&self);
///     }
/// }
///
/// let session = Session::new();
/// let mock = session.mock(&CALCULATOR_DESC, MockOptions::new());
/// session.expect(&mock, "add")
///     .with([matcher::eq(2i64), matcher::eq(3i64)])
///     .returns(5i64);
///
/// let calc = CalculatorDouble::new(mock.clone());
/// assert_eq!(calc.add(2, 3), 5);
/// session.verify(&mock);
/// ```
#[macro_export]
macro_rules! double {
    (
        $vis:vis struct $double:ident: $trait_:ident as $desc:ident {
            $(
                fn $method:ident(&self $(, $arg:ident : $aty:ty)* $(,)?)
                    $(-> $ret:ty)? ;
            )*
        }
    ) => {
        $vis static $desc: $crate::TypeDescriptor =
            $crate::TypeDescriptor {
                type_name: stringify!($trait_),
                methods: &[
                    $(
                        $crate::MethodSig {
                            name: stringify!($method),
                            params: &[ $( stringify!($aty) ),* ],
                            ret: $crate::__ret_name!($($ret)?),
                            kind: $crate::CallKind::Method,
                        },
                    )*
                ],
            };

        $vis struct $double {
            mock: $crate::Mock,
        }

        impl $double {
            $vis fn new(mock: $crate::Mock) -> $double {
                $double { mock }
            }

            $vis fn mock(&self) -> &$crate::Mock {
                &self.mock
            }
        }

        impl $trait_ for $double {
            $(
                fn $method(&self $(, $arg: $aty)*) $(-> $ret)? {
                    self.mock
                        .dispatch(
                            $crate::Call::method(stringify!($method))
                                $( .arg($arg) )*,
                            $crate::Fallback::of_type::<
                                $crate::__ret_ty!($($ret)?),
                            >(),
                            ::std::option::Option::None,
                        )
                        .take(stringify!($method))
                }
            )*
        }
    };

    (
        $vis:vis struct $double:ident: $trait_:ident as $desc:ident
            wrapping $real:ty
        {
            $(
                fn $method:ident(&self $(, $arg:ident : $aty:ty)* $(,)?)
                    $(-> $ret:ty)? ;
            )*
        }
    ) => {
        $vis static $desc: $crate::TypeDescriptor =
            $crate::TypeDescriptor {
                type_name: stringify!($trait_),
                methods: &[
                    $(
                        $crate::MethodSig {
                            name: stringify!($method),
                            params: &[ $( stringify!($aty) ),* ],
                            ret: $crate::__ret_name!($($ret)?),
                            kind: $crate::CallKind::Method,
                        },
                    )*
                ],
            };

        $vis struct $double {
            mock: $crate::Mock,
            real: $real,
        }

        impl $double {
            $vis fn new(mock: $crate::Mock, real: $real) -> $double {
                $double { mock, real }
            }

            $vis fn mock(&self) -> &$crate::Mock {
                &self.mock
            }

            $vis fn real(&self) -> &$real {
                &self.real
            }
        }

        impl $trait_ for $double {
            $(
                fn $method(&self $(, $arg: $aty)*) $(-> $ret)? {
                    let call =
                        $crate::Call::method(stringify!($method))
                            $( .arg(::std::clone::Clone::clone(&$arg)) )*;
                    let real: $crate::RealThunk<'_> =
                        ::std::boxed::Box::new(move || {
                            $crate::ReturnValue::of(
                                self.real.$method($($arg),*)
                            )
                        });
                    self.mock
                        .dispatch(
                            call,
                            $crate::Fallback::of_type::<
                                $crate::__ret_ty!($($ret)?),
                            >(),
                            ::std::option::Option::Some(real),
                        )
                        .take(stringify!($method))
                }
            )*
        }
    };
}

/// Return type of a mocked method, defaulting to unit.
#[doc(hidden)]
#[macro_export]
macro_rules! __ret_ty {
    () => { () };
    ($ret:ty) => { $ret };
}

/// Display name of a mocked method's return type.
#[doc(hidden)]
#[macro_export]
macro_rules! __ret_name {
    () => { "()" };
    ($ret:ty) => { stringify!($ret) };
}
