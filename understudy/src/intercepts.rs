// vim: tw=80
//! Process-wide intercept table for constructors and associated
//! functions.
//!
//! Instance methods dispatch through a [`Mock`](crate::Mock) handle the
//! glue owns, but statics have no receiver to hang a handle on.  Class
//! mocks therefore register their core here, keyed by the intercepted
//! type, and glue for static entry points routes calls through
//! [`dispatch_static`].  Entries are `Weak`, so a dropped session tears
//! its interceptions down implicitly and later calls fail as zombies
//! instead of leaking state between tests.

use std::{
    any::{self, TypeId},
    collections::HashMap,
    sync::{atomic::Ordering, Arc, Mutex, OnceLock, Weak},
};

use tracing::debug;

use crate::{
    call::{render_call, Args, Call, Fallback, ReturnValue},
    dispatch::MockCore,
    error::Error,
};

fn table() -> &'static Mutex<HashMap<TypeId, Weak<MockCore>>> {
    static TABLE: OnceLock<Mutex<HashMap<TypeId, Weak<MockCore>>>> =
        OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Install `core` as the live interception for type `K`.
///
/// A dead or deactivated entry is silently replaced.  Two live class
/// mocks for the same type cannot coexist; panics never hold the table
/// lock, so a failing test does not poison it for the rest of the
/// process.
pub(crate) fn register<K: 'static>(core: &Arc<MockCore>) {
    let key = TypeId::of::<K>();
    let existing = {
        let table = table().lock().unwrap();
        table.get(&key).and_then(Weak::upgrade)
    };
    if let Some(existing) = existing {
        // Liveness means an active mock in a session that still exists;
        // a surviving handle to a dead session's mock is not a conflict.
        if existing.active.load(Ordering::Relaxed)
            && existing.session.upgrade().is_some()
        {
            let err = Error::MalformedExpectation {
                target: core.name.clone(),
                reason: format!(
                    "{} is already intercepted by {}",
                    core.descriptor.type_name, existing.name,
                ),
            };
            panic!("{err}")
        }
    }
    table().lock().unwrap().insert(key, Arc::downgrade(core));
    debug!(
        target: "understudy::intercepts",
        mock = %core.name,
        r#type = core.descriptor.type_name,
        "static interception installed"
    );
}

/// Route a constructor or associated-function call for type `K` through
/// its registered class mock.
///
/// If no class mock for `K` is live, the call is a zombie: glue for the
/// static entry point is still reachable, but its interception was torn
/// down or never registered.
pub fn dispatch_static<K: 'static>(
    call: Call,
    fallback: Fallback,
) -> ReturnValue {
    let core = {
        let table = table().lock().unwrap();
        table.get(&TypeId::of::<K>()).and_then(Weak::upgrade)
    };
    match core {
        Some(core) => core.dispatch(call, fallback, None),
        None => {
            let type_name = short_type_name::<K>();
            let rendered = render_call(
                call.kind,
                type_name,
                call.name,
                &Args::new(call.args),
            );
            let err = Error::ZombieMethod {
                target: type_name.to_owned(),
                call: rendered,
            };
            panic!("{err}")
        },
    }
}

/// Last path segment of `K`'s type name, matching how descriptors name
/// their types.
fn short_type_name<K>() -> &'static str {
    let full = any::type_name::<K>();
    full.rsplit("::").next().unwrap_or(full)
}
