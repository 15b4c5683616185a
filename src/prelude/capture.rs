//! Closure-capture helpers, `SPEC_FULL.md` §10.
//!
//! Every fiber body crosses a thread boundary on spawn (the coordinator
//! may place it on any bundle), so an ordinary closure capturing `Rc`/
//! `RefCell` state — the idiom that works for, say, a single-threaded
//! callback registry — cannot be a fiber body: it isn't `Send`, and even
//! if it were, the state it closes over would now be touched from a
//! thread other than the one that created it. [`Captured`] is the
//! sanctioned way to smuggle a bundle of `Send` data into the `args:
//! Value` a body function receives instead, mirroring the original's
//! closure-capture convention for passing state into a spawned fiber
//! without true shared memory.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Wraps a `Serialize + DeserializeOwned` payload so it can be handed to
/// `Universe::spawn_fiber`/`FiberContext::spawn_fiber` as `args` and
/// recovered inside the body without hand-rolling the
/// `serde_json::to_value`/`from_value` round trip at every call site.
pub struct Captured<A>(pub A);

impl<A: Serialize> Captured<A> {
    /// Converts this payload into the `Value` a spawn call expects.
    pub fn into_args(self) -> Value {
        serde_json::to_value(self.0).expect("Captured payload must serialize to JSON")
    }
}

impl<A: DeserializeOwned> Captured<A> {
    /// Recovers a typed payload from the `args: Value` a fiber body
    /// receives. Panics if `args` does not match `A`'s shape — a
    /// programmer error at the call site, not a runtime condition a fiber
    /// body should need to handle.
    pub fn from_args(args: Value) -> A {
        serde_json::from_value(args).expect("fiber args did not match the captured payload's shape")
    }
}

/// Builds the `args: Value` for a spawn call from any `Serialize` value,
/// without naming [`Captured`] at the call site:
/// `universe.spawn_fiber("x", body, capture!(MyState { n: 3 }))`.
#[macro_export]
macro_rules! capture {
    ($val:expr) => {
        $crate::prelude::capture::Captured($val).into_args()
    };
}
