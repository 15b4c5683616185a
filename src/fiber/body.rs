//! The "polymorphic body" design note from `spec.md` §9, realized.
//!
//! A fiber's body is "best modeled as a capability providing the
//! operations listed in §6, parameterized over `args`… represent it as an
//! object implementing a single `run(context)` method." In idiomatic Rust
//! that object is just an `async fn(FiberContext, Value)`, and the trait
//! below exists only so it can be boxed and sent across the thread
//! boundary to whichever bundle the coordinator assigns it to.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use super::context::FiberContext;

pub(crate) type LocalBoxFuture = Pin<Box<dyn Future<Output = ()>>>;

/// A fiber's entry point. The `'static` bound and `Send` requirement exist
/// because the body is constructed on one thread (wherever `spawn_fiber`
/// was called) and run on another (the bundle the coordinator assigned it
/// to) — see `SPEC_FULL.md` §9 ("shared-code bootstrapping"): bodies are
/// named functions or closures over `Send` data, distributed by value,
/// never closures capturing bundle-local (`Rc`/`RefCell`) state.
pub trait FiberBody: Send + 'static {
    fn run(self: Box<Self>, ctx: FiberContext, args: Value) -> LocalBoxFuture;
}

impl<F, Fut> FiberBody for F
where
    F: FnOnce(FiberContext, Value) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + 'static,
{
    fn run(self: Box<Self>, ctx: FiberContext, args: Value) -> LocalBoxFuture {
        Box::pin((*self)(ctx, args))
    }
}

pub(crate) type FiberBodyBox = Box<dyn FiberBody>;
