//! Erlang-style fiber concurrency over a pool of OS threads.
//!
//! - [Universe]: the external facade that owns the coordinator thread
//! - [fiber]: the per-fiber state machine, body trait, and in-fiber context
//! - [mailbox]: the per-fiber FIFO mailbox with selective (whitelist/batch) receive
//! - [message]: the `(sender, kind, content)` triple fibers exchange
//! - [error]: the crate-wide error type
//! - [callback]: the sanctioned bridge from host-thread events into a fiber's mailbox
//! - [prelude]: logger/agent fibers, parallel map, and closure-capture helpers — not part
//!   of the core, kept to a lighter standard of rigor (see `SPEC_FULL.md` §10)
//!
//! A fiber is a named, cooperatively-scheduled unit of execution with a
//! private mailbox; fibers never share memory and communicate exclusively
//! by asynchronous message passing. Fibers are grouped into bundles (one
//! per worker thread); all bundles are governed by a coordinator thread
//! that holds the global fiber-name-to-bundle map and relays cross-bundle
//! sends. See `spec.md` / `SPEC_FULL.md` in the repository root for the
//! full design.
//!
//! ```no_run
//! use fiberbundle::{ReceiveOptions, Universe};
//! use serde_json::json;
//!
//! let universe = Universe::without_init();
//! universe.spawn_bundles(2);
//!
//! universe.spawn_fiber("ping", |ctx: fiberbundle::FiberContext, _args| async move {
//!     ctx.send("pong", "greet", json!("hello"));
//!     let _ = ctx.receive_once(ReceiveOptions::new()).await;
//! }, json!(null));
//!
//! universe.spawn_fiber("pong", |ctx: fiberbundle::FiberContext, _args| async move {
//!     let msgs = ctx.receive_once(ReceiveOptions::new()).await;
//!     for msg in msgs {
//!         ctx.send(&msg.sender, "reply", json!("hi back"));
//!     }
//! }, json!(null));
//! ```

pub(crate) mod bundle;
pub mod callback;
pub mod config;
pub(crate) mod coordinator;
pub mod error;
pub mod fiber;
pub mod mailbox;
pub mod message;
pub mod prelude;
pub(crate) mod transport;
mod universe;

pub use callback::Callback;
pub use error::{Error, Result};
pub use fiber::{FiberBody, FiberContext, FiberState};
pub use mailbox::ReceiveOptions;
pub use message::Message;
pub use transport::InitFn;
pub use universe::Universe;
