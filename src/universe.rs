//! The external facade, `spec.md` §4.6: "opaque owner of the coordinator
//! thread. Each method posts an asynchronous command to the coordinator."
//!
//! `Universe` is the only entry point host code (as opposed to a running
//! fiber) has into the system: it owns the coordinator's dedicated thread
//! and captures the `shared_code`/`InitFn` payload `spec.md` §9 describes,
//! passing it on every bundle spawn so each worker thread runs the same
//! startup hook before its scheduler starts.

use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use serde_json::Value;

use crate::coordinator::BundleSpace;
use crate::fiber::body::FiberBodyBox;
use crate::fiber::FiberBody;
use crate::transport::{self, CoordinatorCommand, InitFn};

/// Owns the coordinator thread. Dropping a `Universe` asks the coordinator
/// to shut down every bundle it spawned and joins the coordinator thread;
/// `spec.md` is silent on shutdown (a Tcl process reclaims everything on
/// exit), but a library exercised by an in-process test suite cannot leak
/// a thread per test (`SPEC_FULL.md` §4.4).
pub struct Universe {
    tx: Sender<CoordinatorCommand>,
    join: Option<JoinHandle<()>>,
}

impl Universe {
    /// `spec.md` §6: "creates the coordinator thread." `init` is the
    /// `SPEC_FULL.md`/§9 replacement for "a string of code to be
    /// interpreted by whatever execution facility the implementation
    /// provides": a callback every worker thread invokes once, before its
    /// scheduler starts, to register whatever process-wide helpers the
    /// caller's fiber bodies expect to find already set up.
    pub fn new(init: Option<InitFn>) -> Self {
        let (tx, rx) = mpsc::channel();
        let self_tx = tx.clone();
        let space = BundleSpace::new(rx, self_tx, init);
        let join = std::thread::Builder::new()
            .name("bundle-space".to_owned())
            .spawn(move || space.run())
            .expect("failed to spawn coordinator thread");
        Self {
            tx,
            join: Some(join),
        }
    }

    /// Convenience constructor for callers with no shared-code payload.
    pub fn without_init() -> Self {
        Self::new(None)
    }

    /// `spec.md` §6: "n worker threads." Spawns exactly `n` bundles,
    /// regardless of how many already exist.
    pub fn spawn_bundles(&self, n: u32) {
        transport::post_to_coordinator(&self.tx, CoordinatorCommand::SpawnBundles { count: n });
    }

    /// `spec.md` §6: "one bundle per CPU or fallback." `fallback` is used
    /// only if [`std::thread::available_parallelism`] fails to detect the
    /// host's core count; CPU-count detection heuristics beyond that call
    /// are explicitly out of scope (`spec.md` §1).
    pub fn inflate(&self, fallback: u32) {
        transport::post_to_coordinator(&self.tx, CoordinatorCommand::Inflate { fallback });
    }

    /// `inflate` with the documented default fallback (`spec.md` §6:
    /// `Universe.inflate(fallback=32)`), for callers happy with that
    /// default instead of naming it at every call site.
    pub fn inflate_default(&self) {
        self.inflate(crate::config::DEFAULT_INFLATE_FALLBACK);
    }

    /// `spec.md` §6: "round-robin placement." Usable from host code, not
    /// just from inside a running fiber (`FiberContext::spawn_fiber` is the
    /// in-fiber equivalent).
    pub fn spawn_fiber(&self, name: impl Into<String>, body: impl FiberBody, args: Value) {
        let body: FiberBodyBox = Box::new(body);
        transport::post_to_coordinator(
            &self.tx,
            CoordinatorCommand::SpawnFiber {
                name: name.into(),
                body,
                args,
            },
        );
    }

    /// `spec.md` §6: "co-location." Host-code equivalent of
    /// `FiberContext::spawn_fiber_in_specific_bundle`.
    pub fn spawn_fiber_in_specific_bundle(
        &self,
        name: impl Into<String>,
        body: impl FiberBody,
        bundle_id: u32,
        args: Value,
    ) {
        let body: FiberBodyBox = Box::new(body);
        transport::post_to_coordinator(
            &self.tx,
            CoordinatorCommand::SpawnFiberInSpecificBundle {
                name: name.into(),
                body,
                bundle_id,
                args,
            },
        );
    }

    /// Best-effort synchronous teardown. Posts `Shutdown` to the
    /// coordinator (which in turn shuts down and joins every bundle thread
    /// it owns) and joins the coordinator thread itself. Safe to call more
    /// than once; the second call is a no-op because the channel is
    /// already closed.
    pub fn shutdown(&mut self) {
        transport::post_to_coordinator(&self.tx, CoordinatorCommand::Shutdown);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                log::error!("coordinator thread panicked during shutdown");
            }
        }
    }
}

impl Drop for Universe {
    fn drop(&mut self) {
        self.shutdown();
    }
}
