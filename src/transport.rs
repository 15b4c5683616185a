//! Cross-thread transport: "post asynchronously a typed command to thread
//! T's event loop", `spec.md` §4.7.
//!
//! Grounded on the teacher's `cbus` module (`Endpoint`/`Message`/
//! `MessageHop`/`LCPipe`): a `cbus::Endpoint` is a named consumer that
//! occupies a fiber running `cbus_loop()` forever; here, the analogous
//! consumer is a bundle's (or the coordinator's) dedicated OS thread
//! blocking in `Receiver::recv()`. `std::sync::mpsc` gives us the
//! fire-and-forget post, the FIFO-per-channel ordering `spec.md` §5 needs
//! for sender→receiver delivery, and the park/wake primitive for free —
//! no analogue of `lcpipe_push_now`'s explicit wakeup is needed because a
//! blocking `recv()` already *is* the wake.

use std::sync::mpsc::Sender;

use serde_json::Value;

use crate::fiber::body::FiberBodyBox;
use crate::message::Message;

/// Commands a bundle's dedicated thread processes from its event loop.
///
/// Every variant here corresponds 1:1 to something `spec.md` §4.7 lists as
/// "worker-side": `SpawnLocalFiber` ≈ `spawn_local_fiber`,
/// `ReceiveRelayed` ≈ `receive_relayed_message`. `Shutdown` is the one
/// ambient addition (see `SPEC_FULL.md` §4.4).
pub(crate) enum BundleCommand {
    SpawnLocalFiber {
        name: String,
        body: FiberBodyBox,
        args: Value,
    },
    ReceiveRelayed {
        sender: String,
        receiver: String,
        kind: String,
        content: Value,
    },
    /// A host-thread callback (see `callback::create_callback`) firing a
    /// message into one of this bundle's fibers. Travels the same path as
    /// an ordinary relay so the receiver can't tell the difference.
    CallbackFired {
        sender: String,
        receiver: String,
        content: Value,
    },
    Shutdown,
}

/// Commands the coordinator's dedicated thread processes from its event
/// loop. One-to-one with `spec.md` §4.5's "Provides" list.
pub(crate) enum CoordinatorCommand {
    SpawnBundles {
        count: u32,
    },
    SpawnFiber {
        name: String,
        body: FiberBodyBox,
        args: Value,
    },
    SpawnFiberInSpecificBundle {
        name: String,
        body: FiberBodyBox,
        bundle_id: u32,
        args: Value,
    },
    RelayMessage {
        sender: String,
        receiver: String,
        kind: String,
        content: Value,
    },
    Inflate {
        fallback: u32,
    },
    /// A bundle reporting that one of its fibers' futures resolved (or
    /// panicked), so the coordinator can drop the `fiber_name →
    /// bundle_id` entry. See DESIGN.md, open question #2.
    FiberExited {
        name: String,
    },
    Shutdown,
}

/// A fire-and-forget post: logs and drops the command rather than
/// panicking if the target thread has already shut down, matching the
/// crate's general "never let a relay/administrative failure propagate
/// synchronously" stance (`spec.md` §7).
pub(crate) fn post_to_bundle(tx: &Sender<BundleCommand>, cmd: BundleCommand, bundle_id: u32) {
    if tx.send(cmd).is_err() {
        log::debug!("bundle {bundle_id} is no longer accepting commands");
    }
}

pub(crate) fn post_to_coordinator(tx: &Sender<CoordinatorCommand>, cmd: CoordinatorCommand) {
    if tx.send(cmd).is_err() {
        log::debug!("coordinator is no longer accepting commands");
    }
}

/// The user-supplied "shared code" payload from `spec.md` §4.5/§9: "a
/// user supplies an initialization callback that each worker thread
/// invokes at startup." Evaluated once per bundle, on that bundle's
/// thread, before its scheduler starts.
pub type InitFn = std::sync::Arc<dyn Fn() + Send + Sync>;
