//! The capability handed to a running fiber body: `spec.md` §6's "Fiber
//! Context (capabilities available inside a running fiber)".

use std::rc::Rc;

use serde_json::Value;

use crate::bundle::core::BundleCore;
use crate::callback::Callback;
use crate::mailbox::ReceiveOptions;
use crate::message::Message;
use crate::transport::{self, CoordinatorCommand};

use super::body::{FiberBody, FiberBodyBox};
use super::suspend::{Never, Suspend};

/// Borrowed by a fiber's future for the duration of a single poll; never
/// stored across an `.await` point by anything outside this module, since
/// the `Rc<BundleCore>` it wraps is bundle-thread-confined, never `Send`.
pub struct FiberContext {
    name: String,
    bundle: Rc<BundleCore>,
}

impl FiberContext {
    pub(crate) fn new(name: String, bundle: Rc<BundleCore>) -> Self {
        Self { name, bundle }
    }

    /// `spec.md` §6: "returns this fiber's own name".
    pub fn current_fiber(&self) -> &str {
        &self.name
    }

    /// `spec.md` §6: "generates a fresh globally-unique name, without
    /// spawning anything — the caller decides whether/when to use it". PIDs
    /// are minted `{bundle_id}_{counter}`, scoped to the bundle that calls
    /// this, so collisions across bundles are impossible without
    /// coordination (`SPEC_FULL.md` §4.6 open question #3).
    pub fn new_pid(&self) -> String {
        self.bundle.next_pid()
    }

    /// `spec.md` §6: "send(receiver, message_type, content)… fire-and-forget,
    /// asynchronous, never blocks the sender". Tries the local fast path
    /// first (this bundle owns `receiver`); falls back to asking the
    /// coordinator to relay it, since this bundle has no global name map.
    pub fn send(&self, receiver: &str, kind: &str, content: Value) {
        if self.bundle.contains_fiber(receiver) {
            let msg = Message::new(self.name.clone(), kind.to_owned(), content);
            self.bundle.deliver_local(receiver, msg);
            return;
        }
        self.bundle.relay(&self.name, receiver, kind, content);
    }

    /// `spec.md` §6: "receive_once(filter) -> suspends … until at least one
    /// matching message is in the mailbox, then returns it (and, if
    /// batching is enabled, any other currently-queued matches)".
    pub async fn receive_once(&self, opts: ReceiveOptions) -> Vec<Message> {
        let batch = self.pop_or_wait(&opts).await;
        if !self.bundle.mailbox_has_any(&self.name) {
            self.bundle.remove_from_ready(&self.name);
        }
        batch
    }

    /// `spec.md` §6: "receive_forever(filter, handler) -> loops: wait for a
    /// match, invoke `handler` with it, repeat. Never returns under normal
    /// operation."
    pub async fn receive_forever(
        &self,
        opts: ReceiveOptions,
        mut handler: impl FnMut(Message),
    ) -> std::convert::Infallible {
        loop {
            let batch = self.pop_or_wait(&opts).await;
            for msg in batch {
                handler(msg);
            }
            self.yield_alive().await;
        }
    }

    /// `spec.md` §6: "yield_alive() -> cooperatively yields control back to
    /// the scheduler without removing itself from `ready` — the fiber will
    /// be polled again on the next scheduler pass".
    pub async fn yield_alive(&self) {
        self.bundle.mark_ready(&self.name);
        Suspend::new().await;
    }

    /// `spec.md` §6: "wait_forever() -> suspends the calling fiber
    /// permanently; it is removed from `ready` and never re-added unless a
    /// message arrives (which re-adds it through the normal send path)".
    pub async fn wait_forever(&self) -> std::convert::Infallible {
        self.bundle.mark_waiting(&self.name);
        Never.await
    }

    /// `spec.md` §6: "spawn_fiber(name, body, args) -> asks the coordinator
    /// to place a new fiber in whichever bundle is next in round-robin
    /// order".
    pub fn spawn_fiber(&self, name: impl Into<String>, body: impl FiberBody, args: Value) {
        let body: FiberBodyBox = Box::new(body);
        transport::post_to_coordinator(
            &self.bundle.coordinator_tx,
            CoordinatorCommand::SpawnFiber {
                name: name.into(),
                body,
                args,
            },
        );
    }

    /// `spec.md` §6: "spawn_fiber_in_specific_bundle(name, body, bundle_id,
    /// args) -> same, but pins the new fiber to `bundle_id`".
    pub fn spawn_fiber_in_specific_bundle(
        &self,
        name: impl Into<String>,
        body: impl FiberBody,
        bundle_id: u32,
        args: Value,
    ) {
        let body: FiberBodyBox = Box::new(body);
        transport::post_to_coordinator(
            &self.bundle.coordinator_tx,
            CoordinatorCommand::SpawnFiberInSpecificBundle {
                name: name.into(),
                body,
                bundle_id,
                args,
            },
        );
    }

    /// `spec.md` §4.4/§9: "installs a host-thread function that, when
    /// invoked, posts a message `(sender=name, type="callback", content=args)`
    /// to `receiver`." The returned [`Callback`] is `Send + Clone` and may be
    /// handed to any host-thread event source (a network reactor, a GUI
    /// toolkit's event loop, …); it does not borrow this context and
    /// outlives the poll that created it.
    pub fn create_callback(&self, name: impl Into<String>, receiver: impl Into<String>) -> Callback {
        Callback::new(
            self.bundle.self_tx.clone(),
            self.bundle.bundle_id,
            name,
            receiver,
        )
    }

    async fn pop_or_wait(&self, opts: &ReceiveOptions) -> Vec<Message> {
        loop {
            let popped = self.bundle.pop_matching(&self.name, opts);
            if !popped.is_empty() {
                return popped;
            }
            self.bundle.mark_waiting(&self.name);
            Suspend::new().await;
            self.bundle.mark_running(&self.name);
        }
    }
}
