//! Bundle-local shared state, confined to a single OS thread.
//!
//! Everything in here is `Rc`/`RefCell`/`Cell` — never `Mutex` — because
//! `spec.md` §5 is explicit that "no locks are required if the
//! thread-confinement discipline is respected": a `BundleCore` is only
//! ever reachable from the one OS thread that owns it, either directly (the
//! scheduler loop) or through a `FiberContext` handed to a fiber's future
//! while that future is being polled on this same thread.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::mpsc::Sender;

use serde_json::Value;

use crate::fiber::body::LocalBoxFuture;
use crate::fiber::state::FiberState;
use crate::mailbox::{Mailbox, ReceiveOptions};
use crate::message::Message;
use crate::transport::{self, BundleCommand, CoordinatorCommand};

use super::ready_set::ReadySet;

pub(crate) struct FiberSlot {
    pub mailbox: RefCell<Mailbox>,
    pub state: Cell<FiberState>,
    pub future: RefCell<Option<LocalBoxFuture>>,
}

impl FiberSlot {
    fn new(future: LocalBoxFuture) -> Self {
        Self {
            mailbox: RefCell::new(Mailbox::new()),
            state: Cell::new(FiberState::Running),
            future: RefCell::new(Some(future)),
        }
    }
}

pub(crate) struct BundleCore {
    pub bundle_id: u32,
    fibers: RefCell<HashMap<String, FiberSlot>>,
    ready: RefCell<ReadySet>,
    next_local_pid: Cell<u64>,
    pub coordinator_tx: Sender<CoordinatorCommand>,
    pub self_tx: Sender<BundleCommand>,
}

impl BundleCore {
    pub fn new(
        bundle_id: u32,
        coordinator_tx: Sender<CoordinatorCommand>,
        self_tx: Sender<BundleCommand>,
    ) -> Rc<Self> {
        Rc::new(Self {
            bundle_id,
            fibers: RefCell::new(HashMap::new()),
            ready: RefCell::new(ReadySet::new()),
            next_local_pid: Cell::new(0),
            coordinator_tx,
            self_tx,
        })
    }

    pub fn contains_fiber(&self, name: &str) -> bool {
        self.fibers.borrow().contains_key(name)
    }

    pub fn fiber_count(&self) -> usize {
        self.fibers.borrow().len()
    }

    pub fn fiber_state(&self, name: &str) -> Option<FiberState> {
        self.fibers.borrow().get(name).map(|s| s.state.get())
    }

    /// Registers a freshly created fiber's future under `name`. Name
    /// collisions are last-writer-wins, per `spec.md` Open Question #1.
    pub fn register(&self, name: String, future: LocalBoxFuture) {
        self.fibers.borrow_mut().insert(name, FiberSlot::new(future));
    }

    pub fn next_pid(&self) -> String {
        let n = self.next_local_pid.get();
        self.next_local_pid.set(n + 1);
        format!("{}_{}", self.bundle_id, n)
    }

    /// Appends `msg` to `receiver`'s mailbox and marks it ready, per
    /// `spec.md` §4.4 ("If `receiver` is local: append to its mailbox,
    /// insert into `ready`"). Returns `false` if there is no such local
    /// fiber (caller decides whether that's an error, per context).
    pub fn deliver_local(&self, receiver: &str, msg: Message) -> bool {
        let fibers = self.fibers.borrow();
        let Some(slot) = fibers.get(receiver) else {
            return false;
        };
        slot.mailbox.borrow_mut().append(msg);
        drop(fibers);
        self.mark_ready(receiver);
        true
    }

    pub fn mark_ready(&self, name: &str) {
        self.ready.borrow_mut().insert(name);
    }

    pub fn remove_from_ready(&self, name: &str) {
        self.ready.borrow_mut().remove(name);
    }

    pub fn mark_waiting(&self, name: &str) {
        if let Some(slot) = self.fibers.borrow().get(name) {
            slot.state.set(FiberState::Waiting);
        }
        self.remove_from_ready(name);
    }

    pub fn mark_running(&self, name: &str) {
        if let Some(slot) = self.fibers.borrow().get(name) {
            slot.state.set(FiberState::Running);
        }
    }

    pub fn mailbox_has_any(&self, name: &str) -> bool {
        self.fibers
            .borrow()
            .get(name)
            .map(|s| s.mailbox.borrow().has_any())
            .unwrap_or(false)
    }

    pub fn pop_matching(&self, name: &str, opts: &ReceiveOptions) -> Vec<Message> {
        self.fibers
            .borrow()
            .get(name)
            .map(|s| s.mailbox.borrow_mut().pop_matching(opts))
            .unwrap_or_default()
    }

    /// Relays a send to a fiber this bundle does not own: post
    /// `relay_message` to the coordinator, asynchronously, per
    /// `spec.md` §4.4.
    pub fn relay(&self, sender: &str, receiver: &str, kind: &str, content: Value) {
        transport::post_to_coordinator(
            &self.coordinator_tx,
            CoordinatorCommand::RelayMessage {
                sender: sender.to_owned(),
                receiver: receiver.to_owned(),
                kind: kind.to_owned(),
                content,
            },
        );
    }

    /// Removes a fiber that has finished (its future resolved or
    /// panicked) and tells the coordinator to drop its name→bundle entry
    /// too. See DESIGN.md, open question #2.
    pub fn retire(&self, name: &str) {
        self.fibers.borrow_mut().remove(name);
        self.remove_from_ready(name);
        transport::post_to_coordinator(
            &self.coordinator_tx,
            CoordinatorCommand::FiberExited {
                name: name.to_owned(),
            },
        );
    }

    pub fn ready_is_empty(&self) -> bool {
        self.ready.borrow().is_empty()
    }

    pub fn ready_snapshot(&self) -> Vec<String> {
        self.ready.borrow().snapshot()
    }

    pub fn take_future(&self, name: &str) -> Option<LocalBoxFuture> {
        self.fibers
            .borrow()
            .get(name)
            .and_then(|s| s.future.borrow_mut().take())
    }

    pub fn put_future_back(&self, name: &str, future: LocalBoxFuture) {
        if let Some(slot) = self.fibers.borrow().get(name) {
            *slot.future.borrow_mut() = Some(future);
        }
    }
}
