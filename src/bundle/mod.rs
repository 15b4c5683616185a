//! A bundle: one OS worker thread, its fibers, and its scheduler.
//!
//! `spec.md` §4.3's "snapshot-then-run" algorithm, realized: each pass takes
//! a snapshot of the current `ready` set and polls each name in it exactly
//! once. A fiber that becomes ready *during* that pass (because another
//! fiber in the same pass sent it a message) is not re-visited until the
//! next pass — this is what keeps the scheduler cooperative rather than
//! re-entrant: no fiber's future is ever polled from inside another fiber's
//! poll call.

pub(crate) mod core;
pub(crate) mod ready_set;

use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::task::Context;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::fiber::body::FiberBodyBox;
use crate::fiber::context::FiberContext;
use crate::fiber::state::FiberState;
use crate::message::Message;
use crate::transport::{BundleCommand, CoordinatorCommand, InitFn};

use self::core::BundleCore;

use std::cell::Cell;
use std::future::Future;

pub(crate) struct Bundle {
    core: Rc<BundleCore>,
    cmd_rx: Receiver<BundleCommand>,
    started: Cell<bool>,
}

impl Bundle {
    /// Builds a bundle and returns it alongside the sender the coordinator
    /// keeps to post [`BundleCommand`]s to it.
    pub fn new(bundle_id: u32, coordinator_tx: Sender<CoordinatorCommand>) -> (Self, Sender<BundleCommand>) {
        let (tx, rx) = mpsc::channel();
        let core = BundleCore::new(bundle_id, coordinator_tx, tx.clone());
        (
            Self {
                core,
                cmd_rx: rx,
                started: Cell::new(false),
            },
            tx,
        )
    }

    pub fn bundle_id(&self) -> u32 {
        self.core.bundle_id
    }

    pub fn fiber_count(&self) -> usize {
        self.core.fiber_count()
    }

    pub fn fiber_state(&self, name: &str) -> Option<FiberState> {
        self.core.fiber_state(name)
    }

    /// Runs this bundle's event loop forever, until a [`BundleCommand::Shutdown`]
    /// arrives or the coordinator drops its sender. `spec.md` §4.3: "strictly
    /// non-reentrant — calling this a second time on the same bundle is an
    /// error."
    pub fn run_scheduler(&self, init: Option<InitFn>) -> Result<()> {
        if self.started.replace(true) {
            return Err(Error::SchedulerAlreadyRunning {
                bundle_id: self.core.bundle_id,
            });
        }
        if let Some(init) = init {
            init();
        }
        loop {
            if self.drain_commands_nonblocking() {
                return Ok(());
            }
            if !self.core.ready_is_empty() {
                self.run_one_round();
                continue;
            }
            // Nothing ready and nothing pending: park on the channel. This
            // is the `spec.md` §4.3 "no CPU spent while idle" requirement —
            // a blocking `recv()` parks the OS thread rather than spinning.
            match self.cmd_rx.recv() {
                Ok(cmd) => {
                    if self.handle_command(cmd) {
                        return Ok(());
                    }
                }
                Err(_) => return Ok(()),
            }
        }
    }

    fn drain_commands_nonblocking(&self) -> bool {
        loop {
            match self.cmd_rx.try_recv() {
                Ok(cmd) => {
                    if self.handle_command(cmd) {
                        return true;
                    }
                }
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => return true,
            }
        }
    }

    fn handle_command(&self, cmd: BundleCommand) -> bool {
        match cmd {
            BundleCommand::SpawnLocalFiber { name, body, args } => {
                self.spawn_fiber_local(name, body, args);
                false
            }
            BundleCommand::ReceiveRelayed {
                sender,
                receiver,
                kind,
                content,
            } => {
                self.deliver(sender, &receiver, kind, content);
                false
            }
            BundleCommand::CallbackFired {
                sender,
                receiver,
                content,
            } => {
                self.deliver(sender, &receiver, "callback".to_owned(), content);
                false
            }
            BundleCommand::Shutdown => true,
        }
    }

    fn deliver(&self, sender: String, receiver: &str, kind: String, content: Value) {
        let msg = Message::new(sender, kind, content);
        if !self.core.deliver_local(receiver, msg) {
            log::debug!("dropping message for unknown local fiber {receiver}");
        }
    }

    /// `spec.md` §4.4: construct the body's future and, per `SPEC_FULL.md`
    /// §4.4's resolution of the "first schedule" open question, poll it
    /// once immediately rather than waiting for the next scheduler pass —
    /// a fiber is never added to `ready` at spawn time, but any prefix work
    /// before its first suspension still runs synchronously here.
    pub fn spawn_fiber_local(&self, name: String, body: FiberBodyBox, args: Value) {
        let ctx = FiberContext::new(name.clone(), Rc::clone(&self.core));
        let future = body.run(ctx, args);
        self.core.register(name.clone(), future);
        self.poll_fiber(&name);
    }

    fn run_one_round(&self) {
        let snapshot = self.core.ready_snapshot();
        for name in snapshot {
            if !self.core.contains_fiber(&name) {
                continue;
            }
            self.core.remove_from_ready(&name);
            self.poll_fiber(&name);
        }
    }

    /// Polls `name`'s future exactly once. A no-op waker is correct here
    /// because nothing a fiber awaits (`Suspend`, `Never`) ever calls
    /// `wake()` — readiness is entirely scheduler-driven, see
    /// `fiber::suspend`.
    ///
    /// The poll is wrapped in [`std::panic::catch_unwind`]: a panicking
    /// fiber body must not take the whole bundle thread down with it
    /// (`spec.md` §7, "fiber body raising an error").
    fn poll_fiber(&self, name: &str) -> bool {
        let Some(mut future) = self.core.take_future(name) else {
            return true;
        };
        let waker = futures::task::noop_waker();
        let mut cx = Context::from_waker(&waker);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            future.as_mut().poll(&mut cx)
        }));
        match result {
            Ok(std::task::Poll::Ready(())) => {
                self.core.retire(name);
                true
            }
            Ok(std::task::Poll::Pending) => {
                self.core.put_future_back(name, future);
                false
            }
            Err(payload) => {
                log::error!("fiber {name} panicked: {}", panic_message(&payload));
                self.core.retire(name);
                true
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant 4 (non-reentrancy): a second `run_scheduler` call on the
    /// same bundle is a no-op error, not a second scheduler loop.
    #[test]
    fn run_scheduler_twice_is_an_error() {
        let (coordinator_tx, _coordinator_rx) = mpsc::channel();
        let (bundle, cmd_tx) = Bundle::new(0, coordinator_tx);
        cmd_tx.send(BundleCommand::Shutdown).unwrap();

        assert!(bundle.run_scheduler(None).is_ok());
        assert!(matches!(
            bundle.run_scheduler(None),
            Err(Error::SchedulerAlreadyRunning { bundle_id: 0 })
        ));
    }

    #[test]
    fn a_fiber_that_panics_does_not_take_the_bundle_down() {
        let (coordinator_tx, _coordinator_rx) = mpsc::channel();
        let (bundle, cmd_tx) = Bundle::new(0, coordinator_tx);

        cmd_tx
            .send(BundleCommand::SpawnLocalFiber {
                name: "panicker".to_owned(),
                body: Box::new(|_ctx: FiberContext, _args: Value| async move {
                    panic!("boom");
                }),
                args: Value::Null,
            })
            .unwrap();
        cmd_tx.send(BundleCommand::Shutdown).unwrap();

        assert!(bundle.run_scheduler(None).is_ok());
        assert_eq!(bundle.fiber_count(), 0);
    }
}
