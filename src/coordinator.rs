//! The bundle space: the dedicated coordinator thread that owns the global
//! `fiber_name → bundle_id` map and relays cross-bundle sends. `spec.md`
//! §4.5.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::JoinHandle;

use serde_json::Value;

use crate::bundle::Bundle;
use crate::error::Error;
use crate::fiber::body::FiberBodyBox;
use crate::transport::{self, BundleCommand, CoordinatorCommand, InitFn};

struct BundleHandle {
    tx: Sender<BundleCommand>,
    join: JoinHandle<()>,
}

/// Runs entirely on its own OS thread, never shared: the map fields below
/// are plain (non-`Rc`, non-`Mutex`) because nothing outside this thread
/// ever touches them directly — every other thread only ever reaches the
/// coordinator by posting a [`CoordinatorCommand`].
pub(crate) struct BundleSpace {
    cmd_rx: Receiver<CoordinatorCommand>,
    self_tx: Sender<CoordinatorCommand>,
    bundles: HashMap<u32, BundleHandle>,
    fiber_location: HashMap<String, u32>,
    next_bundle_id: u32,
    round_robin_cursor: u32,
    init: Option<InitFn>,
}

impl BundleSpace {
    pub fn new(
        cmd_rx: Receiver<CoordinatorCommand>,
        self_tx: Sender<CoordinatorCommand>,
        init: Option<InitFn>,
    ) -> Self {
        Self {
            cmd_rx,
            self_tx,
            bundles: HashMap::new(),
            fiber_location: HashMap::new(),
            next_bundle_id: 0,
            round_robin_cursor: 0,
            init,
        }
    }

    /// The coordinator's event loop: purely reactive, so a blocking
    /// `recv()` is all the "no CPU spent idle" discipline it needs —
    /// unlike a bundle, it never has fibers of its own to poll.
    pub fn run(mut self) {
        loop {
            match self.cmd_rx.recv() {
                Ok(cmd) => {
                    if self.handle_command(cmd) {
                        return;
                    }
                }
                Err(_) => return,
            }
        }
    }

    fn handle_command(&mut self, cmd: CoordinatorCommand) -> bool {
        match cmd {
            CoordinatorCommand::SpawnBundles { count } => {
                for _ in 0..count {
                    self.spawn_bundle();
                }
                false
            }
            CoordinatorCommand::SpawnFiber { name, body, args } => {
                self.spawn_fiber_round_robin(name, body, args);
                false
            }
            CoordinatorCommand::SpawnFiberInSpecificBundle {
                name,
                body,
                bundle_id,
                args,
            } => {
                self.spawn_fiber_pinned(name, body, bundle_id, args);
                false
            }
            CoordinatorCommand::RelayMessage {
                sender,
                receiver,
                kind,
                content,
            } => {
                self.relay(sender, receiver, kind, content);
                false
            }
            CoordinatorCommand::Inflate { fallback } => {
                self.inflate(fallback);
                false
            }
            CoordinatorCommand::FiberExited { name } => {
                self.fiber_location.remove(&name);
                false
            }
            CoordinatorCommand::Shutdown => {
                self.shutdown_all_bundles();
                true
            }
        }
    }

    fn spawn_bundle(&mut self) -> u32 {
        let id = self.next_bundle_id;
        self.next_bundle_id += 1;
        let (bundle, tx) = Bundle::new(id, self.self_tx.clone());
        let init = self.init.clone();
        let join = std::thread::Builder::new()
            .name(format!("bundle-{id}"))
            .spawn(move || {
                if let Err(err) = bundle.run_scheduler(init) {
                    log::error!("bundle {id} scheduler exited with an error: {err}");
                }
            })
            .expect("failed to spawn bundle thread");
        self.bundles.insert(id, BundleHandle { tx, join });
        log::debug!("spawned bundle {id}");
        id
    }

    /// `spec.md` §4.5: "ensures the total bundle count matches available
    /// parallelism, falling back to `fallback` if detection fails."
    /// Never shrinks an already-inflated space — only ever adds bundles.
    fn inflate(&mut self, fallback: u32) {
        let target = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or_else(|err| {
                log::warn!("{}", Error::ParallelismDetection(err));
                fallback
            });
        let current = self.bundles.len() as u32;
        if target > current {
            for _ in current..target {
                self.spawn_bundle();
            }
        }
    }

    /// `spec.md` §4.5: "places a new fiber in whichever bundle is next in
    /// round-robin order." The cursor advances unconditionally even past
    /// bundle ids that no longer exist (none are ever removed), so no extra
    /// bookkeeping is needed to keep it in range beyond a modulo.
    fn spawn_fiber_round_robin(&mut self, name: String, body: FiberBodyBox, args: Value) {
        if self.bundles.is_empty() {
            log::warn!("spawn_fiber({name}) requested with no bundles available");
            return;
        }
        let ids: Vec<u32> = {
            let mut ids: Vec<u32> = self.bundles.keys().copied().collect();
            ids.sort_unstable();
            ids
        };
        let bundle_id = ids[(self.round_robin_cursor as usize) % ids.len()];
        self.round_robin_cursor = self.round_robin_cursor.wrapping_add(1);
        self.place_fiber(name, body, bundle_id, args);
    }

    fn spawn_fiber_pinned(&mut self, name: String, body: FiberBodyBox, bundle_id: u32, args: Value) {
        if !self.bundles.contains_key(&bundle_id) {
            log::warn!("{}", Error::UnknownBundle { bundle_id });
            return;
        }
        self.place_fiber(name, body, bundle_id, args);
    }

    fn place_fiber(&mut self, name: String, body: FiberBodyBox, bundle_id: u32, args: Value) {
        self.fiber_location.insert(name.clone(), bundle_id);
        let handle = self
            .bundles
            .get(&bundle_id)
            .expect("bundle_id was just validated as present");
        transport::post_to_bundle(
            &handle.tx,
            BundleCommand::SpawnLocalFiber { name, body, args },
            bundle_id,
        );
    }

    /// `spec.md` §4.4/§4.5: "if `receiver` is not local, asks the
    /// coordinator to relay it to the bundle that owns `receiver`, if any."
    /// Unknown receivers are a silent drop with a diagnostic (Open Question
    /// #3, decided in DESIGN.md).
    fn relay(&mut self, sender: String, receiver: String, kind: String, content: Value) {
        let Some(&bundle_id) = self.fiber_location.get(&receiver) else {
            log::debug!("dropping relay to unknown fiber {receiver}");
            return;
        };
        let Some(handle) = self.bundles.get(&bundle_id) else {
            log::debug!("dropping relay to {receiver}: its bundle {bundle_id} is gone");
            return;
        };
        transport::post_to_bundle(
            &handle.tx,
            BundleCommand::ReceiveRelayed {
                sender,
                receiver,
                kind,
                content,
            },
            bundle_id,
        );
    }

    fn shutdown_all_bundles(&mut self) {
        for (id, handle) in self.bundles.drain() {
            transport::post_to_bundle(&handle.tx, BundleCommand::Shutdown, id);
            if handle.join.join().is_err() {
                log::error!("bundle {id} thread panicked during shutdown");
            }
        }
    }
}
