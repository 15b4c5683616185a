//! The sanctioned bridge from host code running outside any fiber into the
//! fiber world. `spec.md` §4.4/§9.
//!
//! Nothing else in the public API lets non-fiber code touch a mailbox:
//! `FiberContext::send` only exists on a `FiberContext`, and a
//! `FiberContext` only ever exists for the duration of a scheduler poll
//! (`spec.md` §7, "send/receive outside a fiber context"). A callback is
//! how, say, a network event loop or a GUI thread feeds a result back in,
//! without pretending to be a fiber itself.

use std::sync::mpsc::Sender;

use serde_json::Value;

use crate::transport::{self, BundleCommand};

/// A handle host code can call from any thread to deliver one message into
/// `receiver`'s mailbox, as if it had been sent by `sender`. Travels the
/// same `BundleCommand::CallbackFired` path a relay would, so the fiber on
/// the receiving end cannot distinguish a callback from an ordinary send.
#[derive(Clone)]
pub struct Callback {
    bundle_tx: Sender<BundleCommand>,
    bundle_id: u32,
    sender: String,
    receiver: String,
}

impl Callback {
    pub(crate) fn new(
        bundle_tx: Sender<BundleCommand>,
        bundle_id: u32,
        sender: impl Into<String>,
        receiver: impl Into<String>,
    ) -> Self {
        Self {
            bundle_tx,
            bundle_id,
            sender: sender.into(),
            receiver: receiver.into(),
        }
    }

    /// Fire-and-forget, like every other send in this crate: a callback
    /// fired after its bundle has shut down is silently dropped (logged at
    /// `debug`), not an error for the caller.
    pub fn fire(&self, content: Value) {
        transport::post_to_bundle(
            &self.bundle_tx,
            BundleCommand::CallbackFired {
                sender: self.sender.clone(),
                receiver: self.receiver.clone(),
                content,
            },
            self.bundle_id,
        );
    }
}
