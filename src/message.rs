//! The wire format of the actor model: an opaque, ordered triple.

use serde_json::Value;

/// A message sent from one fiber to another.
///
/// `sender` and `kind` are plain strings, as `spec.md` §3 requires (`type`
/// is spelled `kind` here since `type` is a reserved word). `content` is a
/// [`serde_json::Value`] standing in for "opaque strings/values; no typed
/// payload is required" — see `SPEC_FULL.md` §3 for why `serde_json::Value`
/// was chosen as the concrete representation.
///
/// Messages are values: they are cloned on send and carry no sharing
/// semantics between sender and receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub sender: String,
    pub kind: String,
    pub content: Value,
}

impl Message {
    pub fn new(sender: impl Into<String>, kind: impl Into<String>, content: Value) -> Self {
        Self {
            sender: sender.into(),
            kind: kind.into(),
            content,
        }
    }
}
