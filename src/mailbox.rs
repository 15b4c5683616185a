//! A single fiber's ordered, filterable inbox.
//!
//! A `Mailbox` is never shared: only the bundle thread that owns the fiber
//! it belongs to ever touches it (see `spec.md` §5, "Shared resources").
//! There is accordingly no internal locking here; callers that need
//! interior mutability across an `Rc` wrap a `Mailbox` in a `RefCell`
//! themselves (see `fiber::FiberSlot`).

use std::collections::VecDeque;

use crate::config::DEFAULT_RECEIVE_BATCH;
use crate::message::Message;

/// Selects which messages a `pop_matching` call is allowed to consume.
///
/// An absent whitelist means "accept all", per `spec.md` §4.1.
#[derive(Debug, Clone)]
pub struct ReceiveOptions {
    pub type_whitelist: Option<Vec<String>>,
    pub sender_whitelist: Option<Vec<String>>,
    pub batch: usize,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiveOptions {
    pub fn new() -> Self {
        Self {
            type_whitelist: None,
            sender_whitelist: None,
            batch: DEFAULT_RECEIVE_BATCH,
        }
    }

    pub fn types(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.type_whitelist = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn senders(mut self, senders: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sender_whitelist = Some(senders.into_iter().map(Into::into).collect());
        self
    }

    pub fn batch(mut self, batch: usize) -> Self {
        self.batch = batch.max(1);
        self
    }

    fn matches(&self, msg: &Message) -> bool {
        let type_ok = self
            .type_whitelist
            .as_ref()
            .map_or(true, |wl| wl.iter().any(|t| t == &msg.kind));
        let sender_ok = self
            .sender_whitelist
            .as_ref()
            .map_or(true, |wl| wl.iter().any(|s| s == &msg.sender));
        type_ok && sender_ok
    }
}

#[derive(Debug, Default)]
pub struct Mailbox {
    messages: VecDeque<Message>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// FIFO enqueue at the tail.
    pub fn append(&mut self, msg: Message) {
        self.messages.push_back(msg);
    }

    /// True iff non-empty, ignoring any filter.
    pub fn has_any(&self) -> bool {
        !self.messages.is_empty()
    }

    /// Scans from head to tail, collecting at most `opts.batch` messages
    /// that satisfy `opts`, removing them in place while preserving the
    /// relative order of everything left behind.
    ///
    /// This is the one operation in the whole crate that has to be careful
    /// about order: a subsequent unfiltered receive must see the remainder
    /// exactly as it arrived (`spec.md` §8, invariant 3).
    pub fn pop_matching(&mut self, opts: &ReceiveOptions) -> Vec<Message> {
        if opts.batch == 0 || self.messages.is_empty() {
            return Vec::new();
        }
        let mut matched = Vec::with_capacity(opts.batch.min(self.messages.len()));
        let mut remainder = VecDeque::with_capacity(self.messages.len());
        for msg in self.messages.drain(..) {
            if matched.len() < opts.batch && opts.matches(&msg) {
                matched.push(msg);
            } else {
                remainder.push_back(msg);
            }
        }
        self.messages = remainder;
        matched
    }

    /// A full, unfiltered, read-only snapshot (used by tests).
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn msg(sender: &str, kind: &str) -> Message {
        Message::new(sender, kind, json!(null))
    }

    #[test]
    fn append_is_fifo() {
        let mut mb = Mailbox::new();
        mb.append(msg("a", "x"));
        mb.append(msg("b", "y"));
        let snap = mb.snapshot();
        assert_eq!(snap[0].sender, "a");
        assert_eq!(snap[1].sender, "b");
    }

    #[test]
    fn pop_matching_preserves_remainder_order() {
        let mut mb = Mailbox::new();
        mb.append(msg("a", "log"));
        mb.append(msg("b", "reply"));
        mb.append(msg("c", "log"));
        mb.append(msg("d", "reply"));

        let opts = ReceiveOptions::new().types(["reply"]).batch(10);
        let popped = mb.pop_matching(&opts);
        assert_eq!(popped.len(), 2);
        assert_eq!(popped[0].sender, "b");
        assert_eq!(popped[1].sender, "d");

        let remainder = mb.snapshot();
        assert_eq!(remainder.len(), 2);
        assert_eq!(remainder[0].sender, "a");
        assert_eq!(remainder[1].sender, "c");
    }

    #[test]
    fn batch_limits_how_many_are_taken() {
        let mut mb = Mailbox::new();
        for s in ["a", "b", "c", "d", "e"] {
            mb.append(msg(s, "t"));
        }
        let opts = ReceiveOptions::new().batch(3);
        let popped = mb.pop_matching(&opts);
        assert_eq!(popped.len(), 3);
        assert_eq!(mb.snapshot().len(), 2);
    }

    #[test]
    fn absent_whitelist_accepts_all() {
        let mut mb = Mailbox::new();
        mb.append(msg("a", "x"));
        mb.append(msg("b", "y"));
        let popped = mb.pop_matching(&ReceiveOptions::new().batch(10));
        assert_eq!(popped.len(), 2);
    }
}
