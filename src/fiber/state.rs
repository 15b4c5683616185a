//! Fiber lifecycle state, `spec.md` §4.2.

/// The three states a fiber can be in over its lifetime.
///
/// `RUNNING` → `WAITING` happens when a receive finds no matching message.
/// `WAITING` → `RUNNING` happens when the scheduler re-enters the fiber's
/// future and a matching message is now present. Either state moves to
/// `EXITING` when the body's future resolves (or panics); `EXITING` is
/// observable (`Bundle::fiber_state`) but triggers immediate removal from
/// the bundle's maps rather than lingering, per the cleanup decision in
/// `DESIGN.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiberState {
    Running,
    Waiting,
    Exiting,
}
