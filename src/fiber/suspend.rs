//! The two primitive futures every suspension point in the crate reduces to.
//!
//! This scheduler does not rely on a [`Waker`](std::task::Waker) to learn
//! when to re-poll a fiber, unlike the teacher's `fiber::r#async` module
//! (whose `FiberWaker` has to support arbitrary third-party futures driven
//! by a general-purpose `block_on`). This crate's fibers only ever await
//! [`Suspend`] and [`Never`], and the bundle scheduler already knows
//! exactly which fiber names are ready from its own bookkeeping (mailbox
//! contents, `yield_alive` calls) — see `bundle::ReadySet`. So every future
//! here just needs to report "not yet" once and then "done" the next time
//! it is polled; the *decision* to poll again at all lives entirely in the
//! scheduler, not in a wake callback. Polling a pending future without an
//! intervening `wake()` is permitted by the `Future` contract (it is simply
//! not guaranteed to make progress), and here it always does, because the
//! scheduler never re-polls a name it hasn't independently decided is
//! ready.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Resolves the *second* time it is polled. Used for every suspension that
/// should eventually resume: a `yield_alive`, or a receive that found
/// nothing and is waiting for the scheduler to decide a message arrived.
#[derive(Default)]
pub(crate) struct Suspend {
    polled: bool,
}

impl Suspend {
    pub fn new() -> Self {
        Self { polled: false }
    }
}

impl Future for Suspend {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.polled {
            Poll::Ready(())
        } else {
            self.polled = true;
            Poll::Pending
        }
    }
}

/// Never resolves. Backs `wait_forever`: once a fiber is parked here it is
/// never scheduled to make progress again, even if the scheduler mistakenly
/// re-polls it (it won't, since `wait_forever` removes the fiber from the
/// ready set before awaiting this).
pub(crate) struct Never;

impl Future for Never {
    type Output = std::convert::Infallible;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::convert::Infallible> {
        Poll::Pending
    }
}
