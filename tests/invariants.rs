//! Property-style checks from `spec.md` §8 that aren't tied to one of the
//! S1-S6 scenarios.

use std::collections::HashSet;
use std::sync::mpsc;
use std::time::Duration;

use fiberbundle::{FiberContext, Message, ReceiveOptions, Universe};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const TIMEOUT: Duration = Duration::from_secs(5);

/// Invariant 5: `new_pid()` never returns the same value twice, even
/// across bundles.
#[test]
fn pid_uniqueness_across_bundles() {
    let (tx, rx) = mpsc::channel::<String>();
    let universe = Universe::without_init();
    universe.spawn_bundles(4);

    const N: u32 = 40;
    for i in 0..N {
        let tx = tx.clone();
        universe.spawn_fiber(
            format!("pid-minter-{i}"),
            move |ctx: FiberContext, _args: Value| async move {
                let _ = tx.send(ctx.new_pid());
            },
            Value::Null,
        );
    }
    drop(tx);

    let mut seen = HashSet::new();
    for _ in 0..N {
        let pid = rx.recv_timeout(TIMEOUT).expect("a fiber never reported its pid");
        assert!(seen.insert(pid), "duplicate pid minted");
    }
}

/// Invariant 2: messages from the same sender to the same receiver arrive
/// in send order, whether or not sender and receiver are co-bundled.
#[test]
fn fifo_per_sender_receiver_pair_survives_relay() {
    let (tx, rx) = mpsc::channel::<Message>();
    let universe = Universe::without_init();
    universe.spawn_bundles(3);

    universe.spawn_fiber_in_specific_bundle(
        "collector",
        move |ctx: FiberContext, _args: Value| async move {
            for _ in 0..50 {
                let msgs = ctx
                    .receive_once(ReceiveOptions::new().senders(["producer"]))
                    .await;
                for msg in msgs {
                    if tx.send(msg).is_err() {
                        return;
                    }
                }
            }
        },
        0,
        Value::Null,
    );
    universe.spawn_fiber_in_specific_bundle(
        "producer",
        |ctx: FiberContext, _args: Value| async move {
            for i in 0..50i64 {
                ctx.send("collector", "seq", json!(i));
            }
        },
        2,
        Value::Null,
    );

    for expected in 0..50i64 {
        let msg = rx.recv_timeout(TIMEOUT).expect("collector never saw all 50 messages");
        assert_eq!(msg.sender, "producer");
        assert_eq!(msg.content, json!(expected));
    }
}

/// Invariant 7 (wake-up liveness): a fiber parked on an empty mailbox
/// resumes once a message is delivered, even after the bundle has had
/// time to fully idle (park on its command channel with nothing ready).
#[test]
fn parked_fiber_wakes_on_later_delivery() {
    let _ = env_logger::try_init();
    let (tx, rx) = mpsc::channel::<Message>();
    let universe = Universe::without_init();
    universe.spawn_bundles(1);

    universe.spawn_fiber(
        "late_receiver",
        move |ctx: FiberContext, _args: Value| async move {
            let msgs = ctx.receive_once(ReceiveOptions::new()).await;
            for msg in msgs {
                let _ = tx.send(msg);
            }
        },
        Value::Null,
    );

    // Give the bundle ample time to park (nothing ready, no pending
    // commands) before waking it with a late send.
    std::thread::sleep(Duration::from_millis(300));

    universe.spawn_fiber(
        "late_sender",
        |ctx: FiberContext, _args: Value| async move {
            ctx.send("late_receiver", "wake", json!("hi"));
        },
        Value::Null,
    );

    let msg = rx.recv_timeout(TIMEOUT).expect("late_receiver never woke up");
    assert_eq!(msg.kind, "wake");
}
