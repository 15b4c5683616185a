//! End-to-end scenarios S1-S6 from `spec.md` §8, exercised against the
//! public API only (no access to crate-internal bundle/coordinator state).

use std::sync::mpsc;
use std::time::Duration;

use fiberbundle::prelude::run_parallel_map as parallel_map;
use fiberbundle::{FiberContext, Message, ReceiveOptions, Universe};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const TIMEOUT: Duration = Duration::from_secs(5);

/// S1: single-bundle ping-pong. `a` sends `("b","ping","1")`; `b` replies
/// `("a","pong",content)`. `a` must observe `(sender="b", type="pong",
/// content="1")`.
#[test]
fn s1_single_bundle_ping_pong() {
    let _ = env_logger::try_init();
    let (tx, rx) = mpsc::channel::<Message>();
    let universe = Universe::without_init();
    universe.spawn_bundles(1);

    // `b` must exist in the bundle's local map before `a`'s first
    // (synchronous) poll tries to send to it, so spawn `b` first.
    universe.spawn_fiber(
        "b",
        |ctx: FiberContext, _args: Value| async move {
            let msgs = ctx
                .receive_once(ReceiveOptions::new().types(["ping"]))
                .await;
            for msg in msgs {
                ctx.send(&msg.sender, "pong", msg.content.clone());
            }
        },
        Value::Null,
    );
    universe.spawn_fiber(
        "a",
        move |ctx: FiberContext, _args: Value| async move {
            ctx.send("b", "ping", json!("1"));
            let msgs = ctx
                .receive_once(ReceiveOptions::new().types(["pong"]))
                .await;
            if let Some(msg) = msgs.into_iter().next() {
                let _ = tx.send(msg);
            }
        },
        Value::Null,
    );

    let msg = rx.recv_timeout(TIMEOUT).expect("a never observed a pong");
    assert_eq!(msg.sender, "b");
    assert_eq!(msg.kind, "pong");
    assert_eq!(msg.content, json!("1"));
}

/// S2: cross-bundle routing. `p` (bundle 0) sends `("q","x","hello")`
/// where `q` lives in bundle 1. `q` must observe exactly one message
/// `(sender="p", type="x", content="hello")`.
#[test]
fn s2_cross_bundle_routing() {
    let (tx, rx) = mpsc::channel::<Message>();
    let universe = Universe::without_init();
    universe.spawn_bundles(2);

    universe.spawn_fiber_in_specific_bundle(
        "q",
        move |ctx: FiberContext, _args: Value| async move {
            let msgs = ctx.receive_once(ReceiveOptions::new().types(["x"])).await;
            for msg in msgs {
                let _ = tx.send(msg);
            }
        },
        1,
        Value::Null,
    );
    universe.spawn_fiber_in_specific_bundle(
        "p",
        |ctx: FiberContext, _args: Value| async move {
            ctx.send("q", "x", json!("hello"));
        },
        0,
        Value::Null,
    );

    let msg = rx.recv_timeout(TIMEOUT).expect("q never observed the relayed message");
    assert_eq!(msg.sender, "p");
    assert_eq!(msg.kind, "x");
    assert_eq!(msg.content, json!("hello"));

    assert!(
        rx.recv_timeout(Duration::from_millis(200)).is_err(),
        "q observed more than one message"
    );
}

/// S3: selective receive with nesting. Messages of interleaved types are
/// queued in one mailbox; a whitelisted receive consumes only the
/// matching ones, in order, leaving the rest in their original arrival
/// order for a later unfiltered receive.
#[test]
fn s3_selective_receive_with_nesting() {
    let (tx, rx) = mpsc::channel::<(Vec<String>, Vec<String>)>();
    let universe = Universe::without_init();
    universe.spawn_bundles(1);

    universe.spawn_fiber(
        "selective",
        move |ctx: FiberContext, _args: Value| async move {
            let me = ctx.current_fiber().to_owned();
            ctx.send(&me, "log", json!("l1"));
            ctx.send(&me, "reply", json!("r1"));
            ctx.send(&me, "log", json!("l2"));
            ctx.send(&me, "reply", json!("r2"));

            let replies = ctx
                .receive_once(ReceiveOptions::new().types(["reply"]).batch(10))
                .await;
            let logs = ctx
                .receive_once(ReceiveOptions::new().batch(10))
                .await;

            let replies: Vec<String> = replies
                .into_iter()
                .map(|m| m.content.as_str().unwrap().to_owned())
                .collect();
            let logs: Vec<String> = logs
                .into_iter()
                .map(|m| m.content.as_str().unwrap().to_owned())
                .collect();
            let _ = tx.send((replies, logs));
        },
        Value::Null,
    );

    let (replies, logs) = rx.recv_timeout(TIMEOUT).expect("selective fiber never reported back");
    assert_eq!(replies, vec!["r1", "r2"]);
    assert_eq!(logs, vec!["l1", "l2"]);
}

/// S4: batching. Five same-typed messages are queued; a `batch=3` receive
/// consumes exactly the first three, in order, leaving two behind for the
/// next receive.
#[test]
fn s4_batching() {
    let (tx, rx) = mpsc::channel::<(Vec<i64>, Vec<i64>)>();
    let universe = Universe::without_init();
    universe.spawn_bundles(1);

    universe.spawn_fiber(
        "batcher",
        move |ctx: FiberContext, _args: Value| async move {
            let me = ctx.current_fiber().to_owned();
            for n in 1..=5i64 {
                ctx.send(&me, "t", json!(n));
            }
            let first = ctx.receive_once(ReceiveOptions::new().batch(3)).await;
            let rest = ctx.receive_once(ReceiveOptions::new().batch(10)).await;

            let first: Vec<i64> = first.into_iter().map(|m| m.content.as_i64().unwrap()).collect();
            let rest: Vec<i64> = rest.into_iter().map(|m| m.content.as_i64().unwrap()).collect();
            let _ = tx.send((first, rest));
        },
        Value::Null,
    );

    let (first, rest) = rx.recv_timeout(TIMEOUT).expect("batcher never reported back");
    assert_eq!(first, vec![1, 2, 3]);
    assert_eq!(rest, vec![4, 5]);
}

/// S5: inflate and parallel map. `k` worker fibers each compute a pure
/// function; all `k` results are delivered to a collector fiber, which
/// assembles them by index irrespective of arrival order.
#[test]
fn s5_parallel_map_assembles_results_in_order() {
    let (tx, rx) = mpsc::channel::<Value>();
    let universe = Universe::without_init();
    universe.spawn_bundles(4);

    universe.spawn_fiber(
        "listener",
        move |ctx: FiberContext, _args: Value| async move {
            let msgs = ctx
                .receive_once(ReceiveOptions::new().types(["parallel_map_done"]))
                .await;
            if let Some(msg) = msgs.into_iter().next() {
                let _ = tx.send(msg.content);
            }
        },
        Value::Null,
    );

    let inputs: Vec<i64> = (1..=20).collect();
    parallel_map(&universe, "square_job", inputs, |x: i64| x * x, "listener");

    let result = rx.recv_timeout(TIMEOUT).expect("listener never received the assembled results");
    let expected: Vec<Value> = (1..=20i64).map(|x| json!(x * x)).collect();
    assert_eq!(result, Value::Array(expected));
}

/// S6: `wait_forever` keeps a fiber alive (it never panics, never exits)
/// but parks it permanently; the bundle's scheduler keeps making progress
/// on other fibers regardless.
#[test]
fn s6_wait_forever_does_not_block_the_bundle() {
    let (tx, rx) = mpsc::channel::<String>();
    let universe = Universe::without_init();
    universe.spawn_bundles(1);

    universe.spawn_fiber(
        "sleeper",
        |ctx: FiberContext, _args: Value| async move {
            ctx.wait_forever().await;
        },
        Value::Null,
    );
    // A message delivered to a `wait_forever`'d fiber is queued but never
    // observed: the fiber's future never progresses past `Never`.
    universe.spawn_fiber(
        "poker",
        |ctx: FiberContext, _args: Value| async move {
            ctx.send("sleeper", "noop", json!(null));
        },
        Value::Null,
    );
    universe.spawn_fiber(
        "other",
        move |ctx: FiberContext, _args: Value| async move {
            let _ = tx.send(ctx.current_fiber().to_owned());
        },
        Value::Null,
    );

    let name = rx.recv_timeout(TIMEOUT).expect("other fibers must keep making progress");
    assert_eq!(name, "other");
}
