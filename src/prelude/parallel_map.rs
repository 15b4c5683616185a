//! Distributes a pure computation over `k` input elements across whatever
//! bundles `Universe::inflate`/`spawn_bundles` already set up, round-robin,
//! and assembles the results back in input order. Directly exercises
//! `spec.md` §8 scenario S5 ("inflate and parallel map").

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::fiber::FiberContext;
use crate::mailbox::ReceiveOptions;
use crate::Universe;

#[derive(Serialize, serde::Deserialize)]
struct WorkItem {
    index: usize,
    input: Value,
}

#[derive(Serialize, serde::Deserialize)]
struct WorkResult {
    index: usize,
    output: Value,
}

/// Spawns one fiber per input element (named `"{job_name}_worker_{i}"`),
/// each applying `f` to its element and sending `(index, output)` back to
/// a coordinator fiber (named `"{job_name}_collector"`) that assembles the
/// results in input order and returns them to `reply_to`.
///
/// `f` must be a plain function pointer, not a closure capturing
/// bundle-local state: every worker fiber may run on a different OS
/// thread than the caller (`SPEC_FULL.md` §4.2/§9), so `f` is sent by
/// value to whichever bundle the coordinator places each worker in.
pub fn parallel_map<T, R>(
    universe: &Universe,
    job_name: impl Into<String>,
    inputs: Vec<T>,
    f: fn(T) -> R,
    reply_to: impl Into<String>,
) where
    T: Serialize + DeserializeOwned + Send + 'static,
    R: Serialize + DeserializeOwned + Send + 'static,
{
    let job_name = job_name.into();
    let reply_to = reply_to.into();
    let total = inputs.len();
    let collector_name = format!("{job_name}_collector");

    universe.spawn_fiber(
        collector_name.clone(),
        move |ctx: FiberContext, _args: Value| async move { collector_body(ctx, total, reply_to).await },
        Value::Null,
    );

    for (index, input) in inputs.into_iter().enumerate() {
        let worker_name = format!("{job_name}_worker_{index}");
        let item = WorkItem {
            index,
            input: serde_json::to_value(input).expect("parallel_map input must serialize"),
        };
        let collector = collector_name.clone();
        universe.spawn_fiber(
            worker_name,
            move |ctx: FiberContext, args: Value| async move { worker_body(ctx, args, f, collector).await },
            serde_json::to_value(&item).expect("parallel_map work item must serialize"),
        );
    }
}

async fn worker_body<T, R>(ctx: FiberContext, args: Value, f: fn(T) -> R, collector: String)
where
    T: DeserializeOwned,
    R: Serialize,
{
    let item: WorkItem = serde_json::from_value(args).expect("parallel_map work item must deserialize");
    let input: T = serde_json::from_value(item.input).expect("parallel_map input must deserialize");
    let output = f(input);
    let result = WorkResult {
        index: item.index,
        output: serde_json::to_value(output).expect("parallel_map output must serialize"),
    };
    ctx.send(
        &collector,
        "result",
        serde_json::to_value(&result).expect("parallel_map result must serialize"),
    );
}

async fn collector_body(ctx: FiberContext, total: usize, reply_to: String) {
    let mut collected: HashMap<usize, Value> = HashMap::with_capacity(total);
    let opts = ReceiveOptions::new().types(["result"]);
    while collected.len() < total {
        let batch = ctx.receive_once(opts.clone()).await;
        for msg in batch {
            if let Ok(result) = serde_json::from_value::<WorkResult>(msg.content) {
                collected.insert(result.index, result.output);
            }
        }
    }
    let ordered: Vec<Value> = (0..total)
        .map(|i| collected.remove(&i).unwrap_or(Value::Null))
        .collect();
    ctx.send(&reply_to, "parallel_map_done", Value::Array(ordered));
}
