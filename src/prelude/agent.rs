//! A minimal Erlang-`gen_server`-flavored helper: a fiber that owns a piece
//! of state and answers `"call"` messages by running a caller-supplied
//! handler against it, replying to whichever fiber asked.
//!
//! Not a typed RPC layer — just the request/reply loop the original's
//! `agent.tcl` collaborator provided, ported to this crate's primitives.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fiber::FiberBody;
use crate::fiber::FiberContext;
use crate::mailbox::ReceiveOptions;
use crate::Universe;

/// The expected shape of a `"call"` message's content: the argument to pass
/// the handler plus where to send the result.
#[derive(Deserialize)]
struct CallRequest {
    reply_to: String,
    arg: Value,
}

/// The shape of the reply sent back to `reply_to`.
#[derive(Serialize)]
struct CallReply {
    result: Value,
}

struct AgentBody<S, F> {
    init: S,
    handle: F,
}

impl<S, F> FiberBody for AgentBody<S, F>
where
    S: Send + 'static,
    F: Fn(&mut S, Value) -> Value + Send + 'static,
{
    fn run(
        self: Box<Self>,
        ctx: FiberContext,
        _args: Value,
    ) -> crate::fiber::body::LocalBoxFuture {
        let AgentBody { mut init, handle } = *self;
        Box::pin(async move {
            let opts = ReceiveOptions::new().types(["call"]);
            ctx.receive_forever(opts, |msg| {
                let request: CallRequest = match serde_json::from_value(msg.content) {
                    Ok(r) => r,
                    Err(err) => {
                        log::warn!("agent {} got a malformed call from {}: {err}", ctx.current_fiber(), msg.sender);
                        return;
                    }
                };
                let result = handle(&mut init, request.arg);
                let reply = serde_json::to_value(CallReply { result }).unwrap_or(Value::Null);
                ctx.send(&request.reply_to, "reply", reply);
            })
            .await;
        })
    }
}

/// Spawns a fiber named `name` in `universe` that owns `state` and, for
/// every `"call"` message of shape `{"reply_to": ..., "arg": ...}`, runs
/// `handle(&mut state, arg)` and sends `{"result": ...}` back to
/// `reply_to` with type `"reply"`.
pub fn spawn_agent<S, F>(universe: &Universe, name: impl Into<String>, state: S, handle: F)
where
    S: Send + 'static,
    F: Fn(&mut S, Value) -> Value + Send + 'static,
{
    universe.spawn_fiber(
        name,
        AgentBody {
            init: state,
            handle,
        },
        Value::Null,
    );
}
