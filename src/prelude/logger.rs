//! The by-convention diagnostic sink `spec.md` §7 refers to: "Diagnostics
//! are delivered by convention as messages to a `logger` fiber (an
//! external collaborator, not part of core)." This module ships the
//! convention's other half — a fiber body that actually is one.

use log::Level;
use serde::Deserialize;
use serde_json::Value;

use crate::fiber::FiberContext;
use crate::mailbox::ReceiveOptions;
use crate::Universe;

/// The `content` shape this fiber expects: `{"level": "info", "message": "..."}`.
/// A message whose content does not deserialize to this shape is logged at
/// `Level::Info` with the raw JSON as its text, rather than dropped — a
/// misshapen diagnostic is still a diagnostic.
#[derive(Deserialize)]
struct LogRecord {
    #[serde(default = "default_level")]
    level: String,
    message: String,
}

fn default_level() -> String {
    "info".to_owned()
}

fn parse_level(level: &str) -> Level {
    match level.to_ascii_lowercase().as_str() {
        "error" => Level::Error,
        "warn" | "warning" => Level::Warn,
        "debug" => Level::Debug,
        "trace" => Level::Trace,
        _ => Level::Info,
    }
}

async fn logger_body(ctx: FiberContext, _args: Value) {
    let opts = ReceiveOptions::new().types(["log"]);
    ctx.receive_forever(opts, |msg| match serde_json::from_value::<LogRecord>(msg.content.clone())
    {
        Ok(record) => {
            log::log!(parse_level(&record.level), "[{}] {}", msg.sender, record.message);
        }
        Err(_) => {
            log::info!("[{}] {}", msg.sender, msg.content);
        }
    })
    .await;
}

/// Spawns the logger fiber under `name` (conventionally `"logger"`) in
/// `universe`. Any fiber can reach it with
/// `ctx.send("logger", "log", json!({"level": "warn", "message": "…"}))`.
pub fn spawn_logger(universe: &Universe, name: impl Into<String>) {
    universe.spawn_fiber(name, logger_body, Value::Null);
}
