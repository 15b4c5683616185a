//! Peripheral conveniences explicitly scoped out of the core by `spec.md`
//! §1 ("The prelude utilities… are not specified here beyond the
//! interfaces they consume"). Kept in this crate, behind `prelude`, so the
//! crate is usable end to end out of the box — but not held to the core's
//! rigor (`SPEC_FULL.md` §10).
//!
//! - [logger]: a fiber that forwards `(sender, "log", {level, message})` to the `log` facade
//! - [agent]: a minimal `gen_server`-flavored request/reply fiber
//! - [parallel_map]: distributes pure computations across bundles and assembles the results
//! - [capture]: a `Send`-safe way to smuggle caller state into a spawned fiber's `args`

pub mod agent;
pub mod capture;
pub mod logger;
pub mod parallel_map;

pub use agent::spawn_agent;
pub use capture::Captured;
pub use logger::spawn_logger;
pub use parallel_map::parallel_map as run_parallel_map;
