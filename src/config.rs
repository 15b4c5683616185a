//! Small tunables the original left as magic numbers, gathered in one
//! place rather than scattered as inline literals, matching the teacher's
//! convention of a handful of `pub const`s near the top of the module that
//! owns them (tarantool-module has no dedicated config crate, since
//! Tarantool itself owns configuration).

/// Default bundle count `Universe::inflate` falls back to when
/// [`std::thread::available_parallelism`] cannot determine the host's CPU
/// count. `spec.md` §6: `Universe.inflate(fallback=32)`.
pub const DEFAULT_INFLATE_FALLBACK: u32 = 32;

/// Default `ReceiveOptions::batch`: receive exactly one matching message
/// per `receive_once`/`receive_forever` iteration unless the caller opts
/// into batching.
pub const DEFAULT_RECEIVE_BATCH: usize = 1;
