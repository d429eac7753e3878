//! Sandboxed runtime for user-written robot programs.
//!
//! Robot programs are Rhai scripts. They run in an engine that has no
//! host capabilities at all: no I/O, no clock, no modules, no `eval`. A
//! program sees a read-only `robot` map and an `api` handle, and the only
//! lasting effects it can have are the requests it records and the values
//! it writes to its own bounded memory.
//!
//! # Modules
//!
//! - [`api`] -- The `api` binding, the `robot` view, and recorded requests.
//! - [`convert`] -- Conversions between Rhai values and engine data.
//! - [`error`] -- [`ScriptError`] for compile, runtime, and memory failures.
//! - [`host`] -- [`ScriptHost`]: engine assembly, limits, compile, and run.
//! - [`memory`] -- [`ScriptMemory`], the bounded per-robot store.

pub mod api;
pub mod convert;
pub mod error;
pub mod host;
pub mod memory;

pub use api::{MAX_NEARBY_RADIUS, ScriptCommand, ScriptRobot};
pub use error::ScriptError;
pub use host::{CompiledScript, ScriptHost, ScriptLimits, ScriptOutcome};
pub use memory::ScriptMemory;
