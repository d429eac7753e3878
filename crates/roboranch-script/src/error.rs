//! Error types for the `roboranch-script` crate.
//!
//! Script failures are never fatal to the simulation. The caller records
//! the rendered message on the robot so the operator can fix the program.

/// Errors produced while compiling or running a robot script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// The source text failed to parse.
    #[error("compile error: {message}")]
    Compile {
        /// Parser message, including the position when known.
        message: String,
    },

    /// The script raised an error or hit a sandbox limit while running.
    #[error("runtime error: {message}")]
    Runtime {
        /// Evaluation message, including the position when known.
        message: String,
    },

    /// A memory write broke one of the memory bounds.
    #[error("memory limit: {reason}")]
    MemoryLimit {
        /// Which bound was hit.
        reason: String,
    },
}

impl ScriptError {
    /// Whether this error came from the compiler.
    pub const fn is_compile(&self) -> bool {
        matches!(self, Self::Compile { .. })
    }
}
