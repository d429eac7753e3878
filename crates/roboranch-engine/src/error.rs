//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup, the run, and
//! the final save so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: roboranch_core::config::ConfigError,
    },

    /// Farm clock initialization failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: roboranch_core::clock::ClockError,
    },

    /// Starting farm construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: roboranch_world::WorldError,
    },

    /// Loading or writing the save file failed.
    #[error("snapshot error: {source}")]
    Snapshot {
        /// The underlying snapshot error.
        #[from]
        source: roboranch_core::snapshot::SnapshotError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: roboranch_core::runner::RunnerError,
    },

    /// Starting fleet deployment failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },
}
