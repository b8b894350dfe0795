//! Embedded runtime backends for the ClickSpeak launcher.
//!
//! The `EmbeddedRuntime` trait is the seam between the launcher pipeline and
//! the interpreter loaded into the launcher's own process. `PythonRuntime`
//! embeds CPython through pyo3; `MockRuntime` records what it is asked to do so
//! the pipeline can be exercised without an interpreter.

pub mod backend;
pub mod mock;
pub mod python;

pub use backend::{select_runtime, EmbeddedRuntime, RuntimeConfig};
pub use mock::MockRuntime;
pub use python::PythonRuntime;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("Python initialization failed: {0}")]
    Init(String),
    #[error("runtime setup failed: {0}")]
    Setup(String),
    #[error("the embedded runtime is already initialized in this process")]
    AlreadyInitialized,
    #[error("the embedded runtime is not initialized")]
    NotInitialized,
    #[error("application exited with status {status}")]
    Application { status: i32 },
    #[error("unknown runtime backend '{0}'")]
    UnknownBackend(String),
}
