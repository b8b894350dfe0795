use crate::backend::{EmbeddedRuntime, RuntimeConfig};
use crate::EmbedError;
use clickspeak_host::EntryPoint;
use std::ffi::OsString;
use tracing::debug;

/// Records every call instead of embedding an interpreter.
///
/// Follows the same ordering rules as the real backend: one initialization,
/// and no argv or entry point before it.
#[derive(Debug, Default)]
pub struct MockRuntime {
    pub config: Option<RuntimeConfig>,
    pub argv: Vec<OsString>,
    pub statements: Vec<String>,
    pub finalized: bool,
    /// Status the entry point reports.
    pub status: i32,
    /// When set, `initialize` fails with this message.
    pub init_failure: Option<String>,
    /// Print what the application would observe to stdout.
    pub echo: bool,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(status: i32) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn failing_init(message: &str) -> Self {
        Self {
            init_failure: Some(message.to_owned()),
            ..Self::default()
        }
    }

    /// Echoing mock with the status taken from `CLICKSPEAK_MOCK_STATUS`.
    pub fn from_env() -> Self {
        let status = std::env::var("CLICKSPEAK_MOCK_STATUS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);
        debug!("mock runtime reporting status {status}");
        Self {
            status,
            echo: true,
            ..Self::default()
        }
    }

    pub fn initialized(&self) -> bool {
        self.config.is_some()
    }
}

impl EmbeddedRuntime for MockRuntime {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn initialize(&mut self, config: &RuntimeConfig) -> Result<(), EmbedError> {
        if self.initialized() {
            return Err(EmbedError::AlreadyInitialized);
        }
        if let Some(msg) = &self.init_failure {
            return Err(EmbedError::Init(msg.clone()));
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn set_argv(&mut self, argv: &[OsString]) -> Result<(), EmbedError> {
        if !self.initialized() {
            return Err(EmbedError::NotInitialized);
        }
        self.argv = argv.to_vec();
        Ok(())
    }

    fn run_entry_point(&mut self, entry: &EntryPoint) -> Result<(), EmbedError> {
        if !self.initialized() {
            return Err(EmbedError::NotInitialized);
        }
        self.statements.push(entry.statement());

        if self.echo {
            let argv: Vec<_> = self.argv.iter().map(|a| a.to_string_lossy()).collect();
            if let Some(config) = &self.config {
                println!("mock-executable: {}", config.executable.display());
            }
            println!("mock-argv: {}", argv.join(" "));
            if let Some(path) = std::env::var_os("PYTHONPATH") {
                println!("mock-pythonpath: {}", path.to_string_lossy());
            }
            if let Ok(cwd) = std::env::current_dir() {
                println!("mock-cwd: {}", cwd.display());
            }
        }

        match self.status {
            0 => Ok(()),
            status => Err(EmbedError::Application { status }),
        }
    }

    fn finalize(&mut self) {
        if self.initialized() {
            self.finalized = true;
        }
    }
}
