//! Host-side logic for the ClickSpeak native launcher.
//!
//! This crate covers everything that happens before the embedded interpreter
//! takes over: the fixed application profile (`AppProfile`), discovery of the
//! runtime and development project directories (`probe`), the runtime marker
//! check (`validate`), composition of the process environment the runtime will
//! read at startup (`compose`), the two launch identities (`identity`), the
//! `sys.argv` rewrite (`argv`), and user-facing failure reporting (`report`).

pub mod argv;
pub mod compose;
pub mod identity;
pub mod probe;
pub mod profile;
pub mod report;
pub mod validate;

pub use argv::rewrite_argv;
pub use compose::{compose_environment, LaunchEnvironment, LiveProcess, ProcessEnv};
pub use identity::LaunchIdentity;
pub use probe::{first_match, probe, HostContext, Located, LocationSource, Locations};
pub use profile::{AppProfile, EntryPoint};
pub use report::{dialog_script, reporter_from_env, DialogReporter, FailureReporter, StderrReporter};
pub use validate::{check_runtime_installed, format_missing, inspect_runtime, MissingComponent};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("HOME is not set and no runtime directory override was given")]
    HomeNotSet,
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("runtime not installed: marker missing in {}", runtime_dir.display())]
    RuntimeNotInstalled { runtime_dir: PathBuf },
}

impl LaunchError {
    /// The actionable text shown in the failure dialog.
    pub fn user_message(&self, profile: &AppProfile) -> String {
        match self {
            Self::HomeNotSet => "HOME environment variable is not set.".to_owned(),
            Self::Configuration(_) => format!(
                "Could not determine {} runtime directory.",
                profile.display_name
            ),
            Self::RuntimeNotInstalled { .. } => format!(
                "{} runtime not found. Re-run: {}",
                profile.display_name, profile.install_command
            ),
        }
    }
}
