//! The ClickSpeak launcher pipeline and its diagnostics.
//!
//! `launch` wires the host crate (discovery, validation, environment) to an
//! `EmbeddedRuntime` and turns every fatal condition into exactly one
//! user-facing report plus exit status 1. `doctor` runs the same discovery
//! without embedding anything and reports what it found.

pub mod doctor;
pub mod launch;

use clickspeak_host::{AppProfile, LaunchError};
use clickspeak_runtime::EmbedError;
use thiserror::Error;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

#[derive(Debug, Error)]
pub enum FatalError {
    #[error(transparent)]
    Host(#[from] LaunchError),
    #[error(transparent)]
    Embed(#[from] EmbedError),
}

impl FatalError {
    /// Dialog text, or `None` when the application already reported for itself.
    pub fn user_message(&self, profile: &AppProfile) -> Option<String> {
        match self {
            Self::Host(e) => Some(e.user_message(profile)),
            Self::Embed(EmbedError::Application { .. }) => None,
            Self::Embed(_) => Some(format!(
                "Python initialization failed. Re-run: {}",
                profile.install_command
            )),
        }
    }
}

/// Install the stderr subscriber. `CLICKSPEAK_LOG` overrides `default_level`.
pub fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("CLICKSPEAK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
