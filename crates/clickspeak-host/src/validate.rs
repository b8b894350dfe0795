use crate::{AppProfile, LaunchError};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fail unless the runtime marker exists directly inside `runtime_dir`.
///
/// Only existence matters; the marker's content is never read.
pub fn check_runtime_installed(profile: &AppProfile, runtime_dir: &Path) -> Result<(), LaunchError> {
    let marker = profile.marker_path(runtime_dir);
    if marker.exists() {
        debug!(marker = %marker.display(), "runtime marker present");
        Ok(())
    } else {
        Err(LaunchError::RuntimeNotInstalled {
            runtime_dir: runtime_dir.to_path_buf(),
        })
    }
}

/// A part of the runtime tree that is expected but absent.
#[derive(Debug)]
pub struct MissingComponent {
    pub name: &'static str,
    pub path: PathBuf,
    pub purpose: &'static str,
    /// Whether the launch is certain to fail without it.
    pub fatal: bool,
}

impl fmt::Display for MissingComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (expected at {})",
            self.name,
            self.purpose,
            self.path.display()
        )
    }
}

/// Inspect the runtime tree beyond the marker. Used for diagnostics only; the
/// launcher itself relies on the marker and on interpreter initialization.
pub fn inspect_runtime(profile: &AppProfile, runtime_dir: &Path) -> Vec<MissingComponent> {
    let mut missing = Vec::new();

    let marker = profile.marker_path(runtime_dir);
    if !marker.exists() {
        missing.push(MissingComponent {
            name: "runtime marker",
            path: marker,
            purpose: "signals a completed runtime installation",
            fatal: true,
        });
    }

    let interpreter = profile.interpreter_path(runtime_dir);
    if !interpreter.exists() {
        missing.push(MissingComponent {
            name: "interpreter",
            path: interpreter,
            purpose: "executable identity of the embedded runtime",
            fatal: true,
        });
    }

    let venv_cfg = runtime_dir.join("pyvenv.cfg");
    if !venv_cfg.exists() {
        missing.push(MissingComponent {
            name: "pyvenv.cfg",
            path: venv_cfg,
            purpose: "points the runtime at its base installation",
            fatal: false,
        });
    }

    let site_packages = profile.site_packages(runtime_dir);
    if !site_packages.is_dir() {
        missing.push(MissingComponent {
            name: "site-packages",
            path: site_packages,
            purpose: "installed application packages",
            fatal: false,
        });
    }

    missing
}

/// Format missing components into a user-friendly report.
pub fn format_missing(profile: &AppProfile, missing: &[MissingComponent]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("runtime is incomplete:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    let _ = write!(msg, "\nRe-run: {}", profile.install_command);
    msg
}
