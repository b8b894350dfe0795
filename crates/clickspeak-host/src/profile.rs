use serde::Serialize;
use std::path::{Path, PathBuf};

/// Fixed description of the application the launcher starts.
///
/// Every component receives the profile explicitly; nothing reads these values
/// from globals.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AppProfile {
    pub display_name: &'static str,
    pub bundle_identifier: &'static str,
    pub runtime_dir_var: &'static str,
    pub project_dir_var: &'static str,
    pub app_name_var: &'static str,
    pub bundle_identifier_var: &'static str,
    pub app_path_var: &'static str,
    /// Default runtime location, relative to the home directory.
    pub default_runtime_suffix: &'static str,
    pub runtime_marker: &'static str,
    pub project_manifest: &'static str,
    /// Candidate project directories, appended verbatim to the home directory.
    pub project_suffixes: &'static [&'static str],
    pub python_version_dir: &'static str,
    pub interpreter: &'static str,
    pub path_prefixes: &'static [&'static str],
    pub fallback_path: &'static str,
    pub install_command: &'static str,
    pub dialog_title: &'static str,
    pub entry_point: EntryPoint,
}

/// The single hand-off point into the application.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntryPoint {
    pub module: &'static str,
    pub function: &'static str,
}

impl EntryPoint {
    /// Python source that imports and calls the entry function.
    pub fn statement(&self) -> String {
        format!(
            "from {} import {}\n{}()\n",
            self.module, self.function, self.function
        )
    }
}

impl AppProfile {
    pub const fn clickspeak() -> Self {
        Self {
            display_name: "ClickSpeak",
            bundle_identifier: "com.lamosty.clickspeak",
            runtime_dir_var: "CLICKSPEAK_RUNTIME_DIR",
            project_dir_var: "CLICKSPEAK_PROJECT_DIR",
            app_name_var: "CLICKSPEAK_APP_NAME",
            bundle_identifier_var: "CLICKSPEAK_BUNDLE_IDENTIFIER",
            app_path_var: "CLICKSPEAK_APP_PATH",
            default_runtime_suffix: "Library/Application Support/ClickSpeak/runtime",
            runtime_marker: ".clickspeak-runtime",
            project_manifest: "pyproject.toml",
            project_suffixes: &[
                "/projects/clickspeak",
                "/clickspeak",
                "/work/clickspeak",
                "/Workspace/clickspeak",
                "/Documents/clickspeak",
            ],
            python_version_dir: "python3.12",
            interpreter: "bin/python3",
            path_prefixes: &["/opt/homebrew/bin", "/usr/local/bin"],
            fallback_path: "/usr/bin:/bin",
            install_command: "bash scripts/install_app.sh",
            dialog_title: "ClickSpeak Error",
            entry_point: EntryPoint {
                module: "clickspeak.__main__",
                function: "main",
            },
        }
    }

    pub fn default_runtime_dir(&self, home: &Path) -> PathBuf {
        home.join(self.default_runtime_suffix)
    }

    pub fn marker_path(&self, runtime_dir: &Path) -> PathBuf {
        runtime_dir.join(self.runtime_marker)
    }

    /// The interpreter the embedded runtime is told is its own executable.
    pub fn interpreter_path(&self, runtime_dir: &Path) -> PathBuf {
        runtime_dir.join(self.interpreter)
    }

    pub fn site_packages(&self, runtime_dir: &Path) -> PathBuf {
        runtime_dir
            .join("lib")
            .join(self.python_version_dir)
            .join("site-packages")
    }

    pub fn project_sources(&self, project_dir: &Path) -> PathBuf {
        project_dir.join("src")
    }

    /// `<home><suffix>` for every candidate, in search order.
    ///
    /// Suffixes start with `/` and are appended as text, so `Path::join` (which
    /// would treat them as absolute) is not used.
    pub fn project_candidates(&self, home: &Path) -> Vec<PathBuf> {
        let home = home.to_string_lossy();
        let home = home.trim_end_matches('/');
        self.project_suffixes
            .iter()
            .map(|suffix| PathBuf::from(format!("{home}{suffix}")))
            .collect()
    }
}

impl Default for AppProfile {
    fn default() -> Self {
        Self::clickspeak()
    }
}
