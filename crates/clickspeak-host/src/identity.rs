use crate::AppProfile;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The identities a launch presents.
///
/// The OS attributes permissions to `launcher_executable`, the binary actually
/// running. The embedded runtime resolves its standard library and packages
/// relative to `runtime_executable`. The application sees `display_name` as
/// its program name. The three are independent and must not be substituted
/// for each other.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LaunchIdentity {
    pub display_name: String,
    pub runtime_executable: PathBuf,
    pub launcher_executable: Option<PathBuf>,
}

impl LaunchIdentity {
    pub fn resolve(profile: &AppProfile, runtime_dir: &Path, current_exe: Option<&Path>) -> Self {
        Self {
            display_name: profile.display_name.to_owned(),
            runtime_executable: profile.interpreter_path(runtime_dir),
            launcher_executable: current_exe.map(Path::to_path_buf),
        }
    }
}
