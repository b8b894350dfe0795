use crate::{AppProfile, LaunchError, LaunchIdentity, Locations};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where environment writes go. The launcher uses `LiveProcess`; tests record.
pub trait ProcessEnv {
    fn set_var(&mut self, key: &str, value: &OsStr);

    fn set_current_dir(&mut self, dir: &Path) -> std::io::Result<()>;
}

/// The real process environment and working directory.
pub struct LiveProcess;

impl ProcessEnv for LiveProcess {
    fn set_var(&mut self, key: &str, value: &OsStr) {
        std::env::set_var(key, value);
    }

    fn set_current_dir(&mut self, dir: &Path) -> std::io::Result<()> {
        std::env::set_current_dir(dir)
    }
}

/// Everything the embedded runtime and application will read from the process
/// before and during interpreter startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchEnvironment {
    /// Variables in the order they are applied.
    pub vars: Vec<(String, OsString)>,
    /// Module search path, highest precedence first.
    pub module_search_path: Vec<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LaunchEnvironment {
    pub fn get(&self, key: &str) -> Option<&OsStr> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    /// Write every variable, then change directory when a project is in use.
    ///
    /// A failed directory change is logged and tolerated.
    pub fn apply(&self, process: &mut dyn ProcessEnv) {
        for (key, value) in &self.vars {
            debug!("{key}={}", value.to_string_lossy());
            process.set_var(key, value);
        }
        if let Some(dir) = &self.working_dir {
            if let Err(e) = process.set_current_dir(dir) {
                warn!("cannot change directory to {}: {e}", dir.display());
            }
        }
    }
}

/// Build the launch environment. Pure: reads nothing from the live process.
pub fn compose_environment(
    profile: &AppProfile,
    locations: &Locations,
    identity: &LaunchIdentity,
    inherited_path: Option<&OsStr>,
) -> Result<LaunchEnvironment, LaunchError> {
    let runtime_dir = &locations.runtime.path;
    let mut project_dir = locations.project.as_ref().map(|p| p.path.as_path());

    let mut vars: Vec<(String, OsString)> = vec![
        ("PYTHONUNBUFFERED".to_owned(), "1".into()),
        ("PYTHONNOUSERSITE".to_owned(), "1".into()),
        ("PYTHONFAULTHANDLER".to_owned(), "1".into()),
        (
            profile.bundle_identifier_var.to_owned(),
            profile.bundle_identifier.into(),
        ),
        (profile.app_name_var.to_owned(), profile.display_name.into()),
        (
            profile.runtime_dir_var.to_owned(),
            runtime_dir.as_os_str().to_owned(),
        ),
    ];

    if let Some(exe) = &identity.launcher_executable {
        vars.push((profile.app_path_var.to_owned(), exe.as_os_str().to_owned()));
    }

    vars.push((
        "PATH".to_owned(),
        prepend_search_path(profile, inherited_path)?,
    ));

    let mut search_path = module_search_path(profile, runtime_dir, project_dir);
    let pythonpath = match std::env::join_paths(&search_path) {
        Ok(joined) => joined,
        Err(e) if project_dir.is_some() => {
            warn!("project directory cannot go on the module search path ({e}), running without it");
            project_dir = None;
            search_path = module_search_path(profile, runtime_dir, None);
            std::env::join_paths(&search_path).map_err(|e| {
                LaunchError::Configuration(format!("cannot build module search path: {e}"))
            })?
        }
        Err(e) => {
            return Err(LaunchError::Configuration(format!(
                "cannot build module search path: {e}"
            )))
        }
    };
    vars.push(("PYTHONPATH".to_owned(), pythonpath));

    Ok(LaunchEnvironment {
        vars,
        module_search_path: search_path,
        working_dir: project_dir.map(Path::to_path_buf),
    })
}

/// Project sources (when present) shadow the runtime's installed packages.
pub fn module_search_path(
    profile: &AppProfile,
    runtime_dir: &Path,
    project_dir: Option<&Path>,
) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(2);
    if let Some(project) = project_dir {
        paths.push(profile.project_sources(project));
    }
    paths.push(profile.site_packages(runtime_dir));
    paths
}

fn prepend_search_path(
    profile: &AppProfile,
    inherited: Option<&OsStr>,
) -> Result<OsString, LaunchError> {
    let inherited = inherited.unwrap_or_else(|| OsStr::new(profile.fallback_path));
    let entries = profile
        .path_prefixes
        .iter()
        .map(PathBuf::from)
        .chain(std::env::split_paths(inherited));
    std::env::join_paths(entries)
        .map_err(|e| LaunchError::Configuration(format!("cannot build PATH: {e}")))
}
