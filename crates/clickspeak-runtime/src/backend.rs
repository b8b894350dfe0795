use crate::EmbedError;
use clickspeak_host::{EntryPoint, LaunchEnvironment, LaunchIdentity};
use serde::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;

/// Explicit configuration handed to the embedding call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// The path the runtime treats as its own executable. Always inside the
    /// runtime tree, never the launcher binary.
    pub executable: PathBuf,
    pub module_search_path: Vec<PathBuf>,
    /// Interpreter command-line parsing. Always off: launcher arguments belong
    /// to the application.
    pub parse_argv: bool,
    pub site_import: bool,
}

impl RuntimeConfig {
    pub fn new(identity: &LaunchIdentity, env: &LaunchEnvironment) -> Self {
        Self {
            executable: identity.runtime_executable.clone(),
            module_search_path: env.module_search_path.clone(),
            parse_argv: false,
            site_import: true,
        }
    }
}

pub trait EmbeddedRuntime {
    fn name(&self) -> &str;

    /// Load and initialize the runtime. At most once per process.
    fn initialize(&mut self, config: &RuntimeConfig) -> Result<(), EmbedError>;

    /// Publish the application's argument vector.
    fn set_argv(&mut self, argv: &[OsString]) -> Result<(), EmbedError>;

    /// Run the entry point. `Ok` for a clean return, `EmbedError::Application`
    /// for a non-zero status.
    fn run_entry_point(&mut self, entry: &EntryPoint) -> Result<(), EmbedError>;

    /// Tear the runtime down. A no-op when it was never initialized.
    fn finalize(&mut self) {}
}

/// Pick a backend by name. `python` embeds CPython; `mock` is for tests.
pub fn select_runtime(name: &str) -> Result<Box<dyn EmbeddedRuntime>, EmbedError> {
    match name {
        "python" => Ok(Box::new(crate::python::PythonRuntime::new())),
        "mock" => Ok(Box::new(crate::mock::MockRuntime::from_env())),
        other => Err(EmbedError::UnknownBackend(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clickspeak_host::{compose_environment, AppProfile, Located, LocationSource, Locations};
    use std::path::Path;

    #[test]
    fn select_valid_backends() {
        assert_eq!(select_runtime("python").unwrap().name(), "python");
        assert_eq!(select_runtime("mock").unwrap().name(), "mock");
    }

    #[test]
    fn select_invalid_backend_fails() {
        assert!(matches!(
            select_runtime("jvm"),
            Err(EmbedError::UnknownBackend(name)) if name == "jvm"
        ));
    }

    #[test]
    fn config_uses_runtime_interpreter_not_launcher() {
        let profile = AppProfile::clickspeak();
        let locations = Locations {
            runtime: Located {
                path: PathBuf::from("/rt"),
                source: LocationSource::Override,
            },
            project: None,
        };
        let identity = LaunchIdentity::resolve(
            &profile,
            &locations.runtime.path,
            Some(Path::new("/Applications/ClickSpeak.app/Contents/MacOS/ClickSpeak")),
        );
        let env = compose_environment(&profile, &locations, &identity, None).unwrap();
        let config = RuntimeConfig::new(&identity, &env);
        assert_eq!(config.executable, PathBuf::from("/rt/bin/python3"));
        assert!(!config.parse_argv);
        assert!(config.site_import);
        assert_eq!(config.module_search_path, env.module_search_path);
    }
}
