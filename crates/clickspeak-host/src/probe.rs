use crate::{AppProfile, LaunchError};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Snapshot of the process inputs the launcher depends on.
///
/// Captured once from the live process by the binary; tests build it directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostContext {
    pub home: Option<PathBuf>,
    pub runtime_override: Option<PathBuf>,
    pub project_override: Option<PathBuf>,
    pub inherited_path: Option<OsString>,
    pub current_exe: Option<PathBuf>,
    /// Working directory at startup; relative overrides resolve against it.
    pub current_dir: Option<PathBuf>,
}

impl HostContext {
    pub fn capture(profile: &AppProfile) -> Self {
        Self {
            home: non_empty_var("HOME"),
            runtime_override: non_empty_var(profile.runtime_dir_var),
            project_override: non_empty_var(profile.project_dir_var),
            inherited_path: std::env::var_os("PATH"),
            current_exe: std::env::current_exe().ok(),
            current_dir: std::env::current_dir().ok(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn non_empty(path: Option<&PathBuf>) -> Option<&PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

/// Anchor a relative override at the startup directory. The launcher changes
/// directory before the runtime starts, so a relative path would otherwise
/// resolve somewhere else.
fn absolute(path: &Path, cwd: Option<&Path>) -> Option<PathBuf> {
    if path.is_absolute() {
        Some(path.to_path_buf())
    } else {
        cwd.map(|dir| dir.join(path))
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Override,
    Discovered,
    Default,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Located {
    pub path: PathBuf,
    pub source: LocationSource,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Locations {
    pub runtime: Located,
    pub project: Option<Located>,
}

/// Return the first candidate accepted by `accept`, preserving candidate order.
pub fn first_match<T>(
    candidates: impl IntoIterator<Item = T>,
    mut accept: impl FnMut(&T) -> bool,
) -> Option<T> {
    candidates.into_iter().find(|c| accept(c))
}

/// Resolve the runtime and (optional) project directories.
///
/// `exists` is the only filesystem access; pass `Path::exists` for the real
/// filesystem.
pub fn probe(
    profile: &AppProfile,
    ctx: &HostContext,
    exists: impl Fn(&Path) -> bool,
) -> Result<Locations, LaunchError> {
    let runtime = resolve_runtime_dir(profile, ctx)?;
    debug!(path = %runtime.path.display(), source = ?runtime.source, "runtime directory");

    let project = find_project_dir(profile, ctx, &exists);
    match &project {
        Some(p) => debug!(path = %p.path.display(), source = ?p.source, "project directory"),
        None => debug!("no project directory, runtime-only mode"),
    }

    Ok(Locations { runtime, project })
}

fn resolve_runtime_dir(profile: &AppProfile, ctx: &HostContext) -> Result<Located, LaunchError> {
    if let Some(dir) = non_empty(ctx.runtime_override.as_ref()) {
        let path = absolute(dir, ctx.current_dir.as_deref()).ok_or_else(|| {
            LaunchError::Configuration(format!(
                "runtime override {} is relative and the working directory is unknown",
                dir.display()
            ))
        })?;
        return Ok(Located {
            path,
            source: LocationSource::Override,
        });
    }
    let home = non_empty(ctx.home.as_ref()).ok_or(LaunchError::HomeNotSet)?;
    Ok(Located {
        path: profile.default_runtime_dir(home),
        source: LocationSource::Default,
    })
}

fn find_project_dir(
    profile: &AppProfile,
    ctx: &HostContext,
    exists: &impl Fn(&Path) -> bool,
) -> Option<Located> {
    // Overrides are trusted as given; only discovery requires the manifest.
    if let Some(given) = non_empty(ctx.project_override.as_ref()) {
        let Some(dir) = absolute(given, ctx.current_dir.as_deref()) else {
            warn!(
                "project override {} is relative and the working directory is unknown, ignoring it",
                given.display()
            );
            return None;
        };
        if !exists(&dir.join(profile.project_manifest)) {
            warn!(
                "project override {} has no {}, using it anyway",
                dir.display(),
                profile.project_manifest
            );
        }
        return Some(Located {
            path: dir,
            source: LocationSource::Override,
        });
    }

    let home = non_empty(ctx.home.as_ref())?;
    first_match(profile.project_candidates(home), |candidate| {
        exists(&candidate.join(profile.project_manifest))
    })
    .map(|path| Located {
        path,
        source: LocationSource::Discovered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ctx_with_home(home: &str) -> HostContext {
        HostContext {
            home: Some(PathBuf::from(home)),
            ..HostContext::default()
        }
    }

    fn fs_with(paths: &[&str]) -> impl Fn(&Path) -> bool {
        let set: HashSet<PathBuf> = paths.iter().map(PathBuf::from).collect();
        move |p: &Path| set.contains(p)
    }

    #[test]
    fn first_match_returns_first_accepted() {
        let found = first_match(["a", "b", "c", "b"], |c| *c == "b" || *c == "c");
        assert_eq!(found, Some("b"));
        assert_eq!(first_match(Vec::<u8>::new(), |_| true), None);
    }

    #[test]
    fn runtime_override_wins_over_default() {
        let profile = AppProfile::clickspeak();
        let ctx = HostContext {
            runtime_override: Some(PathBuf::from("/opt/rt")),
            ..ctx_with_home("/Users/alice")
        };
        let loc = probe(&profile, &ctx, |_| false).unwrap();
        assert_eq!(loc.runtime.path, PathBuf::from("/opt/rt"));
        assert_eq!(loc.runtime.source, LocationSource::Override);
    }

    #[test]
    fn empty_runtime_override_is_ignored() {
        let profile = AppProfile::clickspeak();
        let ctx = HostContext {
            runtime_override: Some(PathBuf::new()),
            ..ctx_with_home("/Users/alice")
        };
        let loc = probe(&profile, &ctx, |_| false).unwrap();
        assert_eq!(loc.runtime.source, LocationSource::Default);
        assert_eq!(
            loc.runtime.path,
            PathBuf::from("/Users/alice/Library/Application Support/ClickSpeak/runtime")
        );
    }

    #[test]
    fn runtime_override_works_without_home() {
        let profile = AppProfile::clickspeak();
        let ctx = HostContext {
            runtime_override: Some(PathBuf::from("/opt/rt")),
            ..HostContext::default()
        };
        let loc = probe(&profile, &ctx, |_| true).unwrap();
        assert_eq!(loc.runtime.path, PathBuf::from("/opt/rt"));
        assert!(loc.project.is_none());
    }

    #[test]
    fn missing_home_without_override_fails() {
        let profile = AppProfile::clickspeak();
        let err = probe(&profile, &HostContext::default(), |_| true).unwrap_err();
        assert!(matches!(err, LaunchError::HomeNotSet));

        let empty_home = ctx_with_home("");
        let err = probe(&profile, &empty_home, |_| true).unwrap_err();
        assert!(matches!(err, LaunchError::HomeNotSet));
    }

    #[test]
    fn discovery_takes_first_candidate_with_manifest() {
        let profile = AppProfile::clickspeak();
        let fs = fs_with(&[
            "/Users/alice/work/clickspeak/pyproject.toml",
            "/Users/alice/Documents/clickspeak/pyproject.toml",
        ]);
        let loc = probe(&profile, &ctx_with_home("/Users/alice"), fs).unwrap();
        let project = loc.project.unwrap();
        assert_eq!(project.path, PathBuf::from("/Users/alice/work/clickspeak"));
        assert_eq!(project.source, LocationSource::Discovered);
    }

    #[test]
    fn directory_without_manifest_is_not_a_project() {
        let profile = AppProfile::clickspeak();
        // The directory itself exists but carries no manifest.
        let fs = fs_with(&["/Users/alice/projects/clickspeak"]);
        let loc = probe(&profile, &ctx_with_home("/Users/alice"), fs).unwrap();
        assert!(loc.project.is_none());
    }

    #[test]
    fn project_override_wins_over_discovery() {
        let profile = AppProfile::clickspeak();
        let fs = fs_with(&[
            "/Users/alice/projects/clickspeak/pyproject.toml",
            "/src/cs/pyproject.toml",
        ]);
        let ctx = HostContext {
            project_override: Some(PathBuf::from("/src/cs")),
            ..ctx_with_home("/Users/alice")
        };
        let project = probe(&profile, &ctx, fs).unwrap().project.unwrap();
        assert_eq!(project.path, PathBuf::from("/src/cs"));
        assert_eq!(project.source, LocationSource::Override);
    }

    #[test]
    fn project_override_without_manifest_is_accepted() {
        let profile = AppProfile::clickspeak();
        let ctx = HostContext {
            project_override: Some(PathBuf::from("/work/app")),
            ..ctx_with_home("/Users/alice")
        };
        let project = probe(&profile, &ctx, |_| false).unwrap().project.unwrap();
        assert_eq!(project.path, PathBuf::from("/work/app"));
    }

    #[test]
    fn empty_project_override_falls_back_to_discovery() {
        let profile = AppProfile::clickspeak();
        let fs = fs_with(&["/Users/alice/clickspeak/pyproject.toml"]);
        let ctx = HostContext {
            project_override: Some(PathBuf::new()),
            ..ctx_with_home("/Users/alice")
        };
        let project = probe(&profile, &ctx, fs).unwrap().project.unwrap();
        assert_eq!(project.path, PathBuf::from("/Users/alice/clickspeak"));
        assert_eq!(project.source, LocationSource::Discovered);
    }

    #[test]
    fn relative_overrides_resolve_against_startup_directory() {
        let profile = AppProfile::clickspeak();
        let ctx = HostContext {
            runtime_override: Some(PathBuf::from("rt")),
            project_override: Some(PathBuf::from("../src/cs")),
            current_dir: Some(PathBuf::from("/Users/alice/tmp")),
            ..ctx_with_home("/Users/alice")
        };
        let loc = probe(&profile, &ctx, |_| false).unwrap();
        assert_eq!(loc.runtime.path, PathBuf::from("/Users/alice/tmp/rt"));
        assert!(loc.runtime.path.is_absolute());
        let project = loc.project.unwrap();
        assert_eq!(project.path, PathBuf::from("/Users/alice/tmp/../src/cs"));
        assert!(project.path.is_absolute());
    }

    #[test]
    fn relative_runtime_override_without_startup_directory_fails() {
        let profile = AppProfile::clickspeak();
        let ctx = HostContext {
            runtime_override: Some(PathBuf::from("rt")),
            ..ctx_with_home("/Users/alice")
        };
        let err = probe(&profile, &ctx, |_| true).unwrap_err();
        assert!(matches!(err, LaunchError::Configuration(_)));
    }

    #[test]
    fn relative_project_override_without_startup_directory_is_dropped() {
        let profile = AppProfile::clickspeak();
        let ctx = HostContext {
            project_override: Some(PathBuf::from("cs")),
            ..ctx_with_home("/Users/alice")
        };
        assert!(probe(&profile, &ctx, |_| true).unwrap().project.is_none());
    }

    #[test]
    fn probing_is_deterministic() {
        let profile = AppProfile::clickspeak();
        let ctx = ctx_with_home("/Users/alice");
        let fs = fs_with(&["/Users/alice/Workspace/clickspeak/pyproject.toml"]);
        let first = probe(&profile, &ctx, &fs).unwrap();
        let second = probe(&profile, &ctx, &fs).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn probe_against_real_directories() {
        let home = tempfile::tempdir().unwrap();
        let project = home.path().join("Documents/clickspeak");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("pyproject.toml"), "[project]\n").unwrap();

        let profile = AppProfile::clickspeak();
        let ctx = HostContext {
            home: Some(home.path().to_path_buf()),
            ..HostContext::default()
        };
        let loc = probe(&profile, &ctx, Path::exists).unwrap();
        assert_eq!(loc.project.unwrap().path, project);
    }
}
