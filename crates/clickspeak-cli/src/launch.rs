use crate::{FatalError, EXIT_FAILURE, EXIT_SUCCESS};
use clickspeak_host::{
    check_runtime_installed, compose_environment, probe, rewrite_argv, AppProfile,
    FailureReporter, HostContext, LaunchEnvironment, LaunchIdentity, Locations, ProcessEnv,
};
use clickspeak_runtime::{EmbedError, EmbeddedRuntime, RuntimeConfig};
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, info};

/// Everything resolved before the runtime is touched.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub locations: Locations,
    pub identity: LaunchIdentity,
    pub environment: LaunchEnvironment,
    pub config: RuntimeConfig,
}

/// Probe, validate and compose. Read-only.
pub fn prepare(
    profile: &AppProfile,
    ctx: &HostContext,
    exists: impl Fn(&Path) -> bool,
) -> Result<LaunchPlan, FatalError> {
    let locations = probe(profile, ctx, exists)?;
    check_runtime_installed(profile, &locations.runtime.path)?;

    let identity = LaunchIdentity::resolve(
        profile,
        &locations.runtime.path,
        ctx.current_exe.as_deref(),
    );
    let environment = compose_environment(
        profile,
        &locations,
        &identity,
        ctx.inherited_path.as_deref(),
    )?;
    let config = RuntimeConfig::new(&identity, &environment);

    Ok(LaunchPlan {
        locations,
        identity,
        environment,
        config,
    })
}

/// Apply the plan, embed the runtime and hand control to the application.
pub fn execute(
    profile: &AppProfile,
    plan: &LaunchPlan,
    args: impl IntoIterator<Item = OsString>,
    runtime: &mut dyn EmbeddedRuntime,
    process: &mut dyn ProcessEnv,
) -> Result<(), FatalError> {
    // The runtime reads the environment during its own initialization.
    plan.environment.apply(process);

    info!(backend = runtime.name(), "embedding runtime");
    runtime.initialize(&plan.config)?;

    let argv = rewrite_argv(args, profile.display_name);
    let result = runtime
        .set_argv(&argv)
        .and_then(|()| runtime.run_entry_point(&profile.entry_point));
    runtime.finalize();
    result.map_err(FatalError::from)
}

/// The whole launch. Returns the process exit code.
pub fn run(
    profile: &AppProfile,
    ctx: &HostContext,
    args: impl IntoIterator<Item = OsString>,
    runtime: &mut dyn EmbeddedRuntime,
    process: &mut dyn ProcessEnv,
    reporter: &dyn FailureReporter,
) -> u8 {
    let outcome = prepare(profile, ctx, Path::exists)
        .and_then(|plan| execute(profile, &plan, args, runtime, process));
    match outcome {
        Ok(()) => {
            debug!("application returned cleanly");
            EXIT_SUCCESS
        }
        Err(err) => report_failure(profile, &err, reporter),
    }
}

/// Diagnostics to stderr, the user message (if any) through `reporter`.
pub fn report_failure(profile: &AppProfile, err: &FatalError, reporter: &dyn FailureReporter) -> u8 {
    if let FatalError::Embed(EmbedError::Application { status }) = err {
        // The application reports its own failures.
        info!("application exited with status {status}");
        return EXIT_FAILURE;
    }
    eprintln!("{}: {err}", profile.display_name);
    if let Some(message) = err.user_message(profile) {
        reporter.report(&message);
    }
    EXIT_FAILURE
}
