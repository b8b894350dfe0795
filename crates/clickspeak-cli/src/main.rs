//! `ClickSpeak`: loads the Python runtime into this process so macOS attributes
//! permission grants to this binary instead of the interpreter.
//!
//! Arguments are never parsed here; they all belong to the application.

use clickspeak_cli::launch;
use clickspeak_host::{reporter_from_env, AppProfile, HostContext, LiveProcess};
use clickspeak_runtime::select_runtime;
use std::process::ExitCode;

fn main() -> ExitCode {
    clickspeak_cli::init_tracing("warn");

    let profile = AppProfile::clickspeak();
    let reporter = reporter_from_env(&profile);

    let backend =
        std::env::var("CLICKSPEAK_EMBED_BACKEND").unwrap_or_else(|_| "python".to_owned());
    let mut runtime = match select_runtime(&backend) {
        Ok(runtime) => runtime,
        Err(e) => {
            return ExitCode::from(launch::report_failure(
                &profile,
                &e.into(),
                reporter.as_ref(),
            ))
        }
    };

    let ctx = HostContext::capture(&profile);
    let code = launch::run(
        &profile,
        &ctx,
        std::env::args_os(),
        runtime.as_mut(),
        &mut LiveProcess,
        reporter.as_ref(),
    );
    ExitCode::from(code)
}
