use crate::{EXIT_FAILURE, EXIT_SUCCESS};
use clickspeak_host::{
    compose_environment, format_missing, inspect_runtime, probe, AppProfile, HostContext,
    LaunchIdentity, LocationSource, Locations,
};
use console::Style;
use serde::Serialize;
use std::path::Path;

pub fn run(
    profile: &AppProfile,
    ctx: &HostContext,
    json_output: bool,
    show_plan: bool,
) -> Result<u8, String> {
    let report = evaluate(profile, ctx, show_plan);
    print_report(profile, &report, json_output)?;
    Ok(if report.healthy {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub healthy: bool,
    pub checks: Vec<Check>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<serde_json::Value>,
    #[serde(skip)]
    pub remedy: Option<String>,
}

/// Run every check against the real filesystem. Never embeds the runtime.
pub fn evaluate(profile: &AppProfile, ctx: &HostContext, with_plan: bool) -> Report {
    let mut checks = Vec::new();
    let mut healthy = true;
    let mut remedy = None;
    let mut plan = None;

    match &ctx.home {
        Some(home) => checks.push(Check::pass(
            "home",
            &format!("Home directory: {}", home.display()),
        )),
        None if ctx.runtime_override.is_some() => checks.push(Check::warn(
            "home",
            "HOME is not set (runtime override in use, project discovery disabled)",
        )),
        None => checks.push(Check::fail("home", "HOME is not set")),
    }

    match probe(profile, ctx, Path::exists) {
        Ok(locations) => {
            check_runtime(profile, &locations, &mut checks, &mut healthy, &mut remedy);
            check_project(profile, &locations, &mut checks);
            if with_plan {
                plan = Some(launch_plan(profile, ctx, &locations));
            }
        }
        Err(e) => {
            healthy = false;
            checks.push(Check::fail(
                "runtime_dir",
                &format!("Cannot resolve runtime directory: {e}"),
            ));
        }
    }

    Report {
        healthy,
        checks,
        plan,
        remedy,
    }
}

fn check_runtime(
    profile: &AppProfile,
    locations: &Locations,
    checks: &mut Vec<Check>,
    healthy: &mut bool,
    remedy: &mut Option<String>,
) {
    let runtime = &locations.runtime;
    checks.push(Check::pass(
        "runtime_dir",
        &format!(
            "Runtime directory ({}): {}",
            source_label(runtime.source),
            runtime.path.display()
        ),
    ));

    let missing = inspect_runtime(profile, &runtime.path);
    if missing.is_empty() {
        checks.push(Check::pass("runtime_tree", "Runtime installation complete"));
        return;
    }
    for m in &missing {
        let message = format!("Missing {} at {} ({})", m.name, m.path.display(), m.purpose);
        if m.fatal {
            *healthy = false;
            checks.push(Check::fail("runtime_tree", &message));
        } else {
            checks.push(Check::warn("runtime_tree", &message));
        }
    }
    *remedy = Some(format_missing(profile, &missing));
}

fn check_project(profile: &AppProfile, locations: &Locations, checks: &mut Vec<Check>) {
    match &locations.project {
        Some(project) => {
            checks.push(Check::info(
                "project_dir",
                &format!(
                    "Project directory ({}): {}",
                    source_label(project.source),
                    project.path.display()
                ),
            ));
            if !project.path.join(profile.project_manifest).exists() {
                checks.push(Check::warn(
                    "project_manifest",
                    &format!(
                        "Project override has no {}; it is used anyway",
                        profile.project_manifest
                    ),
                ));
            }
        }
        None => checks.push(Check::info(
            "project_dir",
            "No development project found; the runtime's installed packages are used",
        )),
    }
}

fn launch_plan(profile: &AppProfile, ctx: &HostContext, locations: &Locations) -> serde_json::Value {
    let identity = LaunchIdentity::resolve(
        profile,
        &locations.runtime.path,
        ctx.current_exe.as_deref(),
    );
    match compose_environment(profile, locations, &identity, ctx.inherited_path.as_deref()) {
        Ok(env) => serde_json::json!({
            "identity": identity,
            "environment": env
                .vars
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::from(v.to_string_lossy())))
                .collect::<serde_json::Map<_, _>>(),
            "module_search_path": env
                .module_search_path
                .iter()
                .map(|p| p.to_string_lossy())
                .collect::<Vec<_>>(),
            "working_dir": env.working_dir.as_ref().map(|p| p.to_string_lossy()),
            "argv0": profile.display_name,
            "entry_point": profile.entry_point.statement(),
        }),
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    }
}

fn source_label(source: LocationSource) -> &'static str {
    match source {
        LocationSource::Override => "override",
        LocationSource::Discovered => "discovered",
        LocationSource::Default => "default",
    }
}

fn print_report(profile: &AppProfile, report: &Report, json_output: bool) -> Result<(), String> {
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(report).map_err(|e| e.to_string())?
        );
        return Ok(());
    }

    println!("{} Doctor\n", profile.display_name);
    for check in &report.checks {
        let icon = match check.status {
            "pass" => Style::new().green().apply_to("✓"),
            "fail" => Style::new().red().apply_to("✗"),
            "warn" => Style::new().yellow().apply_to("⚠"),
            _ => Style::new().dim().apply_to("ℹ"),
        };
        println!("  {icon} {}", check.message);
    }
    if let Some(plan) = &report.plan {
        println!(
            "\nLaunch plan:\n{}",
            serde_json::to_string_pretty(plan).map_err(|e| e.to_string())?
        );
    }
    println!();
    if report.healthy {
        println!("All checks passed.");
    } else {
        if let Some(remedy) = &report.remedy {
            println!("{remedy}\n");
        }
        println!("Some checks failed. See above for details.");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub status: &'static str,
    pub message: String,
}

impl Check {
    fn pass(name: &'static str, message: &str) -> Self {
        Self::new(name, "pass", message)
    }

    fn fail(name: &'static str, message: &str) -> Self {
        Self::new(name, "fail", message)
    }

    fn warn(name: &'static str, message: &str) -> Self {
        Self::new(name, "warn", message)
    }

    fn info(name: &'static str, message: &str) -> Self {
        Self::new(name, "info", message)
    }

    fn new(name: &'static str, status: &'static str, message: &str) -> Self {
        Self {
            name,
            status,
            message: message.to_owned(),
        }
    }
}
