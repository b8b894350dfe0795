use crate::AppProfile;
use std::process::{Command, Stdio};
use tracing::debug;

/// Surfaces a fatal, user-facing message. Implementations never fail outward.
pub trait FailureReporter {
    fn report(&self, message: &str);
}

/// Shows a blocking `osascript` dialog and waits for it to be dismissed.
pub struct DialogReporter {
    title: String,
    program: String,
}

impl DialogReporter {
    pub fn new(title: &str) -> Self {
        Self::with_program(title, "osascript")
    }

    pub fn with_program(title: &str, program: &str) -> Self {
        Self {
            title: title.to_owned(),
            program: program.to_owned(),
        }
    }
}

impl FailureReporter for DialogReporter {
    fn report(&self, message: &str) {
        let script = dialog_script(&self.title, message);
        // Stdout is discarded: osascript echoes the pressed button there, and
        // stdout belongs to the application.
        let result = Command::new(&self.program)
            .arg("-e")
            .arg(&script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status();
        match result {
            Ok(status) if !status.success() => {
                debug!("{} exited with {status}", self.program);
            }
            Ok(_) => {}
            Err(e) => debug!("cannot show dialog via {}: {e}", self.program),
        }
    }
}

/// Writes the message to stderr. For headless runs.
pub struct StderrReporter {
    title: String,
}

impl StderrReporter {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_owned(),
        }
    }
}

impl FailureReporter for StderrReporter {
    fn report(&self, message: &str) {
        eprintln!("{}: {message}", self.title);
    }
}

/// The dialog reporter, unless `CLICKSPEAK_NO_DIALOG=1`.
pub fn reporter_from_env(profile: &AppProfile) -> Box<dyn FailureReporter> {
    if std::env::var("CLICKSPEAK_NO_DIALOG").as_deref() == Ok("1") {
        Box::new(StderrReporter::new(profile.dialog_title))
    } else {
        Box::new(DialogReporter::new(profile.dialog_title))
    }
}

/// AppleScript source for a single-button dialog.
pub fn dialog_script(title: &str, message: &str) -> String {
    format!(
        "display dialog \"{}\" with title \"{}\" buttons \"OK\" default button \"OK\"",
        escape_applescript(message),
        escape_applescript(title)
    )
}

fn escape_applescript(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}
