use crate::backend::{EmbeddedRuntime, RuntimeConfig};
use crate::EmbedError;
use clickspeak_host::EntryPoint;
use pyo3::exceptions::PySystemExit;
use pyo3::ffi;
use pyo3::prelude::*;
use pyo3::types::PyList;
use std::ffi::{c_int, CStr, CString, OsString};
use std::mem::MaybeUninit;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Set by the first initialization attempt; CPython cannot be embedded twice.
static EMBEDDED: AtomicBool = AtomicBool::new(false);

/// CPython loaded into the launcher process.
///
/// The module search path is not passed through `PyConfig`: setting it there
/// disables CPython's own prefix calculation. CPython reads `PYTHONPATH` from
/// the environment the launcher has already composed, and derives stdlib and
/// site-packages from `executable` and the `pyvenv.cfg` next to it.
pub struct PythonRuntime {
    /// Main thread state, saved after initialization so the GIL is free for
    /// `Python::attach`.
    main_thread: Option<NonNull<ffi::PyThreadState>>,
}

impl PythonRuntime {
    pub fn new() -> Self {
        Self { main_thread: None }
    }

    fn require_initialized(&self) -> Result<(), EmbedError> {
        if self.main_thread.is_some() {
            Ok(())
        } else {
            Err(EmbedError::NotInitialized)
        }
    }
}

impl Default for PythonRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddedRuntime for PythonRuntime {
    fn name(&self) -> &'static str {
        "python"
    }

    #[allow(unsafe_code)]
    fn initialize(&mut self, config: &RuntimeConfig) -> Result<(), EmbedError> {
        if EMBEDDED.swap(true, Ordering::SeqCst) {
            return Err(EmbedError::AlreadyInitialized);
        }
        let executable = c_path(&config.executable)?;
        debug!(executable = %config.executable.display(), "initializing embedded Python");

        let mut py_config = MaybeUninit::<ffi::PyConfig>::uninit();
        let cfg = py_config.as_mut_ptr();

        // SAFETY: PyConfig_InitPythonConfig fully initializes the struct behind
        // `cfg` before any field is touched. `executable` outlives the
        // SetBytesString call, which copies it. PyConfig_Clear is called exactly
        // once on every path after initialization of the struct. The thread
        // state returned by PyEval_SaveThread belongs to this thread and is only
        // restored by `finalize`.
        unsafe {
            ffi::PyConfig_InitPythonConfig(cfg);

            let status = ffi::PyConfig_SetBytesString(
                cfg,
                &raw mut (*cfg).executable,
                executable.as_ptr(),
            );
            if let Err(e) = check_status(status) {
                ffi::PyConfig_Clear(cfg);
                return Err(e);
            }
            (*cfg).parse_argv = c_int::from(config.parse_argv);
            (*cfg).site_import = c_int::from(config.site_import);

            let status = ffi::Py_InitializeFromConfig(cfg);
            ffi::PyConfig_Clear(cfg);
            check_status(status)?;

            self.main_thread = NonNull::new(ffi::PyEval_SaveThread());
        }

        info!("embedded Python initialized");
        Ok(())
    }

    fn set_argv(&mut self, argv: &[OsString]) -> Result<(), EmbedError> {
        self.require_initialized()?;
        Python::attach(|py| -> PyResult<()> {
            // OS strings are decoded with the filesystem encoding, as CPython
            // does for its own argv.
            let list = PyList::new(py, argv.iter().map(OsString::as_os_str))?;
            py.import("sys")?.setattr("argv", list)
        })
        .map_err(|e| EmbedError::Setup(format!("cannot set sys.argv: {e}")))
    }

    fn run_entry_point(&mut self, entry: &EntryPoint) -> Result<(), EmbedError> {
        self.require_initialized()?;
        let code = CString::new(entry.statement())
            .map_err(|e| EmbedError::Setup(format!("invalid entry point: {e}")))?;

        info!("starting {}:{}", entry.module, entry.function);
        match Python::attach(|py| run_status(py, &code)) {
            0 => Ok(()),
            status => Err(EmbedError::Application { status }),
        }
    }

    #[allow(unsafe_code)]
    fn finalize(&mut self) {
        if let Some(thread) = self.main_thread.take() {
            // SAFETY: `thread` came from PyEval_SaveThread on this thread and
            // the GIL is not held here, so restoring it is valid. Finalization
            // happens once because the state was taken out of `self`.
            let rc = unsafe {
                ffi::PyEval_RestoreThread(thread.as_ptr());
                ffi::Py_FinalizeEx()
            };
            if rc < 0 {
                warn!("Python finalization reported an error");
            } else {
                debug!("embedded Python finalized");
            }
        }
    }
}

impl Drop for PythonRuntime {
    fn drop(&mut self) {
        self.finalize();
    }
}

#[allow(unsafe_code)]
fn check_status(status: ffi::PyStatus) -> Result<(), EmbedError> {
    let message = if status.err_msg.is_null() {
        "(unknown error)".to_owned()
    } else {
        // SAFETY: a non-null err_msg is a static NUL-terminated string owned
        // by CPython.
        unsafe { CStr::from_ptr(status.err_msg) }
            .to_string_lossy()
            .into_owned()
    };
    // SAFETY: PyStatus_Exception only inspects the status value.
    if unsafe { ffi::PyStatus_Exception(status) } == 0 {
        Ok(())
    } else {
        Err(EmbedError::Init(message))
    }
}

/// Run `code` in `__main__` and map the outcome to a process status.
/// Uncaught exceptions print their traceback to stderr.
fn run_status(py: Python<'_>, code: &CStr) -> i32 {
    match py.run(code, None, None) {
        Ok(()) => 0,
        Err(err) if err.is_instance_of::<PySystemExit>(py) => system_exit_status(py, &err),
        Err(err) => {
            err.print(py);
            1
        }
    }
}

/// Exit status of a `SystemExit`, following CPython: `None` is success, an
/// integer is used as is, anything else is printed and maps to 1.
fn system_exit_status(py: Python<'_>, err: &PyErr) -> i32 {
    let Ok(code) = err.value(py).getattr("code") else {
        return 1;
    };
    if code.is_none() {
        return 0;
    }
    if let Ok(status) = code.extract::<i32>() {
        return status;
    }
    eprintln!("{code}");
    1
}

fn c_path(path: &Path) -> Result<CString, EmbedError> {
    #[cfg(unix)]
    let bytes = {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    };
    #[cfg(not(unix))]
    let bytes = path.to_string_lossy().into_owned().into_bytes();

    CString::new(bytes)
        .map_err(|_| EmbedError::Init(format!("path contains a NUL byte: {}", path.display())))
}
