//! Exported entry points

use crate::callbacks::{CallbackAstBuilder, JtravAstCallbacks};
use crate::error::{HostError, JtravStatus};
use jtrav_core::config::RuntimeConfig;
use jtrav_core::frontend::SourceFrontEnd;
use jtrav_core::logging;
use jtrav_core::pipeline::{self, PipelineConfig};
use jtrav_core::session::Session;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

struct HostState {
    session: Session,
    front_end: SourceFrontEnd,
    config: PipelineConfig,
}

impl HostState {
    fn new(runtime: RuntimeConfig) -> Self {
        Self {
            session: Session::new(),
            front_end: SourceFrontEnd::new(),
            config: PipelineConfig {
                front_end: runtime.front_end,
                ..Default::default()
            },
        }
    }
}

static HOST: OnceLock<Mutex<Option<HostState>>> = OnceLock::new();

fn lock_host() -> MutexGuard<'static, Option<HostState>> {
    HOST.get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn report(error: &HostError) -> c_int {
    jtrav_core::log_error!(error.error_code(), &error.to_string());
    error.status().into()
}

unsafe fn c_str_arg(ptr: *const c_char, argument: &'static str) -> Result<String, HostError> {
    if ptr.is_null() {
        return Err(HostError::NullPointer { argument });
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(str::to_string)
        .map_err(|_| HostError::InvalidUtf8 {
            argument: argument.to_string(),
        })
}

unsafe fn collect_args(argc: c_int, argv: *const *const c_char) -> Result<Vec<String>, HostError> {
    let count = usize::try_from(argc).unwrap_or(0);
    if count > 0 && argv.is_null() {
        return Err(HostError::NullPointer { argument: "argv" });
    }
    (0..count)
        .map(|i| c_str_arg(*argv.add(i), "argv element"))
        .collect()
}

/// Create the process-wide session and start logging
///
/// Calling it again keeps the existing session.
#[no_mangle]
pub extern "C" fn jtrav_init() -> c_int {
    let runtime = RuntimeConfig::from_env();

    if !logging::is_initialized() {
        let _ = logging::config::init_runtime_preferences(runtime.logging.clone());
        if let Err(message) = logging::init_global_logging() {
            if !logging::is_initialized() {
                return report(&HostError::Logging { message });
            }
        }
    }

    let mut host = lock_host();
    if host.is_none() {
        *host = Some(HostState::new(runtime));
    }
    JtravStatus::Success.into()
}

/// Run one batch with the given front-end arguments
///
/// Returns the batch exit status: 0 on success, 1 on any fatal condition,
/// or a [`JtravStatus`] code when the call itself is invalid.
///
/// # Safety
/// `argv` must point to `argc` valid NUL-terminated strings and `callbacks`
/// to a valid table whose function pointers accept its `user_data`.
#[no_mangle]
pub unsafe extern "C" fn jtrav_main(
    argc: c_int,
    argv: *const *const c_char,
    callbacks: *const JtravAstCallbacks,
) -> c_int {
    let args = match collect_args(argc, argv) {
        Ok(args) => args,
        Err(error) => return report(&error),
    };
    if callbacks.is_null() {
        return report(&HostError::NullPointer {
            argument: "callbacks",
        });
    }

    let mut host = lock_host();
    let Some(state) = host.as_mut() else {
        return report(&HostError::NotInitialized);
    };

    let mut builder = CallbackAstBuilder::new(*callbacks);
    match pipeline::run(
        &mut state.front_end,
        &mut builder,
        &mut state.session,
        &args,
        &state.config,
    ) {
        Ok(outcome) => {
            println!("{}", outcome.batch_report());
            outcome.exit_code()
        }
        Err(error) => {
            eprintln!("{}", error);
            logging::print_cargo_style_summary();
            error.exit_code()
        }
    }
}

/// 1 when any batch hit a translation or linkage failure, 0 otherwise, -1 before init
#[no_mangle]
pub extern "C" fn jtrav_get_error() -> c_int {
    match lock_host().as_ref() {
        Some(state) => c_int::from(state.session.has_error()),
        None => -1,
    }
}

/// Whether `class_name` in `package_name` clashes with what `file_name` declares or imports
///
/// Returns 1 or 0, or -1 for invalid arguments or before init.
///
/// # Safety
/// All three pointers must be valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn jtrav_has_conflicts(
    file_name: *const c_char,
    package_name: *const c_char,
    class_name: *const c_char,
) -> c_int {
    let query = c_str_arg(file_name, "file_name").and_then(|file| {
        Ok((
            file,
            c_str_arg(package_name, "package_name")?,
            c_str_arg(class_name, "class_name")?,
        ))
    });
    let (file, package, class) = match query {
        Ok(query) => query,
        Err(error) => {
            report(&error);
            return -1;
        }
    };

    match lock_host().as_ref() {
        Some(state) => c_int::from(state.session.has_conflict(&file, &package, &class)),
        None => -1,
    }
}

/// Drop the session; a later `jtrav_init` starts a fresh one
#[no_mangle]
pub extern "C" fn jtrav_shutdown() -> c_int {
    lock_host().take();
    JtravStatus::Success.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::fs;
    use std::os::raw::c_void;
    use std::ptr;
    use tempfile::TempDir;

    static TEST_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn serial() -> MutexGuard<'static, ()> {
        TEST_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[derive(Default)]
    struct Host {
        units: Vec<String>,
        batches: usize,
    }

    unsafe extern "C" fn begin(_user_data: *mut c_void) -> c_int {
        0
    }

    unsafe extern "C" fn end(user_data: *mut c_void) -> c_int {
        (*(user_data as *mut Host)).batches += 1;
        0
    }

    unsafe extern "C" fn enter(
        user_data: *mut c_void,
        kind: *const c_char,
        name: *const c_char,
        _detail: *const c_char,
        _line: c_int,
    ) -> c_int {
        if CStr::from_ptr(kind).to_bytes() == b"compilation_unit" {
            let name = CStr::from_ptr(name).to_string_lossy().into_owned();
            (*(user_data as *mut Host)).units.push(name);
        }
        0
    }

    unsafe extern "C" fn leave(_user_data: *mut c_void, _kind: *const c_char) -> c_int {
        0
    }

    fn callbacks(host: &mut Host) -> JtravAstCallbacks {
        JtravAstCallbacks {
            user_data: host as *mut Host as *mut c_void,
            begin_batch: Some(begin),
            end_batch: Some(end),
            enter_node: Some(enter),
            leave_node: Some(leave),
            ..Default::default()
        }
    }

    fn call_main(args: &[String], table: &JtravAstCallbacks) -> c_int {
        let owned: Vec<CString> = args.iter().map(|a| CString::new(a.as_str()).unwrap()).collect();
        let argv: Vec<*const c_char> = owned.iter().map(|c| c.as_ptr()).collect();
        unsafe { jtrav_main(argv.len() as c_int, argv.as_ptr(), table) }
    }

    fn write(dir: &TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_calls_before_init_are_rejected() {
        let _guard = serial();
        jtrav_shutdown();

        let mut host = Host::default();
        assert_eq!(
            call_main(&["A.java".to_string()], &callbacks(&mut host)),
            JtravStatus::NotInitialized as c_int
        );
        assert_eq!(jtrav_get_error(), -1);
    }

    #[test]
    fn test_batches_share_the_session() {
        let _guard = serial();
        jtrav_shutdown();
        assert_eq!(jtrav_init(), 0);

        let dir = TempDir::new().unwrap();
        let a = write(&dir, "A.java", "package p; class C { void m() {} }");
        let b = write(&dir, "B.java", "class B {}");
        let mut host = Host::default();
        let table = callbacks(&mut host);

        assert_eq!(call_main(&[a.clone(), b.clone()], &table), 0);
        assert_eq!(call_main(&[a.clone(), b.clone()], &table), 0);
        assert_eq!(jtrav_get_error(), 0);

        let file = CString::new(a.as_str()).unwrap();
        let package = CString::new("q").unwrap();
        let class = CString::new("C").unwrap();
        let conflict =
            unsafe { jtrav_has_conflicts(file.as_ptr(), package.as_ptr(), class.as_ptr()) };
        assert_eq!(conflict, 1);

        jtrav_shutdown();
        assert_eq!(host.units, vec![a, b]);
        assert_eq!(host.batches, 2);
    }

    #[test]
    fn test_invalid_arguments() {
        let _guard = serial();
        jtrav_shutdown();
        assert_eq!(jtrav_init(), 0);

        let status = unsafe { jtrav_main(1, ptr::null(), ptr::null()) };
        assert_eq!(status, JtravStatus::InvalidArgument as c_int);

        let dir = TempDir::new().unwrap();
        let a = write(&dir, "A.java", "class A {}");
        let owned = CString::new(a).unwrap();
        let argv = [owned.as_ptr()];
        let status = unsafe { jtrav_main(1, argv.as_ptr(), ptr::null()) };
        assert_eq!(status, JtravStatus::InvalidArgument as c_int);

        let conflict = unsafe { jtrav_has_conflicts(ptr::null(), ptr::null(), ptr::null()) };
        assert_eq!(conflict, -1);
        jtrav_shutdown();
    }

    #[test]
    fn test_front_end_errors_exit_with_one() {
        let _guard = serial();
        jtrav_shutdown();
        assert_eq!(jtrav_init(), 0);

        let dir = TempDir::new().unwrap();
        let a = write(&dir, "A.java", "class A { void m( }");
        let mut host = Host::default();

        assert_eq!(call_main(&[a], &callbacks(&mut host)), 1);
        assert!(host.units.is_empty());
        assert_eq!(jtrav_get_error(), 0);
        jtrav_shutdown();
    }

    #[test]
    fn test_missing_callbacks_fail_the_batch() {
        let _guard = serial();
        jtrav_shutdown();
        assert_eq!(jtrav_init(), 0);

        let dir = TempDir::new().unwrap();
        let a = write(&dir, "A.java", "class A {}");

        assert_eq!(call_main(&[a], &JtravAstCallbacks::default()), 1);
        jtrav_shutdown();
    }
}
