//! Lifecycle controller
//!
//! Two entry points drive everything else:
//! - [`Interceptor::initialize`] runs once when the library is loaded:
//!   resolve the real `execve`, build the registry, suppress the current
//!   process's own streams if its name is registered.
//! - [`Interceptor::execve`] runs on every intercepted exec: suppress
//!   streams if the target is registered, then delegate to the real
//!   `execve` with the untouched arguments.
//!
//! Failing to resolve the real `execve` leaves the interceptor degraded:
//! every intercepted exec fails with `ENOSYS` and nothing else is called.

use std::ffi::{c_void, CStr};

use libc::{c_char, c_int};
use nix::errno::Errno;
use thiserror::Error;

use crate::config::FilterConfig;
use crate::filter::{short_name, FilterRegistry, MatchResult};
use crate::platform::Platform;
use crate::streams::{suppress, OutputStreams};

/// Signature of the C runtime's `execve`
pub type ExecveFn = unsafe extern "C" fn(
    path: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> c_int;

pub const EXECVE_SYMBOL: &CStr = c"execve";

/// Errors resolving the real `execve`
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Failed to load libc")]
    RuntimeLibraryUnavailable,

    #[error("Failed to load execve from libc")]
    SymbolNotFound,
}

/// Look up the real `execve` through the platform collaborators
///
/// The runtime library handle is released before returning; the C runtime
/// stays mapped for the lifetime of the host process, so the address stays
/// valid.
pub fn resolve_execve<P: Platform + ?Sized>(platform: &P) -> Result<ExecveFn, ResolveError> {
    let library = platform
        .open_runtime_library()
        .ok_or(ResolveError::RuntimeLibraryUnavailable)?;
    let symbol = platform.resolve_symbol(&library, EXECVE_SYMBOL);
    platform.close_runtime_library(library);

    let symbol = symbol.ok_or(ResolveError::SymbolNotFound)?;
    // SAFETY: the symbol named "execve" in the C runtime has this signature.
    Ok(unsafe { std::mem::transmute::<*mut c_void, ExecveFn>(symbol.as_ptr()) })
}

/// Whether exec interception can delegate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Ready,
    Degraded,
}

/// Registry snapshot plus the resolved `execve`
#[derive(Debug)]
pub struct Interceptor {
    registry: FilterRegistry,
    real_execve: Option<ExecveFn>,
}

impl Interceptor {
    /// Load-time initialization
    ///
    /// Never fails: resolution problems degrade the interceptor, an unknown
    /// own path simply never matches. Configuration diagnostics are emitted
    /// before the own streams may be closed.
    pub fn initialize<P, S>(platform: &P, config: &FilterConfig, streams: &S) -> Self
    where
        P: Platform + ?Sized,
        S: OutputStreams + ?Sized,
    {
        let real_execve = match resolve_execve(platform) {
            Ok(real) => Some(real),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        };

        let interceptor = Self::with_parts(config.build_registry(), real_execve);

        match platform.current_exe_path() {
            Some(path) => {
                let result = interceptor.classify_path(&path);
                tracing::debug!(
                    exe = %String::from_utf8_lossy(&path),
                    ?result,
                    "classified own executable"
                );
                suppress(result, streams);
            }
            None => tracing::debug!("own executable path unavailable, self never matches"),
        }

        interceptor
    }

    /// Assemble an interceptor from an existing snapshot
    pub fn with_parts(registry: FilterRegistry, real_execve: Option<ExecveFn>) -> Self {
        Self {
            registry,
            real_execve,
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self.real_execve {
            Some(_) => LifecycleState::Ready,
            None => LifecycleState::Degraded,
        }
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    /// Classify the short name of a full executable path
    pub fn classify_path(&self, path: &[u8]) -> MatchResult {
        self.registry.classify(short_name(path))
    }

    /// Intercepted `execve`
    ///
    /// Returns whatever the real `execve` returns (it does not return on
    /// success). In the degraded state returns `-1` with `errno` set to
    /// `ENOSYS`.
    ///
    /// # Safety
    ///
    /// The arguments must satisfy the contract of `execve(2)`: `path` is
    /// null or a NUL-terminated string, `argv`/`envp` are passed through
    /// unread.
    pub unsafe fn execve<S: OutputStreams + ?Sized>(
        &self,
        streams: &S,
        path: *const c_char,
        argv: *const *const c_char,
        envp: *const *const c_char,
    ) -> c_int {
        let Some(real_execve) = self.real_execve else {
            set_errno(Errno::ENOSYS);
            return -1;
        };

        // A null path is left for the real execve to reject (EFAULT).
        if !path.is_null() {
            // SAFETY: non-null path is NUL-terminated per the execve contract.
            let target = unsafe { CStr::from_ptr(path) }.to_bytes();
            let result = self.classify_path(target);
            if result.is_match() {
                tracing::debug!(
                    target = %String::from_utf8_lossy(target),
                    ?result,
                    "suppressing streams before exec"
                );
                suppress(result, streams);
            }
        }

        // SAFETY: forwarding the caller's arguments unchanged.
        unsafe { real_execve(path, argv, envp) }
    }
}

/// Report a failure the way libc functions do
pub fn set_errno(errno: Errno) {
    // SAFETY: the errno location is valid and thread-local.
    #[cfg(target_os = "linux")]
    unsafe {
        *libc::__errno_location() = errno as c_int;
    }
    #[cfg(target_os = "macos")]
    unsafe {
        *libc::__error() = errno as c_int;
    }
}
