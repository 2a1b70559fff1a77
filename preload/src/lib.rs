//! Entry points of the preloaded library
//!
//! `pflog_init` runs from the loader's constructor list before the host's
//! `main`; the exported `execve` shadows the C runtime's symbol for every
//! caller that resolves it dynamically.
//!
//! Only this crate is built as the injected `cdylib`. The launcher links
//! the `pflog` crate alone, so it never filters itself.

#![cfg(any(target_os = "linux", target_os = "macos"))]

use std::sync::OnceLock;

use libc::{c_char, c_int};
use nix::errno::Errno;

use pflog::config::FilterConfig;
use pflog::diagnostics::with_dispatch;
use pflog::interceptor::{set_errno, Interceptor, LifecycleState};
use pflog::platform::NativePlatform;
use pflog::streams::ProcessStreams;

static INTERCEPTOR: OnceLock<Interceptor> = OnceLock::new();

#[ctor::ctor]
fn pflog_init() {
    with_dispatch(|| {
        let interceptor =
            Interceptor::initialize(&NativePlatform, &FilterConfig::from_env(), &ProcessStreams);
        if interceptor.state() == LifecycleState::Degraded {
            tracing::debug!("exec interception disabled");
        }
        if INTERCEPTOR.set(interceptor).is_err() {
            tracing::debug!("interceptor already initialized");
        }
    });
}

/// Interposed `execve(2)`
///
/// # Safety
///
/// Same contract as the C runtime's `execve`.
#[no_mangle]
pub unsafe extern "C" fn execve(
    path: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> c_int {
    match INTERCEPTOR.get() {
        // SAFETY: arguments are forwarded from our own caller unchanged.
        Some(interceptor) => {
            with_dispatch(|| unsafe { interceptor.execve(&ProcessStreams, path, argv, envp) })
        }
        // Called before the constructor ran: behave as degraded.
        None => {
            set_errno(Errno::ENOSYS);
            -1
        }
    }
}
