//! Platform collaborators
//!
//! The lifecycle controller needs two things the operating system provides:
//! the path of the current executable and the address of the real `execve`
//! inside the C runtime. Both are reached through [`Platform`].

use std::ffi::{c_void, CStr};
use std::ptr::NonNull;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "linux")]
pub use linux::LinuxPlatform as NativePlatform;
#[cfg(target_os = "macos")]
pub use macos::MacPlatform as NativePlatform;

/// Narrow interface to the OS services used at load time
pub trait Platform {
    /// Handle to an opened C runtime library
    type Library;

    /// Path of the current process's executable, if it can be determined
    fn current_exe_path(&self) -> Option<Vec<u8>>;

    fn open_runtime_library(&self) -> Option<Self::Library>;

    fn resolve_symbol(&self, library: &Self::Library, name: &CStr) -> Option<NonNull<c_void>>;

    fn close_runtime_library(&self, library: Self::Library);
}

/// A `dlopen` handle
#[cfg(any(target_os = "linux", target_os = "macos"))]
#[derive(Debug)]
pub struct DlHandle(NonNull<c_void>);

#[cfg(any(target_os = "linux", target_os = "macos"))]
impl DlHandle {
    /// `dlopen(path, RTLD_LAZY)`
    pub(crate) fn open(path: &CStr) -> Option<Self> {
        // SAFETY: path is a valid NUL-terminated string.
        let handle = unsafe { libc::dlopen(path.as_ptr(), libc::RTLD_LAZY) };
        NonNull::new(handle).map(Self)
    }

    pub(crate) fn symbol(&self, name: &CStr) -> Option<NonNull<c_void>> {
        // SAFETY: the handle came from a successful dlopen and is still open.
        NonNull::new(unsafe { libc::dlsym(self.0.as_ptr(), name.as_ptr()) })
    }

    pub(crate) fn close(self) {
        // SAFETY: the handle is consumed, so it is closed exactly once.
        if unsafe { libc::dlclose(self.0.as_ptr()) } != 0 {
            tracing::debug!("dlclose of C runtime failed");
        }
    }
}
