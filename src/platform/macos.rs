//! macOS collaborators: `proc_pidpath` and libSystem via `dlopen`

use std::ffi::{c_void, CStr};
use std::ptr::NonNull;

use nix::unistd::getpid;

use super::{DlHandle, Platform};

const LIBC_PATH: &CStr = c"/usr/lib/libSystem.B.dylib";

#[derive(Debug, Clone, Copy, Default)]
pub struct MacPlatform;

impl Platform for MacPlatform {
    type Library = DlHandle;

    fn current_exe_path(&self) -> Option<Vec<u8>> {
        let mut buf = vec![0u8; libc::PROC_PIDPATHINFO_MAXSIZE as usize];
        // SAFETY: buf is writable for its full length.
        let len = unsafe {
            libc::proc_pidpath(
                getpid().as_raw(),
                buf.as_mut_ptr().cast::<c_void>(),
                buf.len() as u32,
            )
        };
        if len <= 0 {
            return None;
        }
        buf.truncate(len as usize);
        Some(buf)
    }

    fn open_runtime_library(&self) -> Option<DlHandle> {
        DlHandle::open(LIBC_PATH)
    }

    fn resolve_symbol(&self, library: &DlHandle, name: &CStr) -> Option<NonNull<c_void>> {
        library.symbol(name)
    }

    fn close_runtime_library(&self, library: DlHandle) {
        library.close();
    }
}
