//! Linux collaborators: `/proc/self/cmdline` and glibc via `dlopen`

use std::ffi::{c_void, CStr};
use std::fs::File;
use std::io::Read;
use std::ptr::NonNull;

use super::{DlHandle, Platform};

/// glibc's runtime soname
const LIBC_SO: &CStr = c"libc.so.6";

const CMDLINE_PATH: &str = "/proc/self/cmdline";

#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxPlatform;

impl Platform for LinuxPlatform {
    type Library = DlHandle;

    /// argv[0] as recorded by the kernel
    ///
    /// `/proc/self/exe` would resolve symlinks, which breaks multi-call
    /// binaries invoked under an alias, so the first NUL-terminated token of
    /// the command line is used instead. Reads at most `PATH_MAX` bytes.
    fn current_exe_path(&self) -> Option<Vec<u8>> {
        let file = File::open(CMDLINE_PATH).ok()?;
        let mut buf = Vec::new();
        file.take(libc::PATH_MAX as u64).read_to_end(&mut buf).ok()?;

        if let Some(end) = buf.iter().position(|&b| b == 0) {
            buf.truncate(end);
        }
        Some(buf)
    }

    fn open_runtime_library(&self) -> Option<DlHandle> {
        DlHandle::open(LIBC_SO)
    }

    fn resolve_symbol(&self, library: &DlHandle, name: &CStr) -> Option<NonNull<c_void>> {
        library.symbol(name)
    }

    fn close_runtime_library(&self, library: DlHandle) {
        library.close();
    }
}
