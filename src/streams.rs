//! Stream controller: withdraws the process's stdout/stderr handles

use nix::errno::Errno;

use crate::filter::{MatchResult, StreamKind};

/// Something that can close the two output streams
///
/// The real implementation closes file descriptors of the current process;
/// tests substitute a recorder.
pub trait OutputStreams {
    /// Close one stream. Closing an already closed stream must be harmless.
    fn close(&self, stream: StreamKind);
}

/// The current process's stdout (fd 1) and stderr (fd 2)
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessStreams;

impl OutputStreams for ProcessStreams {
    fn close(&self, stream: StreamKind) {
        // Push out anything the C runtime still buffers for this stream so
        // output written before the decision is not silently dropped.
        // SAFETY: fflush(NULL) flushes all open output streams.
        unsafe {
            libc::fflush(std::ptr::null_mut());
        }

        // SAFETY: closing a standard descriptor has no memory-safety impact.
        if unsafe { libc::close(stream.fd()) } == -1 {
            match Errno::last() {
                Errno::EBADF => {} // already closed
                errno => tracing::debug!(%stream, %errno, "close failed"),
            }
        }
    }
}

/// Close the streams selected by `result`
///
/// Stdout is closed before stderr. `NoMatch` does nothing.
pub fn suppress<S: OutputStreams + ?Sized>(result: MatchResult, streams: &S) {
    for stream in [StreamKind::Stdout, StreamKind::Stderr] {
        if result.suppresses(stream) {
            streams.close(stream);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingStreams;
    use super::*;

    #[test]
    fn test_suppress_no_match_does_nothing() {
        let streams = RecordingStreams::default();
        suppress(MatchResult::NoMatch, &streams);
        assert!(streams.closed.borrow().is_empty());
    }

    #[test]
    fn test_suppress_single_streams() {
        let streams = RecordingStreams::default();
        suppress(MatchResult::StdoutOnly, &streams);
        assert_eq!(*streams.closed.borrow(), vec![StreamKind::Stdout]);

        let streams = RecordingStreams::default();
        suppress(MatchResult::StderrOnly, &streams);
        assert_eq!(*streams.closed.borrow(), vec![StreamKind::Stderr]);
    }

    #[test]
    fn test_suppress_both_closes_stdout_first() {
        let streams = RecordingStreams::default();
        suppress(MatchResult::Both, &streams);
        assert_eq!(
            *streams.closed.borrow(),
            vec![StreamKind::Stdout, StreamKind::Stderr]
        );
    }
}
