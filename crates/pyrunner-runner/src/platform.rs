//! Forced termination of a child process.

use std::process::Child;

/// Kill `child`, which must not have been reaped yet.
///
/// An unreaped child keeps its pid reserved even after it exits, so the
/// signal cannot land on an unrelated process. On Unix this sends `SIGKILL`;
/// on Windows it calls `TerminateProcess`. Failures (for example a child that
/// already exited) are ignored: the caller observes the exit through its own
/// wait.
pub(crate) fn terminate_process(child: &Child) {
    let pid = child.id();

    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(pid) else {
            tracing::warn!(pid, "pid out of range, cannot signal process");
            return;
        };
        if let Err(errno) = kill(Pid::from_raw(raw), Signal::SIGKILL) {
            tracing::debug!(pid, %errno, "SIGKILL not delivered");
        }
    }

    #[cfg(windows)]
    {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{OpenProcess, PROCESS_TERMINATE, TerminateProcess};

        // SAFETY: the handle is checked by `OpenProcess` and closed exactly once.
        unsafe {
            match OpenProcess(PROCESS_TERMINATE, false, pid) {
                Ok(handle) => {
                    if let Err(e) = TerminateProcess(handle, 1) {
                        tracing::debug!(pid, error = %e, "TerminateProcess failed");
                    }
                    let _ = CloseHandle(handle);
                }
                Err(e) => tracing::debug!(pid, error = %e, "OpenProcess failed"),
            }
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = pid;
    }
}
