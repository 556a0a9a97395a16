//! Pid-level helpers: signals and liveness probes.

#[cfg(unix)]
pub(crate) fn pid_alive(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

#[cfg(unix)]
pub(crate) fn send_sigterm(pid: u32) {
    unsafe {
        libc::kill(pid as i32, libc::SIGTERM);
    }
}

#[cfg(unix)]
pub(crate) fn send_sigkill(pid: u32) {
    unsafe {
        libc::kill(pid as i32, libc::SIGKILL);
    }
}

/// Whether the process behind `pid` still runs the expected program
///
/// Reads `/proc/<pid>/comm` where available. The kernel truncates comm to 15
/// bytes, so the comparison is prefix-based. When the probe itself is
/// unavailable (non-Linux), liveness alone has to do.
pub(crate) fn comm_matches(pid: u32, program: &str) -> bool {
    let expected = program.rsplit('/').next().unwrap_or(program);
    match std::fs::read_to_string(format!("/proc/{}/comm", pid)) {
        Ok(comm) => {
            let comm = comm.trim();
            expected.starts_with(comm) || comm.starts_with(expected)
        }
        Err(_) => true,
    }
}

#[cfg(not(unix))]
pub(crate) fn pid_alive(_pid: u32) -> bool {
    false
}

#[cfg(not(unix))]
pub(crate) fn send_sigterm(_pid: u32) {}

#[cfg(not(unix))]
pub(crate) fn send_sigkill(_pid: u32) {}
