//! Child process helpers shared by pipeline consumers.

use std::io;
use std::os::fd::RawFd;
use std::path::PathBuf;

/// Returns `true` when a process with `pid` appears alive.
pub fn pid_is_alive(pid: u32) -> bool {
	if pid == 0 {
		return false;
	}

	if PathBuf::from("/proc").join(pid.to_string()).exists() {
		return true;
	}

	let Ok(pid) = libc::pid_t::try_from(pid) else {
		return false;
	};
	// SAFETY: signal 0 performs only the existence and permission check.
	unsafe { libc::kill(pid, 0) == 0 }
}

/// Sends SIGINT to `pid`, asking a `gst-launch-1.0` child to send EOS and exit.
pub fn interrupt(pid: u32) -> io::Result<()> {
	let pid = libc::pid_t::try_from(pid).map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
	// SAFETY: plain syscall with no memory arguments.
	if unsafe { libc::kill(pid, libc::SIGINT) } == 0 {
		Ok(())
	} else {
		Err(io::Error::last_os_error())
	}
}

/// Clears `FD_CLOEXEC` on `fd` so it survives `exec`.
///
/// Meant to run in a `pre_exec` hook, where only async-signal-safe calls are
/// allowed; `fcntl` is.
pub fn inherit_fd(fd: RawFd) -> io::Result<()> {
	// SAFETY: fcntl on a descriptor number; failure is reported through errno.
	let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
	if flags < 0 {
		return Err(io::Error::last_os_error());
	}
	// SAFETY: as above.
	if unsafe { libc::fcntl(fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC) } < 0 {
		return Err(io::Error::last_os_error());
	}
	Ok(())
}
