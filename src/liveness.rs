use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tracing::warn;

/// An external condition gating continued following.
pub trait Liveness: Send + Sync {
    fn is_alive(&self) -> bool;

    fn describe(&self) -> String {
        "watched condition no longer holds".to_string()
    }
}

impl<F> Liveness for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_alive(&self) -> bool {
        self()
    }
}

/// Keeps following only while a process exists.
#[derive(Debug, Clone, Copy)]
pub struct PidWatch {
    pid: i32,
}

impl PidWatch {
    pub fn new(pid: i32) -> Self {
        Self { pid }
    }
}

impl Liveness for PidWatch {
    fn is_alive(&self) -> bool {
        // Signal 0 checks for existence; EPERM still means the process is there.
        match kill(Pid::from_raw(self.pid), None) {
            Ok(()) | Err(Errno::EPERM) => true,
            Err(_) => {
                warn!("Process {} exited", self.pid);
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("process {} exited", self.pid)
    }
}
