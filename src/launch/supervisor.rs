//! Child process supervision
//!
//! The supervisor owns the single server process. It polls for exit and,
//! whenever the [`ShutdownToken`] count rises, forwards the matching signal
//! to the server's pid.

use std::io;
use std::process::{Child, ExitStatus};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::signal::{ShutdownToken, SignalAction};

/// How often the child is polled for exit
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait for `child` to exit, forwarding signals recorded on `token`.
pub fn supervise(
    child: &mut Child,
    token: &ShutdownToken,
    poll: Duration,
) -> io::Result<ExitStatus> {
    let mut forwarded = 0u8;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }

        let count = token.signal_count();
        if count > forwarded {
            forwarded = count;
            forward(child, SignalAction::for_count(count));
        }

        thread::sleep(poll);
    }
}

/// Exit code to report for a finished child. A child killed by signal `n`
/// maps to `128 + n`, like a shell would report it.
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(unix)]
fn forward(child: &mut Child, action: SignalAction) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let signal = match action {
        SignalAction::Interrupt => Signal::SIGINT,
        SignalAction::Terminate => Signal::SIGTERM,
        SignalAction::Kill => Signal::SIGKILL,
    };

    let pid = Pid::from_raw(child.id() as i32);
    debug!("forwarding {} to server pid {}", signal, pid);
    if let Err(err) = kill(pid, signal) {
        warn!("failed to forward {} to server: {}", signal, err);
    }
}

#[cfg(not(unix))]
fn forward(child: &mut Child, action: SignalAction) {
    debug!("stopping server ({:?})", action);
    if let Err(err) = child.kill() {
        warn!("failed to stop server: {}", err);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Command;
    use std::time::Instant;

    fn sh(script: &str) -> Child {
        Command::new("sh")
            .arg("-c")
            .arg(script)
            .spawn()
            .unwrap()
    }

    #[test]
    fn test_propagates_exit_code() {
        let mut child = sh("exit 3");
        let status = supervise(&mut child, &ShutdownToken::new(), Duration::from_millis(10)).unwrap();
        assert_eq!(exit_code(&status), 3);
    }

    #[test]
    fn test_zero_exit() {
        let mut child = sh("true");
        let status = supervise(&mut child, &ShutdownToken::new(), Duration::from_millis(10)).unwrap();
        assert_eq!(exit_code(&status), 0);
    }

    #[test]
    fn test_forwards_interrupt() {
        let mut child = sh("exec sleep 30");
        let token = ShutdownToken::new();
        let trigger = token.clone();
        // Keep escalating in case SIGINT is ignored in this environment.
        thread::spawn(move || {
            for _ in 0..3 {
                thread::sleep(Duration::from_millis(200));
                trigger.trigger();
                thread::sleep(Duration::from_secs(2));
            }
        });

        let start = Instant::now();
        let status = supervise(&mut child, &token, Duration::from_millis(10)).unwrap();

        assert!(start.elapsed() < Duration::from_secs(20));
        assert!(!status.success());
        assert!([128 + 2, 128 + 15, 128 + 9].contains(&exit_code(&status)));
    }

    #[test]
    fn test_escalates_to_kill() {
        // Ignores SIGINT and SIGTERM, so only SIGKILL stops it.
        let mut child = sh("trap '' INT TERM; while :; do sleep 1; done");
        let token = ShutdownToken::new();
        for _ in 0..3 {
            token.trigger();
        }

        let status = supervise(&mut child, &token, Duration::from_millis(10)).unwrap();
        assert_eq!(exit_code(&status), 128 + 9);
    }
}
