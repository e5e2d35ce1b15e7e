use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::EvalError;

pub const DEFAULT_SHELL_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs the body of a `` `...` `` block and returns its output.
pub trait ShellRunner {
    fn run(&self, code: &str) -> Result<String, EvalError>;
}

impl<F> ShellRunner for F
where
    F: Fn(&str) -> Result<String, EvalError>,
{
    fn run(&self, code: &str) -> Result<String, EvalError> {
        self(code)
    }
}

/// Runs shell code as a temporary script.
///
/// Code starting with `#!` is executed directly, anything else through
/// `sh`. The child is killed if it outlives `timeout`. One trailing `\n`
/// and then one trailing `\r` are stripped from its output.
#[derive(Debug, Clone)]
pub struct SystemShell {
    timeout: Duration,
}

impl Default for SystemShell {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL_TIMEOUT)
    }
}

impl SystemShell {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ShellRunner for SystemShell {
    fn run(&self, code: &str) -> Result<String, EvalError> {
        let mut file = tempfile::Builder::new().prefix("snipline-").tempfile()?;
        file.write_all(code.as_bytes())?;
        file.flush()?;
        // Closing the handle before exec avoids "text file busy".
        let path = file.into_temp_path();

        let mut command = if code.starts_with("#!") {
            make_executable(&path)?;
            Command::new(&path)
        } else {
            let mut sh = Command::new("sh");
            sh.arg(&path);
            sh
        };
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                tracing::debug!(timeout = ?self.timeout, "killing shell snippet");
                child.kill()?;
                child.wait()?;
                return Err(EvalError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = collect(stdout);
        if !status.success() {
            return Err(EvalError::NonZeroExit {
                status: status.code().unwrap_or(-1),
                stderr: collect(stderr),
            });
        }

        let mut output = stdout;
        if output.ends_with('\n') {
            output.pop();
        }
        if output.ends_with('\r') {
            output.pop();
        }
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(unix)]
fn make_executable(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn make_executable(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn captures_output_without_final_newline() {
        let out = SystemShell::default().run("echo hello").unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn strips_one_newline_then_one_carriage_return() {
        let out = SystemShell::default().run(r"printf 'a\r\n\n'").unwrap();
        assert_eq!(out, "a\r\n");
        let out = SystemShell::default().run(r"printf 'b\r\n'").unwrap();
        assert_eq!(out, "b");
    }

    #[test]
    fn multi_line_scripts() {
        let out = SystemShell::default()
            .run("x=4\ny=5\necho $((x + y))")
            .unwrap();
        assert_eq!(out, "9");
    }

    #[test]
    fn shebang_scripts_run_directly() {
        let out = SystemShell::default()
            .run("#!/bin/sh\necho direct")
            .unwrap();
        assert_eq!(out, "direct");
    }

    #[test]
    fn slow_scripts_time_out() {
        let shell = SystemShell::new(Duration::from_millis(100));
        let err = shell.run("sleep 5").unwrap_err();
        assert!(matches!(err, EvalError::Timeout(_)));
    }

    #[test]
    fn failing_scripts_report_status() {
        let err = SystemShell::default()
            .run("echo oops >&2; exit 3")
            .unwrap_err();
        match err {
            EvalError::NonZeroExit { status, stderr } => {
                assert_eq!(status, 3);
                assert_eq!(stderr.trim(), "oops");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn closures_are_runners() {
        let runner = |code: &str| Ok::<_, EvalError>(code.to_uppercase());
        assert_eq!(runner.run("abc").unwrap(), "ABC");
    }
}
