//! Formatting of generated Go source.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use thiserror::Error;

/// Errors that can occur while formatting generated source.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The formatter program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The formatter rejected the input, usually because it is not valid Go.
    #[error("{0}")]
    Rejected(String),

    /// Formatter output was not valid UTF-8.
    #[error("formatter produced invalid UTF-8")]
    InvalidUtf8,

    /// I/O error talking to the formatter process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns raw generated text into canonical source, or reports why it cannot.
pub trait SourceFormatter {
    fn format(&self, src: &str) -> Result<String, FormatError>;
}

/// Pipes source through a `gofmt` binary.
#[derive(Debug, Clone)]
pub struct Gofmt {
    program: PathBuf,
}

impl Gofmt {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Gofmt {
    fn default() -> Self {
        Self::new("gofmt")
    }
}

impl SourceFormatter for Gofmt {
    fn format(&self, src: &str) -> Result<String, FormatError> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FormatError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // gofmt reads all of stdin before writing anything, so the pipe
        // cannot fill up while we are still writing. The child is reaped
        // even when the write fails.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(src.as_bytes()),
            None => Ok(()),
        };
        let output = child.wait_with_output();
        written?;
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            return Err(FormatError::Rejected(if message.is_empty() {
                format!("{} exited with {}", self.program.display(), output.status)
            } else {
                message.to_string()
            }));
        }
        String::from_utf8(output.stdout).map_err(|_| FormatError::InvalidUtf8)
    }
}

/// Returns source unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl SourceFormatter for Passthrough {
    fn format(&self, src: &str) -> Result<String, FormatError> {
        Ok(src.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough() {
        let src = "package p\n";
        assert_eq!(Passthrough.format(src).unwrap(), src);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let formatter = Gofmt::new("/nonexistent/godeco-test-gofmt");
        let err = formatter.format("package p\n").unwrap_err();
        assert!(matches!(err, FormatError::Spawn { .. }), "{err:?}");
        assert!(err.to_string().contains("godeco-test-gofmt"));
    }

    #[cfg(unix)]
    fn script(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-gofmt");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_rejection_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let formatter = Gofmt::new(script(dir.path(), "cat >/dev/null\nexit 3"));
        match formatter.format("package p\n") {
            Err(FormatError::Rejected(message)) => {
                assert!(message.contains("exited with"), "{message}");
                assert!(message.contains('3'), "{message}");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_formatter_exiting_early_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let formatter = Gofmt::new(script(dir.path(), "exit 0"));
        let src = "// filler\n".repeat(200_000);
        let err = formatter.format(&src).unwrap_err();
        assert!(matches!(err, FormatError::Io(_)), "{err:?}");
    }
}
