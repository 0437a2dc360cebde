//! External process execution
//!
//! [`ProcessRunner`] is the only place where the builder touches the host:
//! it spawns external tools and performs filesystem mutations. In dry-run
//! mode every call is logged and nothing is executed.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, error, info};

use crate::error::{FilesystemError, ProcessError};
use crate::infra::filesystem;

/// A program invocation with an explicit working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl CommandLine {
    /// Create a command line for `program` with no arguments
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Append one argument
    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Run the program from `dir` instead of the current directory
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set an environment variable for the child
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program name
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Arguments after the program name
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Working directory, if one was set
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Extra environment variables
    pub fn get_env(&self) -> &[(String, String)] {
        &self.env
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(ref dir) = self.cwd {
            command.current_dir(dir);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Quote an argument for display when it would not survive a shell as-is
fn quote(arg: &OsStr) -> String {
    let s = arg.to_string_lossy();
    if s.is_empty() {
        return "\"\"".to_string();
    }
    if s.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        s.into_owned()
    }
}

/// Runs external commands and filesystem mutations, or logs them in dry-run mode
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    dry_run: bool,
}

impl ProcessRunner {
    /// Create a runner; `dry_run` is fixed for the runner's lifetime
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Whether commands are logged instead of executed
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run a command to completion, streaming its output
    ///
    /// The child's stdout is forwarded to our stderr and its stderr is
    /// inherited, so tool output shows up as it happens and never mixes with
    /// machine-readable output on our stdout.
    pub fn run(&self, cmd: &CommandLine) -> Result<(), ProcessError> {
        if self.announce(cmd) {
            return Ok(());
        }
        let rendered = cmd.to_string();

        let status = cmd
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::from(io::stderr()))
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| ProcessError::SpawnFailed {
                command: rendered.clone(),
                error: e.to_string(),
            })?;

        if !status.success() {
            return Err(ProcessError::CommandFailed {
                command: rendered,
                status: status.code(),
            });
        }
        Ok(())
    }

    /// Run a command to completion and return its trimmed standard output
    ///
    /// Returns an empty string in dry-run mode.
    pub fn capture(&self, cmd: &CommandLine) -> Result<String, ProcessError> {
        if self.announce(cmd) {
            return Ok(String::new());
        }
        let rendered = cmd.to_string();

        let output = cmd
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ProcessError::SpawnFailed {
                command: rendered.clone(),
                error: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            if !stdout.trim().is_empty() {
                error!(stdout = %stdout.trim_end(), "command stdout");
            }
            if !stderr.trim().is_empty() {
                error!(stderr = %stderr.trim_end(), "command stderr");
            }
            return Err(ProcessError::CommandFailed {
                command: rendered,
                status: output.status.code(),
            });
        }

        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim_end(), "command stderr");
        }

        let stdout = stdout.trim().to_string();
        if !stdout.is_empty() {
            debug!(stdout = %stdout, "command output");
        }

        Ok(stdout)
    }

    /// Log `cmd` and report whether dry-run suppresses it
    fn announce(&self, cmd: &CommandLine) -> bool {
        if self.dry_run {
            info!(command = %cmd, cwd = ?cmd.cwd(), "dry run, not executing");
        } else {
            info!(command = %cmd, cwd = ?cmd.cwd(), "running");
        }
        self.dry_run
    }

    /// Create a directory tree
    pub fn create_dir_all(&self, path: &Path) -> Result<(), FilesystemError> {
        if self.skip("mkdir -p", &[path]) {
            return Ok(());
        }
        filesystem::create_dir_all(path)
    }

    /// Recursively delete a directory; missing directories are fine
    pub fn remove_dir_all(&self, path: &Path) -> Result<(), FilesystemError> {
        if self.skip("rm -rf", &[path]) {
            return Ok(());
        }
        filesystem::remove_dir_all(path)
    }

    /// Copy a file, preserving its permission bits
    pub fn copy_file(&self, from: &Path, to: &Path) -> Result<(), FilesystemError> {
        if self.skip("cp -f", &[from, to]) {
            return Ok(());
        }
        filesystem::copy_file(from, to)
    }

    /// Delete a file; missing files are fine
    pub fn remove_file(&self, path: &Path) -> Result<(), FilesystemError> {
        if self.skip("rm -f", &[path]) {
            return Ok(());
        }
        filesystem::remove_file(path)
    }

    /// Create a symbolic link at `link` pointing to `target`
    pub fn symlink(&self, target: &Path, link: &Path) -> Result<(), FilesystemError> {
        if self.skip("ln -s", &[target, link]) {
            return Ok(());
        }
        filesystem::symlink(target, link)
    }

    /// Log a filesystem mutation and report whether dry-run suppresses it
    fn skip(&self, operation: &str, paths: &[&Path]) -> bool {
        let rendered = paths
            .iter()
            .map(|p| quote(p.as_os_str()))
            .collect::<Vec<_>>()
            .join(" ");
        if self.dry_run {
            info!(command = %format!("{operation} {rendered}"), "dry run, not executing");
            true
        } else {
            debug!(command = %format!("{operation} {rendered}"), "filesystem");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_command_line_display_quotes_spaces() {
        let cmd = CommandLine::new("patch")
            .arg("--backup")
            .arg("/src/my file.c")
            .arg("");
        assert_eq!(cmd.to_string(), "patch --backup \"/src/my file.c\" \"\"");
    }

    #[test]
    fn test_command_line_builder_records_cwd_and_env() {
        let cmd = CommandLine::new("make")
            .args(["-j", "4"])
            .current_dir("/build/zlib")
            .env("CFLAGS", "-O2");
        assert_eq!(cmd.program(), "make");
        assert_eq!(cmd.get_args().len(), 2);
        assert_eq!(cmd.cwd(), Some(Path::new("/build/zlib")));
        assert_eq!(cmd.get_env(), &[("CFLAGS".to_string(), "-O2".to_string())]);
    }

    #[test]
    fn test_dry_run_does_not_spawn() {
        let runner = ProcessRunner::new(true);
        let out = runner
            .capture(&CommandLine::new("definitely-not-a-real-program-cforge"))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_dry_run_skips_filesystem_mutations() {
        let dir = TempDir::new().unwrap();
        let runner = ProcessRunner::new(true);
        let target = dir.path().join("a/b/c");

        runner.create_dir_all(&target).unwrap();
        assert!(!target.exists());

        let keep = dir.path().join("keep");
        std::fs::create_dir(&keep).unwrap();
        runner.remove_dir_all(&keep).unwrap();
        assert!(keep.exists());
    }

    #[test]
    fn test_missing_program_is_spawn_failure() {
        let runner = ProcessRunner::new(false);
        let err = runner
            .run(&CommandLine::new("definitely-not-a-real-program-cforge"))
            .unwrap_err();
        assert!(matches!(err, ProcessError::SpawnFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_capture_trims_stdout() {
        let runner = ProcessRunner::new(false);
        let out = runner
            .capture(&CommandLine::new("sh").args(["-c", "echo '  hello  '"]))
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_command_failed() {
        let runner = ProcessRunner::new(false);
        let err = runner
            .run(&CommandLine::new("sh").args(["-c", "exit 3"]))
            .unwrap_err();
        assert_eq!(
            err,
            ProcessError::CommandFailed {
                command: "sh -c \"exit 3\"".to_string(),
                status: Some(3),
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_reports_exit_status_of_noisy_command() {
        let runner = ProcessRunner::new(false);
        let err = runner
            .run(&CommandLine::new("sh").args(["-c", "echo configuring; echo broken >&2; exit 5"]))
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessError::CommandFailed { status: Some(5), .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_in_directory_writes_there() {
        let dir = TempDir::new().unwrap();
        let runner = ProcessRunner::new(false);
        runner
            .run(&CommandLine::new("sh").args(["-c", "echo done > marker"]).current_dir(dir.path()))
            .unwrap();
        assert!(dir.path().join("marker").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_requested_directory() {
        let dir = TempDir::new().unwrap();
        let runner = ProcessRunner::new(false);
        let out = runner
            .capture(&CommandLine::new("pwd").current_dir(dir.path()))
            .unwrap();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(Path::new(&out).canonicalize().unwrap(), expected);
    }
}
