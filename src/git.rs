use crate::error::{IptvError, Result};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if is_git_root(&current) {
            return Some(current);
        }
        if !current.pop() {
            break;
        }
    }
    None
}

fn is_git_root(path: &Path) -> bool {
    let git = path.join(".git");
    if let Ok(metadata) = fs::symlink_metadata(&git) {
        return metadata.is_dir() || metadata.is_file();
    }
    false
}

/// Thin wrapper over the `git` CLI, always run from the repository root.
#[derive(Debug, Clone)]
pub struct Git {
    root: PathBuf,
}

impl Git {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn add(&self, path: &Path) -> Result<()> {
        self.run([OsStr::new("add"), OsStr::new("--"), path.as_os_str()])?;
        Ok(())
    }

    /// Whether the index differs from `HEAD` for `path`.
    ///
    /// An unborn `HEAD` counts as changed when anything is staged.
    pub fn has_staged_changes(&self, path: &Path) -> Result<bool> {
        let args = [
            OsStr::new("diff"),
            OsStr::new("--cached"),
            OsStr::new("--quiet"),
            OsStr::new("--"),
            path.as_os_str(),
        ];
        let output = self.output(args)?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            code => Err(IptvError::CommandFailed {
                command: describe(args),
                code,
                stderr: stderr_of(&output),
            }),
        }
    }

    /// Commits only `path`, leaving anything else in the index alone.
    pub fn commit_only(&self, path: &Path, message: &str) -> Result<()> {
        self.run([
            OsStr::new("commit"),
            OsStr::new("--quiet"),
            OsStr::new("-m"),
            OsStr::new(message),
            OsStr::new("--"),
            path.as_os_str(),
        ])?;
        Ok(())
    }

    pub fn head(&self) -> Result<String> {
        self.run(["rev-parse", "HEAD"])
    }

    /// Pushes the current branch. Without a remote, git's configured
    /// upstream is used.
    pub fn push(&self, remote: Option<&str>) -> Result<()> {
        match remote {
            Some(remote) => self.run(["push", "--quiet", remote, "HEAD"])?,
            None => self.run(["push", "--quiet"])?,
        };
        Ok(())
    }

    fn run<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_os_string())
            .collect();
        let output = self.output(&args)?;
        if !output.status.success() {
            return Err(IptvError::CommandFailed {
                command: describe(&args),
                code: output.status.code(),
                stderr: stderr_of(&output),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn output<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S> + Clone,
        S: AsRef<OsStr>,
    {
        debug!(command = %describe(args.clone()), root = %self.root.display(), "running git");
        Command::new("git")
            .args(args.clone())
            .current_dir(&self.root)
            .output()
            .map_err(|source| IptvError::Spawn {
                command: describe(args),
                source,
            })
    }
}

fn describe<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut line = String::from("git");
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
