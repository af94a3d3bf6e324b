use anyhow::Result as _Result;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status a shell reports when a command cannot be found or started.
pub const EXIT_SPAWN_FAILED: i32 = 127;

#[derive(Debug, Error)]
pub enum IptvError {
    #[error("Config Error: {message}")]
    Config { message: String },

    #[error("Repository root not found from {start}")]
    RepoRootNotFound { start: PathBuf },

    #[error("Invalid repository root {path}: {reason}")]
    InvalidRepoRoot { path: PathBuf, reason: String },

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with {}{}", describe_code(.code), describe_stderr(.stderr))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Sync output {path} was not written")]
    OutputMissing { path: PathBuf },

    #[error("Unknown user: {name}")]
    UnknownUser { name: String },

    #[error("Unknown group: {name}")]
    UnknownGroup { name: String },

    #[error("Failed to {action} {path}: {source}")]
    Fs {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config Parse Error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("System Error: {0}")]
    Nix(#[from] nix::Error),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

impl IptvError {
    pub fn fs(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IptvError::Fs {
            action,
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this failure. Subprocess failures keep the
    /// status of the failing command.
    pub fn exit_code(&self) -> i32 {
        match self {
            IptvError::Spawn { .. } => EXIT_SPAWN_FAILED,
            IptvError::CommandFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }

    pub fn display_localized(&self) -> String {
        match self {
            IptvError::Config { message } => {
                t!("errors.config_error", message = message).to_string()
            }
            IptvError::RepoRootNotFound { start } => {
                t!("errors.repo_root_not_found", start = start.display()).to_string()
            }
            IptvError::OutputMissing { path } => {
                t!("errors.output_missing", path = path.display()).to_string()
            }
            IptvError::UnknownUser { name } => t!("errors.unknown_user", name = name).to_string(),
            IptvError::UnknownGroup { name } => {
                t!("errors.unknown_group", name = name).to_string()
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = _Result<T, IptvError>;
