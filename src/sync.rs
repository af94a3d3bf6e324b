//! Scheduled playlist sync: run the helper, then commit and push the
//! refreshed playlist when it changed.
//!
//! Runs are not locked against each other. Two overlapping scheduled runs
//! share the working tree and may interleave their git steps.

use crate::config::{
    DEFAULT_COMMIT_MESSAGE, DEFAULT_PLAYLIST, DEFAULT_SYNC_INTERPRETER, DEFAULT_SYNC_SCRIPT,
    SyncSettings,
};
use crate::error::{IptvError, Result};
use crate::git::Git;
use crate::path_utils::resolve_under;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

pub const DRY_RUN_FLAG: &str = "--dry-run";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub repo_root: PathBuf,
    /// Helper program followed by its arguments.
    pub command: Vec<String>,
    /// Playlist written by the helper, relative to the repository root.
    pub output: PathBuf,
    pub commit_message: String,
    pub remote: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    DryRun,
    Unchanged,
    Committed { commit: String },
}

impl SyncPlan {
    pub fn from_settings(repo_root: PathBuf, settings: &SyncSettings) -> Self {
        let output = settings
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PLAYLIST));
        let command = settings
            .command
            .clone()
            .unwrap_or_else(|| default_command(&output));
        Self {
            repo_root,
            command,
            output,
            commit_message: settings
                .commit_message
                .clone()
                .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
            remote: settings.remote.clone(),
            dry_run: false,
        }
    }

    /// Helper invocation for this run; dry runs forward `--dry-run`.
    pub fn helper_command(&self) -> Vec<String> {
        let mut command = self.command.clone();
        if self.dry_run && !command.iter().any(|arg| arg == DRY_RUN_FLAG) {
            command.push(DRY_RUN_FLAG.to_string());
        }
        command
    }

    pub fn output_path(&self) -> PathBuf {
        resolve_under(&self.repo_root, &self.output)
    }
}

pub fn default_command(output: &Path) -> Vec<String> {
    vec![
        DEFAULT_SYNC_INTERPRETER.to_string(),
        DEFAULT_SYNC_SCRIPT.to_string(),
        "--m3u".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

pub fn run_sync(plan: &SyncPlan) -> Result<SyncOutcome> {
    run_helper(&plan.repo_root, &plan.helper_command())?;

    if plan.dry_run {
        info!("dry run: skipping git steps");
        return Ok(SyncOutcome::DryRun);
    }

    let output_path = plan.output_path();
    if !output_path.exists() {
        return Err(IptvError::OutputMissing { path: output_path });
    }

    let git = Git::new(&plan.repo_root);
    git.add(&plan.output)?;
    if !git.has_staged_changes(&plan.output)? {
        info!(output = %plan.output.display(), "playlist unchanged, nothing to commit");
        return Ok(SyncOutcome::Unchanged);
    }

    git.commit_only(&plan.output, &plan.commit_message)?;
    let commit = git.head()?;
    info!(commit = %commit, "committed playlist update");

    if let Err(err) = git.push(plan.remote.as_deref()) {
        warn!(commit = %commit, "push failed; local commit kept");
        return Err(err);
    }
    info!(remote = plan.remote.as_deref().unwrap_or("upstream"), "pushed");
    Ok(SyncOutcome::Committed { commit })
}

/// Runs the sync helper from the repository root with inherited stdio.
fn run_helper(repo_root: &Path, command: &[String]) -> Result<()> {
    let (program, args) = command.split_first().ok_or_else(|| IptvError::Config {
        message: "sync command is empty".to_string(),
    })?;
    let line = command.join(" ");
    debug!(command = %line, root = %repo_root.display(), "running sync helper");

    let status = Command::new(program)
        .args(args)
        .current_dir(repo_root)
        .status()
        .map_err(|source| IptvError::Spawn {
            command: line.clone(),
            source,
        })?;
    if !status.success() {
        return Err(IptvError::CommandFailed {
            command: line,
            code: status.code(),
            stderr: String::new(),
        });
    }
    Ok(())
}
