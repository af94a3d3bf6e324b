//! Links the repository playlist into the directory a Jellyfin M3U tuner
//! reads from.

use crate::config::{DEFAULT_JELLYFIN_DIR, DEFAULT_PLAYLIST, JellyfinSettings};
use crate::error::{IptvError, Result};
use crate::ownership::{OwnerSpec, chown_recursive, lchown_link};
use crate::path_utils::{file_name_str, resolve_under};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub repo_root: PathBuf,
    /// Playlist to expose, relative to the repository root.
    pub playlist: PathBuf,
    pub target_dir: PathBuf,
    pub link_name: String,
    pub owner: OwnerSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Created { link: PathBuf, source: PathBuf },
    AlreadyPresent { link: PathBuf },
    SourceMissing { source: PathBuf },
}

impl LinkConfig {
    pub fn from_settings(repo_root: PathBuf, settings: &JellyfinSettings) -> Self {
        let playlist = settings
            .playlist
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PLAYLIST));
        let link_name = settings
            .link_name
            .clone()
            .or_else(|| file_name_str(&playlist).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_PLAYLIST.to_string());
        let defaults = OwnerSpec::default();
        Self {
            repo_root,
            playlist,
            target_dir: settings
                .target_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_JELLYFIN_DIR)),
            link_name,
            owner: OwnerSpec {
                user: settings.user.clone().unwrap_or(defaults.user),
                group: settings.group.clone().unwrap_or(defaults.group),
            },
        }
    }

    pub fn source_path(&self) -> PathBuf {
        resolve_under(&self.repo_root, &self.playlist)
    }

    /// Tuner directory; a relative path is taken from the repository root.
    pub fn target_path(&self) -> PathBuf {
        resolve_under(&self.repo_root, &self.target_dir)
    }

    pub fn link_path(&self) -> PathBuf {
        self.target_path().join(&self.link_name)
    }
}

/// Creates the tuner directory, hands it to the configured owner and links
/// the playlist into it. Safe to run repeatedly.
pub fn link_playlist(config: &LinkConfig) -> Result<LinkOutcome> {
    let owner = config.owner.resolve()?;

    let target_dir = config.target_path();
    fs::create_dir_all(&target_dir)
        .map_err(|source| IptvError::fs("create", &target_dir, source))?;
    chown_recursive(&target_dir, owner)?;
    info!(dir = %target_dir.display(), owner = %config.owner, "target directory ready");

    let source = config.source_path();
    if !source.exists() {
        warn!(source = %source.display(), "playlist not found, skipping link");
        return Ok(LinkOutcome::SourceMissing { source });
    }

    let link = config.link_path();
    if link_entry_exists(&link) {
        info!(link = %link.display(), "link path already exists, leaving it");
        return Ok(LinkOutcome::AlreadyPresent { link });
    }

    create_symlink(&source, &link)?;
    lchown_link(&link, owner)?;
    debug!(link = %link.display(), source = %source.display(), "symlink created");
    Ok(LinkOutcome::Created { link, source })
}

/// True for any entry at `path`, including dangling symlinks.
fn link_entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)
        .map_err(|source| IptvError::fs("create symlink", link, source))
}
