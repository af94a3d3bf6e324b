//! Ownership handling for the media-server directory tree.
//!
//! Users and groups are given by name or numeric id, the same way `chown`
//! accepts them, and resolved through the system account database.

use crate::error::{IptvError, Result};
use nix::unistd::{Group, User};
use std::fmt;
use std::os::unix::fs::{chown, lchown};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

pub const DEFAULT_USER: &str = "jellyfin";
pub const DEFAULT_GROUP: &str = "jellyfin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerSpec {
    pub user: String,
    pub group: String,
}

impl Default for OwnerSpec {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            group: DEFAULT_GROUP.to_string(),
        }
    }
}

impl fmt::Display for OwnerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user, self.group)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOwner {
    pub uid: u32,
    pub gid: u32,
}

impl OwnerSpec {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
        }
    }

    pub fn resolve(&self) -> Result<ResolvedOwner> {
        Ok(ResolvedOwner {
            uid: resolve_uid(&self.user)?,
            gid: resolve_gid(&self.group)?,
        })
    }
}

fn resolve_uid(user: &str) -> Result<u32> {
    if let Ok(uid) = user.parse::<u32>() {
        return Ok(uid);
    }
    User::from_name(user)?
        .map(|found| found.uid.as_raw())
        .ok_or_else(|| IptvError::UnknownUser {
            name: user.to_string(),
        })
}

fn resolve_gid(group: &str) -> Result<u32> {
    if let Ok(gid) = group.parse::<u32>() {
        return Ok(gid);
    }
    Group::from_name(group)?
        .map(|found| found.gid.as_raw())
        .ok_or_else(|| IptvError::UnknownGroup {
            name: group.to_string(),
        })
}

/// Sets ownership on `root` and everything beneath it. Symlinks are never
/// followed; the link itself gets the new owner.
pub fn chown_recursive(root: &Path, owner: ResolvedOwner) -> Result<usize> {
    let mut changed = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            let source = err
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            IptvError::fs("walk", path, source)
        })?;
        let path = entry.path();
        let result = if entry.path_is_symlink() {
            lchown(path, Some(owner.uid), Some(owner.gid))
        } else {
            chown(path, Some(owner.uid), Some(owner.gid))
        };
        result.map_err(|source| IptvError::fs("change ownership of", path, source))?;
        changed += 1;
    }
    debug!(root = %root.display(), entries = changed, "ownership updated");
    Ok(changed)
}

/// Sets ownership of a symlink itself, not of its target.
pub fn lchown_link(link: &Path, owner: ResolvedOwner) -> Result<()> {
    lchown(link, Some(owner.uid), Some(owner.gid))
        .map_err(|source| IptvError::fs("change ownership of", link, source))
}
