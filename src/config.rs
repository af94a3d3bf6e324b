use crate::error::{IptvError, Result};
use crate::git::find_git_root;
use crate::path_utils::validate_path_str;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const ENV_REPO_ROOT: &str = "IPTV_TOOLS_REPO_ROOT";
pub const ENV_LOG: &str = "IPTV_TOOLS_LOG";
pub const ENV_JELLYFIN_USER: &str = "JELLYFIN_USER";
pub const ENV_JELLYFIN_GROUP: &str = "JELLYFIN_GROUP";
pub const ENV_JELLYFIN_DIR: &str = "JELLYFIN_IPTV_DIR";
pub const CONFIG_FILE: &str = "iptv-tools.toml";

pub const DEFAULT_PLAYLIST: &str = "main.m3u";
pub const DEFAULT_SYNC_SCRIPT: &str = "sync_buddylive_to_tv_channels.py";
pub const DEFAULT_SYNC_INTERPRETER: &str = "python3";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Sync live channels into main.m3u";
pub const DEFAULT_JELLYFIN_DIR: &str = "/var/lib/jellyfin/iptv";

/// Repository root from `--repo-root`, then the environment, then the nearest
/// git checkout above the working directory, then the checkout holding the
/// running executable.
pub fn resolve_repo_root(cli_override: Option<&Path>) -> Result<PathBuf> {
    let env_override = env::var(ENV_REPO_ROOT).ok();
    let cwd = env::current_dir()?;
    let exe = env::current_exe().ok();
    resolve_repo_root_with(cli_override, env_override.as_deref(), &cwd, exe.as_deref())
}

pub fn resolve_repo_root_with(
    cli_override: Option<&Path>,
    env_override: Option<&str>,
    cwd: &Path,
    exe: Option<&Path>,
) -> Result<PathBuf> {
    let candidate = if let Some(path) = cli_override {
        validate_path_str(&path.to_string_lossy()).map_err(|reason| {
            IptvError::InvalidRepoRoot {
                path: path.to_path_buf(),
                reason,
            }
        })?;
        cwd.join(path)
    } else if let Some(value) = env_override {
        validate_path_str(value).map_err(|reason| IptvError::InvalidRepoRoot {
            path: PathBuf::from(value),
            reason,
        })?;
        cwd.join(value)
    } else {
        find_git_root(cwd)
            .or_else(|| exe.and_then(Path::parent).and_then(find_git_root))
            .ok_or_else(|| IptvError::RepoRootNotFound {
                start: cwd.to_path_buf(),
            })?
    };

    if !candidate.is_dir() {
        return Err(IptvError::InvalidRepoRoot {
            path: candidate,
            reason: "not a directory".to_string(),
        });
    }
    candidate
        .canonicalize()
        .map_err(|source| IptvError::fs("resolve", candidate, source))
}

/// Contents of the optional `iptv-tools.toml` at the repository root.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub sync: SyncSettings,
    pub jellyfin: JellyfinSettings,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    /// Helper program and its arguments.
    pub command: Option<Vec<String>>,
    pub output: Option<PathBuf>,
    pub commit_message: Option<String>,
    pub remote: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JellyfinSettings {
    pub playlist: Option<PathBuf>,
    pub target_dir: Option<PathBuf>,
    pub link_name: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
}

impl Settings {
    pub fn config_path(repo_root: &Path) -> PathBuf {
        repo_root.join(CONFIG_FILE)
    }

    /// Loads the repository config file; a missing file yields defaults.
    pub fn load(repo_root: &Path) -> Result<Self> {
        let path = Self::config_path(repo_root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(&path).map_err(|source| IptvError::fs("read", &path, source))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if let Some(command) = &self.sync.command {
            let program = command.first().map(|p| p.trim()).unwrap_or_default();
            if program.is_empty() {
                return Err(IptvError::Config {
                    message: "sync.command must name a program".to_string(),
                });
            }
        }
        if let Some(message) = &self.sync.commit_message
            && message.trim().is_empty()
        {
            return Err(IptvError::Config {
                message: "sync.commit_message cannot be empty".to_string(),
            });
        }
        for (key, value) in [
            ("jellyfin.user", &self.jellyfin.user),
            ("jellyfin.group", &self.jellyfin.group),
            ("jellyfin.link_name", &self.jellyfin.link_name),
        ] {
            if let Some(value) = value
                && value.trim().is_empty()
            {
                return Err(IptvError::Config {
                    message: format!("{key} cannot be empty"),
                });
            }
        }
        if let Some(link_name) = &self.jellyfin.link_name
            && !is_plain_file_name(link_name)
        {
            return Err(IptvError::Config {
                message: format!("jellyfin.link_name must be a file name, got {link_name}"),
            });
        }
        Ok(())
    }
}

/// A single path component: no separators, not `.` or `..`.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains('/')
}
