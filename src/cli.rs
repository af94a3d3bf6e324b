use crate::config::{
    ENV_JELLYFIN_DIR, ENV_JELLYFIN_GROUP, ENV_JELLYFIN_USER, Settings, resolve_repo_root,
};
use crate::error::IptvError;
use crate::jellyfin::{LinkConfig, LinkOutcome, link_playlist};
use crate::logging::init_logging;
use crate::sync::{SyncOutcome, SyncPlan, run_sync};
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Repository root (default: nearest git checkout above the working directory)
    #[arg(short = 'C', long = "repo-root", global = true)]
    pub repo_root: Option<PathBuf>,

    /// Verbose diagnostics on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Print the resolved repository root and exit
    #[arg(long)]
    pub print_repo_root: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the playlist sync helper, then commit and push the playlist if it changed
    Sync(SyncArgs),
    /// Create the Jellyfin tuner directory and link the playlist into it
    #[command(name = "link-jellyfin", alias = "jellyfin")]
    LinkJellyfin(LinkArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct SyncArgs {
    /// Pass --dry-run to the helper and skip every git step
    #[arg(long, short = 'd')]
    pub dry_run: bool,

    /// Playlist written by the helper, relative to the repository root (default: main.m3u)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Remote to push to (default: the current branch's upstream)
    #[arg(long)]
    pub remote: Option<String>,

    /// Commit message for playlist updates
    #[arg(long, short = 'm')]
    pub message: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct LinkArgs {
    /// Owning user for the tuner directory and link (default: jellyfin)
    #[arg(long, env = ENV_JELLYFIN_USER)]
    pub user: Option<String>,

    /// Owning group for the tuner directory and link (default: jellyfin)
    #[arg(long, env = ENV_JELLYFIN_GROUP)]
    pub group: Option<String>,

    /// Tuner directory; relative paths are taken from the repository root (default: /var/lib/jellyfin/iptv)
    #[arg(long, env = ENV_JELLYFIN_DIR)]
    pub target_dir: Option<PathBuf>,

    /// Playlist to link, relative to the repository root (default: main.m3u)
    #[arg(long)]
    pub playlist: Option<PathBuf>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.print_repo_root {
        let repo_root = resolve_repo_root(cli.repo_root.as_deref())?;
        println!("{}", repo_root.display());
        return Ok(());
    }

    let Some(command) = cli.command.as_ref() else {
        let mut command = Cli::command();
        command.print_help()?;
        println!();
        return Ok(());
    };

    let repo_root = resolve_repo_root(cli.repo_root.as_deref())?;
    let settings = Settings::load(&repo_root)?;

    match command {
        Commands::Sync(args) => handle_sync(args, repo_root, settings),
        Commands::LinkJellyfin(args) => handle_link(args, repo_root, settings),
    }
}

/// Command-line values take precedence over the repository config file.
pub fn sync_plan(args: &SyncArgs, repo_root: PathBuf, mut settings: Settings) -> SyncPlan {
    if let Some(output) = &args.output {
        settings.sync.output = Some(output.clone());
    }
    if let Some(remote) = &args.remote {
        settings.sync.remote = Some(remote.clone());
    }
    if let Some(message) = &args.message {
        settings.sync.commit_message = Some(message.clone());
    }
    let mut plan = SyncPlan::from_settings(repo_root, &settings.sync);
    plan.dry_run = args.dry_run;
    plan
}

pub fn link_config(args: &LinkArgs, repo_root: PathBuf, mut settings: Settings) -> LinkConfig {
    let jellyfin = &mut settings.jellyfin;
    if let Some(user) = &args.user {
        jellyfin.user = Some(user.clone());
    }
    if let Some(group) = &args.group {
        jellyfin.group = Some(group.clone());
    }
    if let Some(target_dir) = &args.target_dir {
        jellyfin.target_dir = Some(target_dir.clone());
    }
    if let Some(playlist) = &args.playlist {
        jellyfin.playlist = Some(playlist.clone());
    }
    LinkConfig::from_settings(repo_root, jellyfin)
}

fn handle_sync(args: &SyncArgs, repo_root: PathBuf, settings: Settings) -> Result<()> {
    env::set_current_dir(&repo_root)
        .map_err(|source| IptvError::fs("enter", &repo_root, source))?;
    let plan = sync_plan(args, repo_root, settings);
    let output = plan.output.display().to_string();

    match run_sync(&plan)? {
        SyncOutcome::DryRun => println!("{}", t!("sync.dry_run", output = output)),
        SyncOutcome::Unchanged => println!("{}", t!("sync.unchanged", output = output)),
        SyncOutcome::Committed { commit } => {
            println!("{}", t!("sync.pushed", commit = commit, output = output))
        }
    }
    Ok(())
}

fn handle_link(args: &LinkArgs, repo_root: PathBuf, settings: Settings) -> Result<()> {
    let config = link_config(args, repo_root, settings);

    match link_playlist(&config)? {
        LinkOutcome::Created { link, source } => println!(
            "{}",
            t!(
                "link.created",
                link = link.display(),
                source = source.display(),
                owner = config.owner
            )
        ),
        LinkOutcome::AlreadyPresent { link } => {
            println!("{}", t!("link.already_present", link = link.display()))
        }
        LinkOutcome::SourceMissing { source } => {
            eprintln!("{}", t!("link.source_missing", source = source.display()))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_REPO_ROOT;
    use crate::test_utils::TestProcess;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_link_args_read_environment() {
        let mut proc = TestProcess::new();
        proc.set_var(ENV_JELLYFIN_USER, "media");
        proc.set_var(ENV_JELLYFIN_GROUP, "video");
        proc.remove_var(ENV_JELLYFIN_DIR);

        let cli = Cli::try_parse_from(["iptv-tools", "link-jellyfin"]).unwrap();
        let Some(Commands::LinkJellyfin(args)) = cli.command else {
            panic!("expected link-jellyfin");
        };
        assert_eq!(args.user.as_deref(), Some("media"));
        assert_eq!(args.group.as_deref(), Some("video"));
        assert_eq!(args.target_dir, None);
    }

    #[test]
    fn test_link_flags_override_environment() {
        let mut proc = TestProcess::new();
        proc.set_var(ENV_JELLYFIN_USER, "media");

        let cli =
            Cli::try_parse_from(["iptv-tools", "link-jellyfin", "--user", "jellyfin"]).unwrap();
        let Some(Commands::LinkJellyfin(args)) = cli.command else {
            panic!("expected link-jellyfin");
        };
        assert_eq!(args.user.as_deref(), Some("jellyfin"));
    }

    #[test]
    fn test_cli_values_override_config_file() {
        let settings = Settings::parse(
            r#"
[sync]
output = "lists/main.m3u"
remote = "origin"

[jellyfin]
user = "media"
group = "media"
target_dir = "/srv/iptv"
"#,
        )
        .unwrap();

        let sync_args = SyncArgs {
            dry_run: true,
            output: None,
            remote: Some("backup".to_string()),
            message: None,
        };
        let plan = sync_plan(&sync_args, PathBuf::from("/repo"), settings.clone());
        assert!(plan.dry_run);
        assert_eq!(plan.output, PathBuf::from("lists/main.m3u"));
        assert_eq!(plan.remote.as_deref(), Some("backup"));
        assert_eq!(plan.command.last().map(String::as_str), Some("lists/main.m3u"));

        let link_args = LinkArgs {
            user: Some("jellyfin".to_string()),
            group: None,
            target_dir: None,
            playlist: None,
        };
        let config = link_config(&link_args, PathBuf::from("/repo"), settings);
        assert_eq!(config.owner.to_string(), "jellyfin:media");
        assert_eq!(config.target_dir, PathBuf::from("/srv/iptv"));
        assert_eq!(config.link_name, "main.m3u");
    }

    #[test]
    fn test_repo_root_env_resolution() {
        let temp = TempDir::new().expect("temp dir");
        fs::create_dir_all(temp.path().join("nested")).unwrap();

        let mut proc = TestProcess::new();
        proc.set_var(ENV_REPO_ROOT, temp.path());
        proc.chdir(temp.path().join("nested")).expect("chdir");

        let resolved = resolve_repo_root(None).unwrap();
        assert_eq!(resolved, temp.path().canonicalize().unwrap());
    }
}
