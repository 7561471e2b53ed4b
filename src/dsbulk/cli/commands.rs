use super::print::print_result;
use super::setup::{print_grouped_help, print_help_for_command, Cli, Commands};
use directories::ProjectDirs;
use dsbulk::api::BulkApi;
use dsbulk::args::{ListArgs, MetadataArgs, PolicyArgs, ReplaceArgs};
use dsbulk::config::{BulkConfig, REPOSITORY_ENV};
use dsbulk::error::{BulkError, Result};
use dsbulk::store::fs::JsonRepository;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides both the config and data directories, mostly for tests and scripts.
const HOME_ENV: &str = "DSBULK_HOME";

struct AppContext {
    api: BulkApi<JsonRepository>,
}

pub fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        print_grouped_help();
        return Ok(());
    };
    if cli.help {
        print_grouped_help();
        return Ok(());
    }
    if command.common().help {
        print_help_for_command(command.name());
        return Ok(());
    }

    let mut ctx = init_context(cli.repo.as_deref())?;

    match command {
        Commands::List(opts) => handle_list(&ctx, &opts),
        Commands::Metadata(opts) => handle_metadata(&mut ctx, &opts),
        Commands::Policy(opts) => handle_policy(&mut ctx, &opts),
        Commands::Replace(opts) => handle_replace(&mut ctx, &opts),
    }
}

fn app_dirs() -> Result<(PathBuf, PathBuf)> {
    if let Some(home) = env::var_os(HOME_ENV).filter(|h| !h.is_empty()) {
        let home = PathBuf::from(home);
        return Ok((home.clone(), home));
    }
    let dirs = ProjectDirs::from("org", "dsbulk", "dsbulk").ok_or_else(|| {
        BulkError::Repository("could not determine the config directory".to_string())
    })?;
    Ok((
        dirs.config_dir().to_path_buf(),
        dirs.data_dir().to_path_buf(),
    ))
}

fn init_context(cli_repo: Option<&Path>) -> Result<AppContext> {
    let (config_dir, data_dir) = app_dirs()?;
    let config = BulkConfig::load(&config_dir)?;
    let env_repo = env::var_os(REPOSITORY_ENV).map(PathBuf::from);
    let path = config.repository_path(cli_repo, env_repo, &data_dir);
    debug!(repository = %path.display(), config = %config_dir.display(), "opening repository");

    let repo = JsonRepository::open_path(path)?;
    Ok(AppContext {
        api: BulkApi::new(repo, config.defaults()),
    })
}

fn handle_list(ctx: &AppContext, opts: &ListArgs) -> Result<()> {
    let result = ctx.api.list(opts)?;
    print_result(&result)
}

fn handle_metadata(ctx: &mut AppContext, opts: &MetadataArgs) -> Result<()> {
    let result = ctx.api.edit_metadata(opts)?;
    print_result(&result)
}

fn handle_policy(ctx: &mut AppContext, opts: &PolicyArgs) -> Result<()> {
    let result = ctx.api.edit_policies(opts)?;
    print_result(&result)
}

fn handle_replace(ctx: &mut AppContext, opts: &ReplaceArgs) -> Result<()> {
    let result = ctx.api.replace_bitstreams(opts)?;
    print_result(&result)
}
