//! relbump CLI
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use relbump::{Action, Cli, CurrentRequest, commands};
use relbump_core::config::{Config, ConfigLoader};
use tracing::debug;

mod observability;

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --current ignores whatever else is on the command line
        Err(err) if err.use_stderr() => match CurrentRequest::scan(std::env::args_os()) {
            Some(request) => return run_current(&request),
            None => err.exit(),
        },
        Err(err) => err.exit(),
    };
    cli.color.apply();

    let (cwd, config, _guard) = prepare(
        cli.chdir.as_deref(),
        cli.config.as_deref(),
        cli.quiet,
        cli.verbose,
    )?;

    debug!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        json = cli.json,
        color = ?cli.color,
        chdir = ?cli.chdir,
        "CLI initialized"
    );

    let result = match cli.action() {
        Action::Current => commands::current::cmd_current(cli.json, &config, &cwd),
        Action::Notes(version) => commands::notes::cmd_notes(&version, cli.json, &config, &cwd),
        Action::Release => commands::release::cmd_release(
            commands::release::ReleaseArgs {
                new_version: cli.new_version,
                publish: cli.publish,
                dry_run: cli.dry_run,
            },
            cli.json,
            &config,
        ),
    };
    report_failure(result)
}

/// `--current` with a command line clap could not parse.
fn run_current(request: &CurrentRequest) -> anyhow::Result<()> {
    let (cwd, config, _guard) =
        prepare(request.chdir.as_deref(), request.config.as_deref(), false, 0)?;
    debug!(?request, "CLI initialized for --current");
    report_failure(commands::current::cmd_current(request.json, &config, &cwd))
}

/// Change directory, load configuration and start logging.
fn prepare(
    chdir: Option<&Path>,
    config_path: Option<&Path>,
    quiet: bool,
    verbose: u8,
) -> anyhow::Result<(Utf8PathBuf, Config, observability::ObservabilityGuard)> {
    if let Some(dir) = chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| {
        anyhow::anyhow!(
            "current directory is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })?;
    let mut loader = ConfigLoader::new().with_project_search(&cwd);
    if let Some(config_path) = config_path {
        let config_path = Utf8PathBuf::try_from(config_path.to_path_buf()).map_err(|e| {
            anyhow::anyhow!(
                "config path is not valid UTF-8: {}",
                e.into_path_buf().display()
            )
        })?;
        if !config_path.is_file() {
            bail!("config file not found: {config_path}");
        }
        loader = loader.with_file(&config_path);
    }
    let config = loader.load().context("failed to load configuration")?;

    let obs_config = observability::ObservabilityConfig::from_env_with_overrides(
        config
            .log_dir
            .as_ref()
            .map(|dir| dir.as_std_path().to_path_buf()),
    );
    let env_filter = observability::env_filter(quiet, verbose, config.log_level.as_str());
    let guard = observability::init_observability(&obs_config, env_filter)
        .context("failed to initialize logging")?;

    Ok((cwd, config, guard))
}

fn report_failure(result: anyhow::Result<()>) -> anyhow::Result<()> {
    if let Err(ref err) = result {
        tracing::error!(error = %err, "fatal error");
    }
    result
}
