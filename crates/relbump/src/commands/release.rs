//! Release command: thin CLI layer over `relbump_core::workflow`.

use anyhow::Context;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{debug, instrument};

use relbump_core::changelog::CommandChangelog;
use relbump_core::config::Config;
use relbump_core::detect;
use relbump_core::git::SystemGit;
use relbump_core::package::PackageManager;
use relbump_core::publish::CommitGate;
use relbump_core::shell::{CommandTemplate, RunMode, Shell};
use relbump_core::workflow::{self, ReleaseEvent, RunConfig, RunOutcome, Tools};
use relbump_core::ReleaseVersion;

/// What to release, taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct ReleaseArgs {
    /// Version to bump to.
    pub new_version: Option<ReleaseVersion>,
    /// Run the publish phase.
    pub publish: bool,
    /// Print commands instead of running them.
    pub dry_run: bool,
}

/// JSON report for `--json`.
#[derive(Debug, Serialize)]
struct ReleaseReport {
    #[serde(flatten)]
    outcome: RunOutcome,
    commands: Vec<String>,
    warnings: Vec<String>,
}

/// Execute a bump and/or publish run.
#[instrument(name = "cmd_release", skip_all, fields(
    version = ?args.new_version.as_ref().map(ReleaseVersion::as_str),
    publish = args.publish,
    dry_run = args.dry_run,
))]
pub fn cmd_release(args: ReleaseArgs, global_json: bool, config: &Config) -> anyhow::Result<()> {
    let version_set = CommandTemplate::parse(config.version_set_command())
        .context("invalid commands.version_set")?;
    let changelog_cmd = CommandTemplate::parse(config.changelog_command())
        .context("invalid commands.changelog")?;
    let publish_cmd =
        CommandTemplate::parse(config.publish_command()).context("invalid commands.publish")?;

    detect::check_dependencies(&[&changelog_cmd]).context("required tool is missing")?;

    if args.dry_run && !global_json {
        println!(
            "{}",
            "Dry run: commands are printed, nothing is changed.".yellow()
        );
    }

    let shell = Shell::new(if args.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Execute
    });
    let git = SystemGit::new(shell, config.remote());
    let package = PackageManager::new(shell, config.manifest_path(), version_set, publish_cmd);
    let changelog = CommandChangelog::new(shell, changelog_cmd);
    let tools = Tools {
        versions: &package,
        scm: &git,
        changelog: &changelog,
        registry: &package,
    };

    let run = RunConfig::from_config(config, args.new_version, args.publish, args.dry_run);
    debug!(?run, "starting release run");

    let mut commands = Vec::new();
    let mut warnings = Vec::new();
    let outcome = workflow::run(&run, &tools, |event| {
        if global_json {
            match event {
                ReleaseEvent::CommandPrinted(line) => commands.push(line),
                ReleaseEvent::ChangelogFailed(message) => warnings.push(message),
                _ => {}
            }
        } else {
            display_event(event);
        }
    })
    .context("release failed")?;

    if global_json {
        let report = ReleaseReport {
            outcome,
            commands,
            warnings,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_outcome(&outcome);
    }
    Ok(())
}

fn display_event(event: ReleaseEvent) {
    match event {
        ReleaseEvent::VersionChange { current, new } => {
            println!(
                "{}: {} → {}",
                "Version".bold(),
                current.dimmed(),
                new.green().bold()
            );
        }
        ReleaseEvent::StepStarted(step) => debug!(%step, "step started"),
        // Plain, so the line can be pasted into a shell
        ReleaseEvent::CommandPrinted(line) => println!("{line}"),
        ReleaseEvent::ChangelogFailed(message) => {
            eprintln!(
                "{} changelog generation failed, continuing: {message}",
                "warning:".yellow().bold()
            );
        }
        ReleaseEvent::GitStatus(status) => {
            println!();
            print!("{status}");
        }
        ReleaseEvent::CommitSkipped { gate } => {
            let reason = match gate {
                CommitGate::CleanTree => "working tree has uncommitted changes",
                CommitGate::PendingChanges => "nothing to commit",
            };
            println!(
                "{}",
                format!("Skipping commit and tag ({reason}, commit gate: {gate})").dimmed()
            );
        }
    }
}

fn display_outcome(outcome: &RunOutcome) {
    if let Some(ref bump) = outcome.bump
        && !bump.next_steps.is_empty()
    {
        println!();
        println!("{}", "Next steps:".bold());
        for step in &bump.next_steps {
            println!("  {}", step.cyan());
        }
    }

    if let Some(ref publish) = outcome.publish
        && !publish.dry_run
    {
        println!();
        println!(
            "  {} Published {}",
            "✓".green(),
            publish.version.green().bold()
        );
        if let Some(ref url) = publish.releases_url {
            println!(
                "  {} Add release notes at {}",
                "→".dimmed(),
                url.cyan()
            );
        }
    }

    if outcome.dry_run {
        println!();
        println!("{}", "Dry run: no changes made.".yellow());
    }
}
