// SPDX-FileCopyrightText: 2026 Sym Contributors
// SPDX-License-Identifier: MIT

use sym::{
    links::{self, LinkError, LinkOutcome},
    path::home_dir,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{
    path::{Path, PathBuf},
    process::exit,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "sym [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Home directory override for the pointer and home-relative paths.
    #[arg(long, global = true, value_name = "path")]
    pub home_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let home = match self.home_dir {
            Some(path) => path,
            None => home_dir()?,
        };

        match self.command {
            Command::Init(opts) => run_init(opts, &home),
            Command::Add(opts) => run_add(opts, &home),
            Command::Remove(opts) => run_remove(opts, &home),
            Command::Verify => run_verify(&home),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Initialize the config pointer for a dotfiles repository.
    #[command(override_usage = "sym init [options] <basedir>")]
    Init(InitOptions),

    /// Add a dotfile for management.
    #[command(override_usage = "sym add [options] <source> <destination>")]
    Add(AddOptions),

    /// Remove a dotfile from management.
    #[command(override_usage = "sym remove [options] <symlink>")]
    Remove(RemoveOptions),

    /// Verify managed symlinks against the registry.
    #[command(override_usage = "sym verify [options]")]
    Verify,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InitOptions {
    /// Base directory where the dotfiles repository lives.
    #[arg(value_name = "basedir")]
    pub basedir: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct AddOptions {
    /// Dotfile inside the repository to link from.
    #[arg(value_name = "source")]
    pub source: String,

    /// Canonical location to place the symlink at.
    #[arg(value_name = "destination")]
    pub destination: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RemoveOptions {
    /// Managed symlink to remove.
    #[arg(value_name = "symlink")]
    pub symlink: String,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(exit_code(&error));
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

/// Distinct exit codes per error kind, so scripts can discriminate failures.
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<LinkError>() {
        Some(LinkError::PathNotFound { .. }) => 2,
        Some(LinkError::AlreadyExists { .. }) => 3,
        Some(LinkError::NotTracked { .. }) => 4,
        Some(LinkError::ExternallyModified { .. }) => 5,
        Some(LinkError::Registry(_)) => 6,
        _ => 1,
    }
}

/// Expand a leading tilde against the selected home directory.
fn expand(input: &str, home: &Path) -> PathBuf {
    let context = || Some(home.to_string_lossy().into_owned());
    PathBuf::from(shellexpand::tilde_with_context(input, context).into_owned())
}

fn run_init(opts: InitOptions, home: &Path) -> Result<()> {
    links::init(expand(&opts.basedir, home), home)?;
    info!("initialized registry for {}", opts.basedir);

    Ok(())
}

fn run_add(opts: AddOptions, home: &Path) -> Result<()> {
    let outcome = links::link(
        expand(&opts.source, home),
        expand(&opts.destination, home),
        home,
    )?;

    match outcome {
        LinkOutcome::Created => info!("linked {} -> {}", opts.destination, opts.source),
        LinkOutcome::AlreadySatisfied => {
            info!("{} already links to {}", opts.destination, opts.source)
        }
    }

    Ok(())
}

fn run_remove(opts: RemoveOptions, home: &Path) -> Result<()> {
    links::unlink(expand(&opts.symlink, home), home)?;
    info!("removed {}", opts.symlink);

    Ok(())
}

fn run_verify(home: &Path) -> Result<()> {
    let report = links::verify(home)?;
    for entry in &report.entries {
        println!(
            "{:<10} {} -> {}",
            entry.status,
            entry.destination.display(),
            entry.source.display()
        );
    }

    if !report.is_clean() {
        exit(1);
    }

    Ok(())
}
