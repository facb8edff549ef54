//! Stage, commit and push a local directory to a remote repository.
//!
//! Settings come from `pushdir.toml` (or `--config`), with command-line flags
//! taking precedence. Exits 0 on success and 1 on any failure.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use pushdir::exit_codes;
use pushdir::io::config::{DEFAULT_CONFIG_FILE, UploadConfig, load_config, write_config};
use pushdir::io::git::Git;
use pushdir::io::process::SystemRunner;
use pushdir::logging;
use pushdir::report;
use pushdir::upload::run_upload;

#[derive(Parser)]
#[command(
    name = "pushdir",
    version,
    about = "Stage, commit and push a local directory to a remote repository"
)]
struct Cli {
    /// Config file (TOML). A missing file means defaults.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Do not echo git commands and their output.
    #[arg(short, long)]
    quiet: bool,

    /// Log pipeline decisions to stderr (`RUST_LOG` overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write a config file with default values.
    InitConfig {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

/// Per-run overrides for config file values.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Directory to upload.
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Remote repository URL.
    #[arg(short = 'u', long)]
    remote_url: Option<String>,

    /// Commit message.
    #[arg(short, long)]
    message: Option<String>,

    /// Branch to create and push.
    #[arg(short, long)]
    branch: Option<String>,

    /// Remote name.
    #[arg(long)]
    remote_name: Option<String>,

    /// Skip pulling from the remote before committing.
    #[arg(long)]
    no_pull: bool,

    /// Kill any single git command running longer than this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Overrides {
    fn apply(self, cfg: &mut UploadConfig) {
        if let Some(path) = self.path {
            cfg.local_path = path;
        }
        if let Some(url) = self.remote_url {
            cfg.remote_url = url;
        }
        if let Some(message) = self.message {
            cfg.commit_message = message;
        }
        if let Some(branch) = self.branch {
            cfg.branch = branch;
        }
        if let Some(name) = self.remote_name {
            cfg.remote_name = name;
        }
        if self.no_pull {
            cfg.pull = false;
        }
        if let Some(secs) = self.timeout_secs {
            cfg.command_timeout_secs = Some(secs);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::FAILED
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Some(Command::InitConfig { force }) => {
            cmd_init_config(&cli.config, force)?;
            Ok(exit_codes::OK)
        }
        None => cmd_upload(&cli.config, cli.quiet, cli.overrides),
    }
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &UploadConfig::default())?;
    println!("wrote {}; set remote_url before uploading", path.display());
    Ok(())
}

fn cmd_upload(config_path: &Path, quiet: bool, overrides: Overrides) -> Result<i32> {
    let mut cfg = load_config(config_path)?;
    overrides.apply(&mut cfg);
    cfg.validate()?;
    debug!(?cfg, "resolved config");

    report::print_start_banner(&cfg);
    let runner = SystemRunner::new(cfg.command_timeout()).env("LC_ALL", "C");
    let mut git = Git::new(runner, ".");
    if quiet {
        git = git.quiet();
    }

    match run_upload(&git, &cfg) {
        Ok(summary) => {
            report::print_success_banner(&summary);
            Ok(exit_codes::OK)
        }
        Err(err) => {
            report::print_failure(&err, &cfg);
            Ok(exit_codes::FAILED)
        }
    }
}
