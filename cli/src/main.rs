use std::{io::Write, path::PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use console::style;
use log::trace;
use mamba::shell::{detect_shell, ShellKind};

mod init;

#[derive(Debug, Parser)]
#[clap(name = "mamba", author, version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Shell {
        #[clap(subcommand)]
        command: ShellCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    /// Add the startup hook to this shell's config file or registry value
    Init(InitArgs),

    /// Print the hook script evaluated by an initialized shell at startup
    Hook(HookArgs),

    /// Guess the current interactive shell from the environment
    Detect,
}

#[derive(Debug, Args)]
struct InitArgs {
    /// Shell to initialize (defaults to the detected one)
    #[clap(long, short)]
    shell: Option<String>,

    /// Root prefix to store hook scripts under
    #[clap(long, short)]
    prefix: Option<PathBuf>,

    /// Remove the managed block instead of adding it
    #[clap(long)]
    reverse: bool,

    /// Report what would change without writing anything
    #[clap(long)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct HookArgs {
    #[clap(long, short)]
    shell: String,

    #[clap(long, short)]
    prefix: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::new()
        .target(env_logger::Target::Stderr)
        .filter_level(log::LevelFilter::Info)
        .parse_env("MAMBA_LOG")
        .format(|buf, record| {
            let level = match record.level() {
                log::Level::Info => style("==>").bold().cyan(),
                log::Level::Error => style("error:").bold().red(),
                log::Level::Warn => style("warn:").bold().yellow(),
                log::Level::Debug => style("debug:").bold().blue(),
                log::Level::Trace => style("trace:").bold().cyan(),
            };

            writeln!(buf, "{} {}", level, record.args())
        })
        .init();

    if let Err(err) = run() {
        eprintln!("{} {err:#}", style("error:").bold().red());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    match Cli::parse().command {
        Commands::Shell { command } => match command {
            ShellCommand::Init(args) => command_init(args),
            ShellCommand::Hook(args) => command_hook(args),
            ShellCommand::Detect => command_detect(),
        },
    }
}

fn command_init(args: InitArgs) -> Result<()> {
    let shell = resolve_shell(args.shell.as_deref())?;
    let root_prefix = resolve_prefix(args.prefix)?;

    trace!("initializing {shell} with root prefix {}", root_prefix.display());

    init::init_shell(
        shell,
        &root_prefix,
        &init::InitOptions {
            reverse: args.reverse,
            dry_run: args.dry_run,
        },
    )
}

fn command_hook(args: HookArgs) -> Result<()> {
    let shell: ShellKind = args.shell.parse()?;
    let root_prefix = resolve_prefix(args.prefix)?;
    let exe = mamba::exe::self_exe_path()?;

    match mamba::bootstrap::hook_contents(shell, &root_prefix, &exe) {
        Some(contents) => print!("{contents}"),
        None => {
            // cmd.exe evaluates its hook from disk, so install the
            // scripts and tell the user how to call them
            mamba::bootstrap::materialize(&root_prefix, shell, &exe)?;
            println!(
                "Hook installed, now manually execute:\n\n       CALL \"{}\"",
                root_prefix.join("condabin").join("mamba_hook.bat").display()
            );
        }
    }

    Ok(())
}

fn command_detect() -> Result<()> {
    match detect_shell() {
        Some(shell) => println!("{shell}"),
        None => bail!("could not detect the current shell"),
    }

    Ok(())
}

fn resolve_shell(arg: Option<&str>) -> Result<ShellKind> {
    match arg {
        Some(name) => Ok(name.parse()?),
        None => detect_shell().context(
            "could not detect the current shell, pass one with \
             `--shell` (bash, zsh, posix, xonsh, powershell, cmd.exe)",
        ),
    }
}

fn resolve_prefix(arg: Option<PathBuf>) -> Result<PathBuf> {
    match arg {
        Some(prefix) => Ok(prefix),
        None => {
            let home = dirs::home_dir().ok_or_else(|| anyhow!("failed to get home dir"))?;
            Ok(home.join("micromamba"))
        }
    }
}
