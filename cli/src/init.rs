use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use console::style;
use dialoguer::Confirm;
use log::{info, warn};
use mamba::{
    block,
    bootstrap,
    edit::{self, MarkerStyle},
    exe,
    shell::ShellKind,
    translate,
};

#[derive(Debug, Clone, Copy)]
pub struct InitOptions {
    pub reverse: bool,
    pub dry_run: bool,
}

pub fn init_shell(shell: ShellKind, root_prefix: &Path, opts: &InitOptions) -> Result<()> {
    if !opts.reverse && root_prefix.exists() {
        let reuse = Confirm::new()
            .with_prompt(format!(
                "Prefix at {} already exists, use as root prefix?",
                root_prefix.display()
            ))
            .interact()?;

        if !reuse {
            println!("OK, exiting.");
            return Ok(());
        }
    }

    let exe = exe::self_exe_path().context("could not locate the running mamba executable")?;

    if !opts.reverse && !opts.dry_run {
        bootstrap::materialize(root_prefix, shell, &exe)
            .context("failed to write hook scripts to the root prefix")?;
    }

    let home = home_dir()?;
    match shell {
        ShellKind::Bash => init_rc_file(&bash_rc_path(&home), shell, root_prefix, &exe, opts),
        ShellKind::Zsh => init_rc_file(&home.join(".zshrc"), shell, root_prefix, &exe, opts),
        ShellKind::Xonsh => init_rc_file(&home.join(".xonshrc"), shell, root_prefix, &exe, opts),
        ShellKind::Posix => init_rc_file(&home.join(".profile"), shell, root_prefix, &exe, opts),
        ShellKind::Powershell => init_powershell(root_prefix, &exe, opts),
        ShellKind::CmdExe => init_cmd_exe(root_prefix, opts),
    }
}

// Login shells read .bash_profile on macOS, and that is also where
// git-bash looks on Windows. Everywhere else interactive shells
// source .bashrc.
fn bash_rc_path(home: &Path) -> PathBuf {
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        home.join(".bash_profile")
    } else {
        home.join(".bashrc")
    }
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow!("failed to get home dir"))
}

fn init_rc_file(
    path: &Path,
    shell: ShellKind,
    root_prefix: &Path,
    exe: &Path,
    opts: &InitOptions,
) -> Result<()> {
    if opts.reverse {
        // Removal only needs the markers, not a freshly generated block
        let changed = edit::apply_block(path, MarkerStyle::Rc, "", true, opts.dry_run)?;
        report(path, changed, opts);
        return Ok(());
    }

    let new_block = block::init_block(shell, root_prefix, exe)?;

    info!(
        "Modifying rc file {}\n    Generating config for root prefix {}\n    Setting mamba executable to {}",
        path.display(),
        style(root_prefix.display()).bold(),
        style(exe.display()).bold(),
    );
    info!(
        "Adding (or replacing) the following in your {} file\n{}",
        path.display(),
        style(&new_block).green(),
    );

    let changed = edit::apply_block(path, MarkerStyle::Rc, &new_block, false, opts.dry_run)?;
    report(path, changed, opts);

    Ok(())
}

fn init_powershell(root_prefix: &Path, exe: &Path, opts: &InitOptions) -> Result<()> {
    let profile = match translate::discover_profile(&translate::PROFILE_CANDIDATES) {
        Some(profile) => profile,
        None => {
            // Not fatal: proceed without a profile path instead of
            // leaving the operation half-done with an error
            warn!("no PowerShell interpreter answered, leaving the profile untouched");
            return Ok(());
        }
    };

    info!(
        "Found powershell at {} and user profile at {}",
        style(&profile.exe).bold(),
        style(profile.profile_path.display()).bold(),
    );

    if opts.reverse {
        let changed =
            edit::apply_block(&profile.profile_path, MarkerStyle::Profile, "", true, opts.dry_run)?;
        report(&profile.profile_path, changed, opts);
        return Ok(());
    }

    let new_block = block::init_block(ShellKind::Powershell, root_prefix, exe)?;

    info!(
        "Adding (or replacing) the following in your {} file\n{}",
        profile.profile_path.display(),
        style(&new_block).green(),
    );

    let changed = edit::apply_block(
        &profile.profile_path,
        MarkerStyle::Profile,
        &new_block,
        false,
        opts.dry_run,
    )?;
    report(&profile.profile_path, changed, opts);

    Ok(())
}

#[cfg(windows)]
fn init_cmd_exe(root_prefix: &Path, opts: &InitOptions) -> Result<()> {
    let invocation = block::cmd_hook_invocation(root_prefix);
    let changed = mamba::autorun::apply_autorun(&invocation, opts.reverse, opts.dry_run)?;

    if changed {
        info!(
            "Adding to cmd.exe AutoRun: {}{}",
            style(&invocation).green(),
            if opts.dry_run { " (dry run)" } else { "" },
        );
    } else {
        info!("cmd.exe AutoRun is already up to date");
    }

    Ok(())
}

#[cfg(not(windows))]
fn init_cmd_exe(_root_prefix: &Path, _opts: &InitOptions) -> Result<()> {
    anyhow::bail!("cmd.exe can only be initialized on Windows")
}

fn report(path: &Path, changed: bool, opts: &InitOptions) {
    match (changed, opts.dry_run, opts.reverse) {
        (false, _, true) => info!("No managed block in {}, nothing to remove", path.display()),
        (false, _, false) => info!("{} is already up to date", path.display()),
        (true, true, _) => info!("Dry run, {} was not written", path.display()),
        (true, false, true) => info!("Removed the managed block from {}", path.display()),
        (true, false, false) => info!("Updated {}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bash_rc_path_is_platform_conditional() {
        let home = Path::new("/home/user");
        let rc = bash_rc_path(home);

        if cfg!(any(target_os = "macos", target_os = "windows")) {
            assert_eq!(rc, home.join(".bash_profile"));
        } else {
            assert_eq!(rc, home.join(".bashrc"));
        }
    }
}
