use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug)]
#[error("unknown shell `{0}`, expected one of: bash, zsh, posix, xonsh, powershell, cmd.exe")]
pub struct UnknownShell(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellKind {
    Bash,
    Zsh,
    Posix,
    Xonsh,
    Powershell,
    CmdExe,
}

impl ShellKind {
    pub const ALL: [ShellKind; 6] = [
        ShellKind::Bash,
        ShellKind::Zsh,
        ShellKind::Posix,
        ShellKind::Xonsh,
        ShellKind::Powershell,
        ShellKind::CmdExe,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ShellKind::Bash => "bash",
            ShellKind::Zsh => "zsh",
            ShellKind::Posix => "posix",
            ShellKind::Xonsh => "xonsh",
            ShellKind::Powershell => "powershell",
            ShellKind::CmdExe => "cmd.exe",
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShellKind {
    type Err = UnknownShell;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bash" => Ok(ShellKind::Bash),
            "zsh" => Ok(ShellKind::Zsh),
            "posix" => Ok(ShellKind::Posix),
            "xonsh" => Ok(ShellKind::Xonsh),
            "powershell" => Ok(ShellKind::Powershell),
            "cmd.exe" => Ok(ShellKind::CmdExe),
            other => Err(UnknownShell(other.to_owned())),
        }
    }
}

pub fn detect_shell() -> Option<ShellKind> {
    detect_shell_from(|var| std::env::var(var).ok())
}

// Best-effort only. The result is a suggestion for the caller to
// confirm, never something to act on silently.
pub fn detect_shell_from<F>(env: F) -> Option<ShellKind>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| env(var).unwrap_or_default();
    let shell = get("shell");

    if !get("BASH_VERSION").is_empty() || shell == "bash" {
        return Some(ShellKind::Bash);
    }

    if !get("ZSH_VERSION").is_empty() || shell == "zsh" {
        return Some(ShellKind::Zsh);
    }

    if !get("XONSH_VERSION").is_empty() {
        return Some(ShellKind::Xonsh);
    }

    if !get("CMDEXTVERSION").is_empty() {
        return Some(ShellKind::CmdExe);
    }

    if !get("PSModulePath").is_empty() {
        return Some(ShellKind::Powershell);
    }

    None
}
