use std::path::Path;

use thiserror::Error;

use crate::{shell::ShellKind, translate::TranslateError};

pub const RC_BEGIN: &str = "# >>> mamba initialize >>>";
pub const RC_END: &str = "# <<< mamba initialize <<<";

pub const PROFILE_BEGIN: &str = "#region mamba initialize";
pub const PROFILE_END: &str = "#endregion";

const RC_NOTE: &str = "# !! Contents within this block are managed by 'mamba init' !!";
const PROFILE_NOTE: &str = "# !! Contents within this block are managed by 'mamba shell init' !!";

#[derive(Error, Debug)]
pub enum BlockError {
    #[error(transparent)]
    Translate(#[from] TranslateError),
}

// The whole block is regenerated from its inputs on every run, never
// diffed or merged. Keeping the builders free of timestamps and
// randomness is what makes repeated runs observably idempotent.
pub fn init_block(
    shell: ShellKind,
    root_prefix: &Path,
    exe: &Path,
) -> Result<String, BlockError> {
    match shell {
        ShellKind::Bash | ShellKind::Zsh | ShellKind::Posix => rc_block(shell, root_prefix, exe),
        ShellKind::Xonsh => xonsh_block(root_prefix, exe),
        ShellKind::Powershell => Ok(powershell_block(root_prefix, exe)),
        ShellKind::CmdExe => Ok(cmd_hook_invocation(root_prefix)),
    }
}

#[cfg(windows)]
fn rc_block(shell: ShellKind, root_prefix: &Path, exe: &Path) -> Result<String, BlockError> {
    use crate::translate::native_path_to_unix;

    let exe = native_path_to_unix(&exe.to_string_lossy(), false)?;
    let prefix = native_path_to_unix(&root_prefix.to_string_lossy(), false)?;
    Ok(rc_block_cygwin(shell.name(), &prefix, &exe))
}

#[cfg(not(windows))]
fn rc_block(shell: ShellKind, root_prefix: &Path, exe: &Path) -> Result<String, BlockError> {
    Ok(rc_block_posix(
        shell.name(),
        &root_prefix.to_string_lossy(),
        &exe.to_string_lossy(),
    ))
}

#[cfg(windows)]
fn xonsh_block(root_prefix: &Path, exe: &Path) -> Result<String, BlockError> {
    use crate::translate::native_path_to_unix;

    let exe = native_path_to_unix(&exe.to_string_lossy(), false)?;
    Ok(xonsh_block_from(&root_prefix.to_string_lossy(), &exe))
}

#[cfg(not(windows))]
fn xonsh_block(root_prefix: &Path, exe: &Path) -> Result<String, BlockError> {
    Ok(xonsh_block_from(
        &root_prefix.to_string_lossy(),
        &exe.to_string_lossy(),
    ))
}

pub fn rc_block_posix(shell_name: &str, prefix: &str, exe: &str) -> String {
    format!(
        r#"{RC_BEGIN}
{RC_NOTE}
export MAMBA_EXE="{exe}";
export MAMBA_ROOT_PREFIX="{prefix}";
__mamba_setup="$('{exe}' shell hook --shell {shell_name} --prefix '{prefix}' 2> /dev/null)"
if [ $? -eq 0 ]; then
    eval "$__mamba_setup"
else
    if [ -f "{prefix}/etc/profile.d/mamba.sh" ]; then
        . "{prefix}/etc/profile.d/mamba.sh"
    else
        export PATH="{prefix}/bin:$PATH"
    fi
fi
unset __mamba_setup
{RC_END}
"#
    )
}

// The cygwin runtime resolves the hook itself, so no source-or-PATH
// fallback is emitted here.
pub fn rc_block_cygwin(shell_name: &str, prefix: &str, exe: &str) -> String {
    format!(
        r#"{RC_BEGIN}
{RC_NOTE}
export MAMBA_EXE='{exe}';
export MAMBA_ROOT_PREFIX='{prefix}';
eval "$('{exe}' shell hook --shell {shell_name} --prefix '{prefix}')"
{RC_END}
"#
    )
}

pub fn xonsh_block_from(prefix: &str, exe: &str) -> String {
    format!(
        r#"{RC_BEGIN}
{RC_NOTE}
$MAMBA_EXE = "{exe}"
$MAMBA_ROOT_PREFIX = "{prefix}"
import sys as _sys
from types import ModuleType as _ModuleType
_mod = _ModuleType("xontrib.mamba",
                   "Autogenerated from $({exe} shell hook -s xonsh -p {prefix})")
__xonsh__.execer.exec($("{exe}" "shell" "hook" -s xonsh -p "{prefix}"),
                      glbs=_mod.__dict__,
                      filename="$({exe} shell hook -s xonsh -p {prefix})")
_sys.modules["xontrib.mamba"] = _mod
del _sys, _mod, _ModuleType
{RC_END}
"#
    )
}

pub fn powershell_block(root_prefix: &Path, exe: &Path) -> String {
    let prefix = root_prefix.display();
    let exe = exe.display();

    format!(
        r#"{PROFILE_BEGIN}
{PROFILE_NOTE}
$Env:MAMBA_ROOT_PREFIX = "{prefix}"
$Env:MAMBA_EXE = "{exe}"
(& "{exe}" 'shell' 'hook' -s 'powershell' -p "{prefix}") | Out-String | Invoke-Expression
{PROFILE_END}
"#
    )
}

pub fn cmd_hook_invocation(root_prefix: &Path) -> String {
    format!(
        "\"{}\"",
        root_prefix.join("condabin").join("mamba_hook.bat").display()
    )
}
