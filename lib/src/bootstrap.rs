use std::{fs, path::Path};

use log::debug;
use thiserror::Error;

use crate::shell::ShellKind;

const MAMBA_SH: &str = include_str!("../data/mamba.sh");
const MAMBA_XSH: &str = include_str!("../data/mamba.xsh");
const MICROMAMBA_BAT: &str = include_str!("../data/micromamba.bat");
const MAMBA_ACTIVATE_BAT: &str = include_str!("../data/_mamba_activate.bat");
const MAMBA_HOOK_BAT: &str = include_str!("../data/mamba_hook.bat");
const MAMBA_HOOK_PS1: &str = include_str!("../data/mamba_hook.ps1");
const MAMBA_PSM1: &str = include_str!("../data/Mamba.psm1");

pub const ROOT_PREFIX_TOKEN: &str = "__MAMBA_INSERT_ROOT_PREFIX__";
pub const MAMBA_EXE_TOKEN: &str = "__MAMBA_INSERT_MAMBA_EXE__";

const PSM1_EXPORTS_MARKER: &str = "## EXPORTS ##";

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("io error while writing hook assets: {0}")]
    Io(#[from] std::io::Error),
}

fn fill(template: &str, root_prefix: &Path, exe: &Path) -> String {
    template
        .replace(ROOT_PREFIX_TOKEN, &root_prefix.to_string_lossy())
        .replace(MAMBA_EXE_TOKEN, &exe.to_string_lossy())
}

fn assets_for(shell: ShellKind) -> &'static [(&'static str, &'static str)] {
    match shell {
        ShellKind::Bash | ShellKind::Zsh | ShellKind::Posix => {
            &[("etc/profile.d/mamba.sh", MAMBA_SH)]
        }
        ShellKind::Xonsh => &[("etc/profile.d/mamba.xsh", MAMBA_XSH)],
        ShellKind::Powershell => &[
            ("condabin/mamba_hook.ps1", MAMBA_HOOK_PS1),
            ("condabin/Mamba.psm1", MAMBA_PSM1),
        ],
        ShellKind::CmdExe => &[
            ("condabin/micromamba.bat", MICROMAMBA_BAT),
            ("condabin/_mamba_activate.bat", MAMBA_ACTIVATE_BAT),
            ("condabin/mamba_hook.bat", MAMBA_HOOK_BAT),
        ],
    }
}

// Whole-file regeneration: assets are always overwritten in place,
// unlike the marker-delimited rc file edits.
pub fn materialize(
    root_prefix: &Path,
    shell: ShellKind,
    exe: &Path,
) -> Result<(), BootstrapError> {
    for (rel, template) in assets_for(shell) {
        let target = root_prefix.join(rel);
        debug!("writing hook asset {}", target.display());

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, fill(template, root_prefix, exe))?;
    }

    Ok(())
}

// cmd.exe has no printable hook; its scripts are evaluated from disk.
pub fn hook_contents(shell: ShellKind, root_prefix: &Path, exe: &Path) -> Option<String> {
    match shell {
        ShellKind::Bash | ShellKind::Zsh | ShellKind::Posix => {
            Some(fill(MAMBA_SH, root_prefix, exe))
        }
        ShellKind::Xonsh => Some(fill(MAMBA_XSH, root_prefix, exe)),
        ShellKind::Powershell => {
            let module = MAMBA_PSM1
                .split(PSM1_EXPORTS_MARKER)
                .next()
                .unwrap_or(MAMBA_PSM1);

            Some(format!(
                "$Env:MAMBA_EXE=\"{}\"\n{}",
                exe.display(),
                fill(module, root_prefix, exe)
            ))
        }
        ShellKind::CmdExe => None,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn exe() -> PathBuf {
        PathBuf::from("/opt/conda/bin/mamba")
    }

    fn materialized_files(shell: ShellKind) -> Vec<String> {
        assets_for(shell)
            .iter()
            .map(|(rel, _)| (*rel).to_owned())
            .collect()
    }

    #[test]
    fn posix_shells_share_one_asset() {
        for shell in [ShellKind::Bash, ShellKind::Zsh, ShellKind::Posix] {
            assert_eq!(materialized_files(shell), vec!["etc/profile.d/mamba.sh"]);
        }
    }

    #[test]
    fn asset_counts_per_shell() {
        assert_eq!(assets_for(ShellKind::Xonsh).len(), 1);
        assert_eq!(assets_for(ShellKind::Powershell).len(), 2);
        assert_eq!(assets_for(ShellKind::CmdExe).len(), 3);
    }

    #[test]
    fn materialize_substitutes_both_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("root");

        materialize(&prefix, ShellKind::Bash, &exe()).unwrap();

        let written = fs::read_to_string(prefix.join("etc/profile.d/mamba.sh")).unwrap();
        assert!(written.contains("/opt/conda/bin/mamba"));
        assert!(written.contains(&prefix.to_string_lossy().into_owned()));
        assert!(!written.contains(ROOT_PREFIX_TOKEN));
        assert!(!written.contains(MAMBA_EXE_TOKEN));
    }

    #[test]
    fn materialize_creates_all_cmd_exe_assets() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("root");

        materialize(&prefix, ShellKind::CmdExe, &exe()).unwrap();

        for rel in materialized_files(ShellKind::CmdExe) {
            assert!(prefix.join(&rel).is_file(), "missing {rel}");
        }
    }

    #[test]
    fn materialize_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("root");
        let target = prefix.join("etc/profile.d/mamba.sh");

        materialize(&prefix, ShellKind::Zsh, &exe()).unwrap();
        fs::write(&target, "stale").unwrap();
        materialize(&prefix, ShellKind::Zsh, &exe()).unwrap();

        assert_ne!(fs::read_to_string(&target).unwrap(), "stale");
    }

    #[test]
    fn powershell_hook_truncates_the_module_exports() {
        let contents =
            hook_contents(ShellKind::Powershell, Path::new("/opt/conda"), &exe()).unwrap();

        assert!(contents.starts_with("$Env:MAMBA_EXE=\"/opt/conda/bin/mamba\""));
        assert!(!contents.contains("Export-ModuleMember"));
    }

    #[test]
    fn cmd_exe_has_no_printable_hook() {
        assert!(hook_contents(ShellKind::CmdExe, Path::new("/opt/conda"), &exe()).is_none());
    }

    #[test]
    fn posix_hook_embeds_the_exe_path() {
        let contents = hook_contents(ShellKind::Bash, Path::new("/opt/conda"), &exe()).unwrap();
        assert!(contents.contains("MAMBA_EXE=\"/opt/conda/bin/mamba\""));
        assert!(!contents.contains(MAMBA_EXE_TOKEN));
    }
}
