use std::path::PathBuf;

use log::{debug, trace};
use thiserror::Error;

use crate::run::{run_capture, RunError};

pub const PROFILE_VAR: &str = "$PROFILE.CurrentUserAllHosts";

pub const PROFILE_CANDIDATES: [&str; 3] = ["powershell", "pwsh", "pwsh-preview"];

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("could not run cygpath to convert a Windows path: {0}")]
    Cygpath(#[from] RunError),
}

// A failed translation is fatal: embedding a native-convention path
// into a script that expects the other convention would corrupt the
// user's environment.
pub fn native_path_to_unix(path: &str, is_path_env: bool) -> Result<String, TranslateError> {
    let cygpath = which::which("bash")
        .ok()
        .and_then(|bash| bash.parent().map(|dir| dir.join("cygpath")))
        .unwrap_or_else(|| PathBuf::from("cygpath"));

    let mut args = vec![path.to_owned()];
    if is_path_env {
        args.push("--path".to_owned());
    }

    trace!("translating {path} through {}", cygpath.display());
    let out = run_capture(&cygpath.to_string_lossy(), args)?;
    Ok(out.trim_end().to_owned())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowershellProfile {
    pub exe: String,
    pub profile_path: PathBuf,
}

// One unresponsive interpreter just means we try the next candidate;
// all of them failing yields None and the caller carries on.
pub fn discover_profile(candidates: &[&str]) -> Option<PowershellProfile> {
    for exe in candidates {
        match run_capture(exe, ["-NoProfile", "-Command", PROFILE_VAR]) {
            Ok(out) => {
                let profile = out.trim();
                if !profile.is_empty() {
                    debug!("`{exe}` reported its profile at {profile}");
                    return Some(PowershellProfile {
                        exe: (*exe).to_owned(),
                        profile_path: PathBuf::from(profile),
                    });
                }
            }
            Err(err) => debug!("skipping profile candidate `{exe}`: {err}"),
        }
    }

    None
}
