use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExePathError {
    #[error("could not locate the running executable: {0}")]
    Io(#[from] std::io::Error),
}

// Must stay cheap: the result is embedded into generated block text on
// every invocation.
pub fn self_exe_path() -> Result<PathBuf, ExePathError> {
    let raw = raw_self_exe()?;
    Ok(dunce::canonicalize(raw)?)
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn raw_self_exe() -> Result<PathBuf, ExePathError> {
    std::fs::read_link("/proc/self/exe")
        .or_else(|_| std::env::current_exe())
        .map_err(Into::into)
}

#[cfg(target_os = "solaris")]
fn raw_self_exe() -> Result<PathBuf, ExePathError> {
    std::fs::read_link("/proc/self/path/a.out")
        .or_else(|_| std::env::current_exe())
        .map_err(Into::into)
}

// libstd already loops GetModuleFileNameW with a growing buffer on
// Windows and retries _NSGetExecutablePath with the reported size on
// macOS, so current_exe is the whole strategy there.
#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "solaris")))]
fn raw_self_exe() -> Result<PathBuf, ExePathError> {
    std::env::current_exe().map_err(Into::into)
}
