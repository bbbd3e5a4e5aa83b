use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

pub const AUTORUN_KEY_PATH: &str = r"Software\Microsoft\Command Processor";
pub const AUTORUN_VALUE: &str = "AutoRun";

const REPLACE_TOKEN: &str = "__MAMBA_REPLACE_ME__";

lazy_static! {
    static ref HOOK_RE: Regex = Regex::new(r#"(?i)"[^"]*?mamba[-_]hook\.bat""#)
        .expect("failed to compile autorun hook pattern");
}

#[derive(Error, Debug)]
pub enum AutorunError {
    #[error("removing the cmd.exe AutoRun entry is not supported yet")]
    ReverseUnsupported,

    #[error("registry operation failed with status {0}")]
    Registry(u32),
}

// Pure merge over the `&`-joined AutoRun command list. A stale hook
// entry is swapped for the new invocation in place; unrelated commands
// are left untouched.
pub fn merge_autorun(prev: &str, hook_invocation: &str) -> String {
    let replaced = HOOK_RE.replacen(prev, 1, REPLACE_TOKEN).into_owned();
    let merged = replaced.replace(REPLACE_TOKEN, hook_invocation);

    if merged.contains(hook_invocation) {
        merged
    } else if merged.is_empty() {
        hook_invocation.to_owned()
    } else {
        format!("{merged} & {hook_invocation}")
    }
}

#[cfg(windows)]
pub fn apply_autorun(
    new_invocation: &str,
    reverse: bool,
    dry_run: bool,
) -> Result<bool, AutorunError> {
    if reverse {
        return Err(AutorunError::ReverseUnsupported);
    }

    let prev = registry::read_autorun()?.unwrap_or_default();
    let merged = merge_autorun(&prev, new_invocation);

    if merged == prev {
        return Ok(false);
    }

    if dry_run {
        return Ok(true);
    }

    registry::write_autorun(&merged)?;
    Ok(true)
}

#[cfg(windows)]
mod registry {
    use windows_sys::Win32::Foundation::ERROR_FILE_NOT_FOUND;
    use windows_sys::Win32::System::Registry::{
        RegCloseKey, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY, HKEY_CURRENT_USER,
        KEY_QUERY_VALUE, KEY_SET_VALUE, REG_SZ,
    };

    use super::{AutorunError, AUTORUN_KEY_PATH, AUTORUN_VALUE};

    const ERROR_SUCCESS: u32 = 0;

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    fn open_key(access: u32) -> Result<HKEY, AutorunError> {
        let subkey = to_wide(AUTORUN_KEY_PATH);

        unsafe {
            let mut hkey: HKEY = 0;
            let status = RegOpenKeyExW(HKEY_CURRENT_USER, subkey.as_ptr(), 0, access, &mut hkey);
            if status != ERROR_SUCCESS {
                return Err(AutorunError::Registry(status));
            }

            Ok(hkey)
        }
    }

    pub(super) fn read_autorun() -> Result<Option<String>, AutorunError> {
        let hkey = open_key(KEY_QUERY_VALUE)?;
        let value = to_wide(AUTORUN_VALUE);

        unsafe {
            let mut len: u32 = 0;
            let status = RegQueryValueExW(
                hkey,
                value.as_ptr(),
                std::ptr::null(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                &mut len,
            );

            if status == ERROR_FILE_NOT_FOUND {
                RegCloseKey(hkey);
                return Ok(None);
            }
            if status != ERROR_SUCCESS {
                RegCloseKey(hkey);
                return Err(AutorunError::Registry(status));
            }

            let mut buf: Vec<u16> = vec![0; (len as usize + 1) / 2];
            let status = RegQueryValueExW(
                hkey,
                value.as_ptr(),
                std::ptr::null(),
                std::ptr::null_mut(),
                buf.as_mut_ptr() as *mut u8,
                &mut len,
            );
            RegCloseKey(hkey);

            if status != ERROR_SUCCESS {
                return Err(AutorunError::Registry(status));
            }

            let mut text = String::from_utf16_lossy(&buf);
            while text.ends_with('\0') {
                text.pop();
            }

            Ok(Some(text))
        }
    }

    pub(super) fn write_autorun(value: &str) -> Result<(), AutorunError> {
        let hkey = open_key(KEY_SET_VALUE)?;
        let name = to_wide(AUTORUN_VALUE);
        let data = to_wide(value);

        unsafe {
            let status = RegSetValueExW(
                hkey,
                name.as_ptr(),
                0,
                REG_SZ,
                data.as_ptr() as *const u8,
                (data.len() * 2) as u32,
            );
            RegCloseKey(hkey);

            if status != ERROR_SUCCESS {
                return Err(AutorunError::Registry(status));
            }
        }

        Ok(())
    }
}
