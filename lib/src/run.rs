use std::{ffi::OsString, process::ExitStatus};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}:\n{stderr}")]
    Exit {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to read command output")]
    InvalidOutput(#[from] std::string::FromUtf8Error),
}

pub fn run_capture<I, S>(exe: &str, args: I) -> Result<String, RunError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let output = duct::cmd(exe, args)
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .run()
        .map_err(|source| RunError::Spawn {
            command: exe.to_owned(),
            source,
        })?;

    if !output.status.success() {
        return Err(RunError::Exit {
            command: exe.to_owned(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(String::from_utf8(output.stdout)?)
}
