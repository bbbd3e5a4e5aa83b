use std::{fs, path::Path};

use lazy_static::lazy_static;
use log::debug;
use regex::{NoExpand, Regex};
use thiserror::Error;

use crate::block::{PROFILE_BEGIN, PROFILE_END, RC_BEGIN, RC_END};

#[derive(Error, Debug)]
pub enum EditError {
    #[error("io error while editing config file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Rc,
    Profile,
}

lazy_static! {
    static ref RC_BLOCK_RE: Regex = block_pattern(RC_BEGIN, RC_END, false);
    static ref RC_STRIP_RE: Regex = block_pattern(RC_BEGIN, RC_END, true);
    static ref PROFILE_BLOCK_RE: Regex = block_pattern(PROFILE_BEGIN, PROFILE_END, false);
    static ref PROFILE_STRIP_RE: Regex = block_pattern(PROFILE_BEGIN, PROFILE_END, true);
}

// Tolerates LF and CRLF around the sentinels, matches the interior
// non-greedily so the region always ends at the first end marker.
fn block_pattern(begin: &str, end: &str, strip_leading_newline: bool) -> Regex {
    let lead = if strip_leading_newline { "(?:\r?\n)?" } else { "" };
    let pattern = format!(
        "{lead}{begin}(?:\r?\n)?[\\s\\S]*?{end}(?:\r?\n)?",
        begin = regex::escape(begin),
        end = regex::escape(end),
    );

    Regex::new(&pattern).expect("failed to compile marker block pattern")
}

impl MarkerStyle {
    pub fn begin(self) -> &'static str {
        match self {
            MarkerStyle::Rc => RC_BEGIN,
            MarkerStyle::Profile => PROFILE_BEGIN,
        }
    }

    pub fn end(self) -> &'static str {
        match self {
            MarkerStyle::Rc => RC_END,
            MarkerStyle::Profile => PROFILE_END,
        }
    }

    fn block_re(self) -> &'static Regex {
        match self {
            MarkerStyle::Rc => &RC_BLOCK_RE,
            MarkerStyle::Profile => &PROFILE_BLOCK_RE,
        }
    }

    fn strip_re(self) -> &'static Regex {
        match self {
            MarkerStyle::Rc => &RC_STRIP_RE,
            MarkerStyle::Profile => &PROFILE_STRIP_RE,
        }
    }
}

// No locking and no atomic rename: concurrent writers to the same
// target can race. That is the caller's responsibility.
pub fn apply_block(
    path: &Path,
    style: MarkerStyle,
    new_block: &str,
    reverse: bool,
    dry_run: bool,
) -> Result<bool, EditError> {
    let original = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let result = splice(&original, style, new_block, reverse);

    if result == original {
        debug!("{} is already up to date", path.display());
        return Ok(false);
    }

    if dry_run {
        debug!("dry run, not writing {}", path.display());
        return Ok(true);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, result)?;

    Ok(true)
}

pub fn splice(content: &str, style: MarkerStyle, new_block: &str, reverse: bool) -> String {
    if reverse {
        // Strip the separator newline along with the region so that
        // inject-then-reverse restores the original content
        return style.strip_re().replacen(content, 1, "").into_owned();
    }

    let replaced = style
        .block_re()
        .replacen(content, 1, NoExpand(new_block))
        .into_owned();

    if replaced.contains(style.begin()) {
        replaced
    } else {
        format!("{content}\n{new_block}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK_A: &str = "# >>> mamba initialize >>>\nexport MAMBA_EXE=\"/opt/conda/bin/mamba\";\n# <<< mamba initialize <<<\n";
    const BLOCK_B: &str = "# >>> mamba initialize >>>\nexport MAMBA_EXE=\"/usr/local/bin/mamba\";\n# <<< mamba initialize <<<\n";

    #[test]
    fn injects_into_empty_content() {
        let result = splice("", MarkerStyle::Rc, BLOCK_A, false);
        assert_eq!(result, format!("\n{BLOCK_A}"));
    }

    #[test]
    fn appends_after_existing_content() {
        let result = splice("alias ll='ls -l'\n", MarkerStyle::Rc, BLOCK_A, false);
        assert_eq!(result, format!("alias ll='ls -l'\n\n{BLOCK_A}"));
    }

    #[test]
    fn replaces_an_existing_region_in_place() {
        let content = format!("before\n{BLOCK_A}after\n");
        let result = splice(&content, MarkerStyle::Rc, BLOCK_B, false);

        assert_eq!(result, format!("before\n{BLOCK_B}after\n"));
    }

    #[test]
    fn never_yields_two_marker_pairs() {
        let content = format!("before\n{BLOCK_A}after\n");
        let result = splice(&content, MarkerStyle::Rc, BLOCK_B, false);

        assert_eq!(result.matches(RC_BEGIN).count(), 1);
        assert_eq!(result.matches(RC_END).count(), 1);
    }

    #[test]
    fn splice_is_idempotent() {
        let once = splice("export FOO=bar\n", MarkerStyle::Rc, BLOCK_A, false);
        let twice = splice(&once, MarkerStyle::Rc, BLOCK_A, false);

        assert_eq!(once, twice);
    }

    #[test]
    fn dollar_signs_in_blocks_stay_literal() {
        let block = "# >>> mamba initialize >>>\nexport PATH=\"/opt/conda/bin:$PATH\"\n# <<< mamba initialize <<<\n";
        let result = splice(BLOCK_A, MarkerStyle::Rc, block, false);

        assert!(result.contains(":$PATH"));
    }

    #[test]
    fn reverse_removes_the_region() {
        let content = format!("before\n{BLOCK_A}");
        let result = splice(&content, MarkerStyle::Rc, BLOCK_A, true);

        assert_eq!(result, "before");
    }

    #[test]
    fn reverse_without_a_region_is_a_no_op() {
        let content = "export FOO=bar\n";
        assert_eq!(splice(content, MarkerStyle::Rc, BLOCK_A, true), content);
    }

    #[test]
    fn inject_then_reverse_round_trips() {
        for original in ["", "export FOO=bar", "export FOO=bar\n"] {
            let injected = splice(original, MarkerStyle::Rc, BLOCK_A, false);
            let reversed = splice(&injected, MarkerStyle::Rc, BLOCK_A, true);
            assert_eq!(reversed, original);
        }
    }

    #[test]
    fn crlf_regions_are_detected() {
        let content = "before\r\n# >>> mamba initialize >>>\r\nold\r\n# <<< mamba initialize <<<\r\nafter\r\n";
        let result = splice(content, MarkerStyle::Rc, BLOCK_B, false);

        assert_eq!(result, format!("before\r\n{BLOCK_B}after\r\n"));
    }

    #[test]
    fn profile_style_uses_the_region_vocabulary() {
        let block = "#region mamba initialize\n$Env:MAMBA_EXE = \"/opt/conda/bin/mamba\"\n#endregion\n";
        let content = "Write-Host hi\n#region mamba initialize\nold\n#endregion\nWrite-Host bye\n";
        let result = splice(content, MarkerStyle::Profile, block, false);

        assert_eq!(result, format!("Write-Host hi\n{block}Write-Host bye\n"));
    }

    #[test]
    fn rc_style_does_not_match_profile_markers() {
        let content = "#region mamba initialize\nold\n#endregion\n";
        let result = splice(content, MarkerStyle::Rc, BLOCK_A, false);

        // the rc vocabulary is absent, so the block is appended
        assert!(result.starts_with(content));
        assert!(result.ends_with(BLOCK_A));
    }

    mod apply {
        use super::*;

        #[test]
        fn creates_missing_file_and_parents() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("sub").join(".bashrc");

            let changed = apply_block(&path, MarkerStyle::Rc, BLOCK_A, false, false).unwrap();

            assert!(changed);
            assert_eq!(fs::read_to_string(&path).unwrap(), format!("\n{BLOCK_A}"));
        }

        #[test]
        fn second_apply_reports_unchanged() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(".bashrc");

            assert!(apply_block(&path, MarkerStyle::Rc, BLOCK_A, false, false).unwrap());
            assert!(!apply_block(&path, MarkerStyle::Rc, BLOCK_A, false, false).unwrap());
        }

        #[test]
        fn dry_run_reports_but_never_writes() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(".bashrc");

            let changed = apply_block(&path, MarkerStyle::Rc, BLOCK_A, false, true).unwrap();

            assert!(changed);
            assert!(!path.exists());
        }

        #[test]
        fn reverse_on_missing_file_is_a_clean_no_op() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(".bashrc");

            let changed = apply_block(&path, MarkerStyle::Rc, BLOCK_A, true, false).unwrap();

            assert!(!changed);
            assert!(!path.exists());
        }
    }
}
